// ABOUTME: Manifests command implementation.
// ABOUTME: Prints the generated descriptors as a multi-document YAML stream.

use hoist::config::Config;
use hoist::error::{Error, Result};
use hoist::manifest::ManifestGenerator;
use hoist::types::{ImageRef, ProjectId};

pub fn manifests(config: &Config, image: Option<&str>) -> Result<()> {
    let image = match image {
        Some(image) => ImageRef::parse(image).map_err(|e| Error::InvalidConfig(e.to_string()))?,
        None => {
            let project = ProjectId::new(&config.project.resolve()?)
                .map_err(|e| Error::InvalidConfig(e.to_string()))?;
            ImageRef::for_service(
                &config.region.resolve()?,
                &project,
                &config.repository,
                &config.service,
            )
        }
    };

    let manifests =
        ManifestGenerator::new(config.settings().manifest).generate(&config.service, &image);
    print!(
        "{}---\n{}",
        manifests.deployment.to_yaml()?,
        manifests.service.to_yaml()?
    );
    Ok(())
}
