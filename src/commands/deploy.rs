// ABOUTME: Deploy command implementation.
// ABOUTME: Collects source files, runs the pipeline against gcloud, and prints the URL.

use std::path::Path;
use std::sync::Arc;

use hoist::cloud::GcloudCli;
use hoist::config::Config;
use hoist::deploy::Orchestrator;
use hoist::error::Result;
use hoist::package::collect_dir;
use hoist::progress::{ConsoleSink, OutputMode};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Deploy the service described by `config`; `base` is the config's directory.
pub async fn deploy(config: Config, base: &Path, mode: OutputMode) -> Result<()> {
    let files = collect_dir(&config.source_dir(base))?;
    let request = config.request(files)?;

    let console = Arc::new(ConsoleSink::new(mode));
    let orchestrator = Orchestrator::new(Arc::new(GcloudCli::new()), config.settings());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling deployment");
            on_interrupt.cancel();
        }
    });

    let result = orchestrator
        .run_with(request, console.clone(), cancel)
        .await?;
    console.success(&result);
    Ok(())
}
