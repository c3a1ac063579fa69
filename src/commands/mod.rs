// ABOUTME: Command module aggregator for the hoist CLI.
// ABOUTME: Re-exports deploy and manifests command handlers.

mod deploy;
mod manifests;

pub use deploy::deploy;
pub use manifests::manifests;
