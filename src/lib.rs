pub mod commands;
pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::commands::{LaunchEvent, LaunchOutcome, LaunchRequest, LaunchService, LaunchStage};
pub use crate::core::error::{LauncherError, LauncherResult};
pub use crate::core::state::LauncherConfig;

/// Initialize structured logging. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mobi_launcher=debug")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
