pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::config::{AccountMode, LauncherConfig, LauncherPaths};
pub use crate::core::error::{LauncherError, LauncherResult};
pub use crate::core::launch::{ProcessHandle, ProcessState};
pub use crate::core::state::AppState;

/// Install the global log subscriber. `RUST_LOG` overrides the default
/// filter. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,catclient_lib=debug")),
        )
        .try_init();
}
