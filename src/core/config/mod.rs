pub mod paths;
pub mod store;

pub use paths::{Endpoints, LauncherConfig, LauncherPaths};
pub use store::{AccountMode, ConfigStore, Settings};
