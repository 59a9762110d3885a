pub mod download;
pub mod extract;
pub mod platform;
pub mod runtime;
pub mod source;

pub use runtime::{RuntimeHandle, RuntimeMarker, RuntimeProvisioner};
pub use source::{ArchiveKind, RuntimeSource};
