pub mod protocol;
pub mod session;

pub use protocol::CLIENT_IDENTIFIER;
pub use session::{AuthSession, Identity, SessionState};
