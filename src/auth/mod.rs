pub mod maintenance;
pub mod session;

pub use maintenance::maintenance_guard;
pub use session::{create_session, purge_expired_sessions};
