pub mod agent;
pub mod caller;
pub mod session;

pub use agent::Agent;
pub use caller::CallerContext;
pub use session::{Session, SessionRow, SessionStatus};
