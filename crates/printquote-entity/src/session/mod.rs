//! Session entity and session store trait.

pub mod model;
pub mod repo;

pub use model::{CreateSession, Session, SessionIdentity, SessionMetadata, SessionView};
pub use repo::SessionRepo;
