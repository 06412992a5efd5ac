//! Refresh-token session lifecycle: issuance, rotation, enumeration,
//! revocation, and expiry sweeping.

pub mod manager;
pub mod memory;
pub mod sweep;

pub use manager::{RefreshedTokens, SessionManager};
pub use memory::MemorySessionRepo;
pub use sweep::SessionSweeper;
