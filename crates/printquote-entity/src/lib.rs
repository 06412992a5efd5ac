//! # printquote-entity
//!
//! Domain entity models for PrintQuote, plus the store traits the
//! database crate implements. Only the auth subsystem's entities live
//! here; printers, materials, and orders belong to the excluded CRUD
//! layer.

pub mod session;
pub mod user;

pub use session::{
    CreateSession, Session, SessionIdentity, SessionMetadata, SessionRepo, SessionView,
};
pub use user::{CreateUser, CredentialRepo, User, UserProfile};
