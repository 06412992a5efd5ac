//! User entity and credential store trait.

pub mod model;
pub mod repo;

pub use model::{CreateUser, User, UserProfile};
pub use repo::CredentialRepo;
