//! Account lifecycle: registration, login, activation, password flows.

pub mod service;

pub use service::{AccountService, AuthPayload};
