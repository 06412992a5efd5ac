//! # printquote-auth
//!
//! Authentication token lifecycle for the PrintQuote platform.
//!
//! ## Modules
//!
//! - `jwt` — signed access/refresh token creation and verification
//! - `password` — Argon2id password hashing
//! - `session` — refresh-token session issuance, rotation, enumeration,
//!   and revocation
//! - `account` — registration, login, activation, and password flows

pub mod account;
pub mod jwt;
pub mod password;
pub mod session;

pub use account::AccountService;
pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenPair};
pub use password::PasswordHasher;
pub use session::{SessionManager, SessionSweeper};
