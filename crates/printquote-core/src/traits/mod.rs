//! Boundary traits defined in `printquote-core` and implemented elsewhere.

pub mod mailer;

pub use mailer::{LogMailSender, MailSender};
