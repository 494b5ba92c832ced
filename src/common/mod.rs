//! Common utilities and types shared across the application.

pub mod error;
#[cfg(test)]
pub mod testing;
pub mod types;

pub use types::{
    same_handle, CharityRecord, Mention, MentionId, RegistrationStatus, ReplyMessage,
};
