//! Core types and traits for ztoq
//!
//! This crate contains domain types shared across all other crates: the status
//! vocabulary, phases and entity types, checkpoint records, configuration, and the
//! source/target collaborator traits.

mod batch;
mod collaborators;
mod config;
pub mod constants;
mod env_config;
mod error;
mod mapping;
mod phase;
mod records;
mod staging;
mod state;
mod status;

pub use batch::*;
pub use collaborators::*;
pub use config::*;
pub use constants::*;
pub use env_config::*;
pub use error::*;
pub use mapping::*;
pub use phase::*;
pub use records::*;
pub use staging::*;
pub use state::*;
pub use status::*;

/// Truncates `message` to [`MAX_ERROR_MESSAGE_LEN`] bytes on a char boundary.
#[must_use]
pub fn truncate_error_message(message: &str) -> String {
    if message.len() <= MAX_ERROR_MESSAGE_LEN {
        return message.to_owned();
    }
    let mut end = MAX_ERROR_MESSAGE_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_owned()
}
