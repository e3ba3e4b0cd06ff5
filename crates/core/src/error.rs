use thiserror::Error;

/// Errors raised while parsing persisted or user-supplied core values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid migration status: {0}")]
    InvalidStatus(String),

    #[error("invalid phase: {0}")]
    InvalidPhase(String),

    #[error("invalid entity type: {0}")]
    InvalidEntityType(String),

    #[error("invalid mapping type: {0}")]
    InvalidMappingType(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition { from: &'static str, to: &'static str },
}
