/// Domain module containing core business logic and data types
///
/// This module defines the core entities (Habit with its solo and group
/// variants) and the streak accounting built on top of their completion
/// history.

pub mod habit;
pub mod group;
pub mod streak;
pub mod types;

// Re-export public types for easy access
pub use habit::*;
pub use group::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("{member} is not a member of group {group}")]
    NotAMember { member: String, group: String },

    #[error("Habit is not a group habit")]
    NotAGroup,

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}
