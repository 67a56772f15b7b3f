//! Object naming and participant roles
//!
//! Naming is a diagnostics-only surface: display strings for log output
//! and fault messages, nothing more.

use std::fmt;

/// Diagnostic naming for streams and participants.
pub trait Named {
    fn name(&self) -> &str;
    fn kind(&self) -> &'static str;
}

/// Participant role tag, compared by value at attach time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Writer,
    Reader,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Writer => write!(f, "writer"),
            Role::Reader => write!(f, "reader"),
        }
    }
}
