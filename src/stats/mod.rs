//! Per-team statistics the engine blends.
//!
//! Every lookup carries whether the team was found. A miss is not an error:
//! the caller gets the neutral default and the trace records the miss.

pub mod elo;
pub mod home_away;
pub mod xg;

/// A looked-up value plus whether it came from data or from a default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lookup<T> {
    pub value: T,
    pub resolved: bool,
}

impl<T> Lookup<T> {
    pub fn found(value: T) -> Self {
        Self {
            value,
            resolved: true,
        }
    }

    pub fn defaulted(value: T) -> Self {
        Self {
            value,
            resolved: false,
        }
    }
}
