use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a validated entropy reader.
///
/// A reader only ever moves forward: `Uninitialized -> Ready -> Closed`.
/// `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RngState {
    /// Device opened but the startup self-test has not passed yet.
    #[default]
    Uninitialized,
    /// Self-test passed; reads are allowed.
    Ready,
    /// Handle released; every operation except `close` fails.
    Closed,
}

impl RngState {
    /// Whether a transition from `self` to `next` is permitted.
    pub fn can_transition_to(&self, next: RngState) -> bool {
        matches!(
            (self, next),
            (RngState::Uninitialized, RngState::Ready)
                | (RngState::Uninitialized, RngState::Closed)
                | (RngState::Ready, RngState::Closed)
                | (RngState::Closed, RngState::Closed)
        )
    }

    pub fn is_readable(&self) -> bool {
        *self == RngState::Ready
    }
}

impl fmt::Display for RngState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RngState::Uninitialized => write!(f, "uninitialized"),
            RngState::Ready => write!(f, "ready"),
            RngState::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_only_moves_forward() {
        assert!(RngState::Uninitialized.can_transition_to(RngState::Ready));
        assert!(RngState::Ready.can_transition_to(RngState::Closed));
        assert!(RngState::Closed.can_transition_to(RngState::Closed));
        assert!(!RngState::Closed.can_transition_to(RngState::Ready));
        assert!(!RngState::Ready.can_transition_to(RngState::Uninitialized));
    }

    #[test]
    fn only_ready_is_readable() {
        assert!(RngState::Ready.is_readable());
        assert!(!RngState::Uninitialized.is_readable());
        assert!(!RngState::Closed.is_readable());
    }

    #[test]
    fn state_serializes_as_snake_case() {
        let json = serde_json::to_string(&RngState::Uninitialized).unwrap();
        assert_eq!(json, "\"uninitialized\"");
        assert_eq!(RngState::Closed.to_string(), "closed");
    }
}
