// src/lifecycle.rs

//! Lifecycle of a bridge, as seen from the window-owning thread.
//!
//! ```text
//! Uninitialized -> Opening -> Running -> Closing -> Destroyed
//!                     |          |
//!                     +-> Fatal <+
//! ```
//!
//! `Fatal` is terminal: a bridge that failed during open never produced a
//! handle, so there is nothing to destroy.

use crate::error::BridgeError;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Opening,
    Running,
    Closing,
    Fatal,
    Destroyed,
}

impl Lifecycle {
    /// Returns true if `self -> to` is a legal transition.
    pub fn can_advance(self, to: Lifecycle) -> bool {
        use Lifecycle::*;
        matches!(
            (self, to),
            (Uninitialized, Opening)
                | (Opening, Running)
                | (Opening, Fatal)
                | (Running, Closing)
                | (Running, Fatal)
                | (Closing, Destroyed)
        )
    }

    /// Moves to `to`, rejecting transitions the diagram above does not allow.
    pub fn advance(&mut self, to: Lifecycle) -> Result<(), BridgeError> {
        if !self.can_advance(to) {
            return Err(BridgeError::Lifecycle { from: *self, to });
        }
        debug!("Bridge lifecycle: {:?} -> {:?}", self, to);
        *self = to;
        Ok(())
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Lifecycle::Fatal | Lifecycle::Destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_happy_path_reaches_destroyed() {
        let mut state = Lifecycle::Uninitialized;
        for next in [
            Lifecycle::Opening,
            Lifecycle::Running,
            Lifecycle::Closing,
            Lifecycle::Destroyed,
        ] {
            state.advance(next).expect("legal transition");
        }
        assert!(state.is_terminal());
    }

    #[test_log::test]
    fn test_fatal_is_terminal() {
        let mut state = Lifecycle::Opening;
        state.advance(Lifecycle::Fatal).unwrap();
        assert!(state.is_terminal());
        assert!(state.advance(Lifecycle::Running).is_err());
        assert!(state.advance(Lifecycle::Destroyed).is_err());
        assert_eq!(state, Lifecycle::Fatal);
    }

    #[test_log::test]
    fn test_cannot_skip_opening() {
        let mut state = Lifecycle::Uninitialized;
        match state.advance(Lifecycle::Running) {
            Err(BridgeError::Lifecycle { from, to }) => {
                assert_eq!(from, Lifecycle::Uninitialized);
                assert_eq!(to, Lifecycle::Running);
            }
            other => panic!("expected lifecycle error, got {:?}", other),
        }
        assert_eq!(state, Lifecycle::Uninitialized);
    }

    #[test_log::test]
    fn test_running_never_returns_from_closing() {
        let mut state = Lifecycle::Running;
        state.advance(Lifecycle::Closing).unwrap();
        assert!(!state.can_advance(Lifecycle::Running));
    }
}
