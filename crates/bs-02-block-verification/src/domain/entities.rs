//! # Verification Entities

use super::errors::VerificationError;
use shared_types::{Hash48, PublishStreamResponseCode};
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a verification session.
///
/// `Running` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    Running = 0,
    Completed = 1,
    Failed = 2,
}

impl SessionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::Completed,
            _ => Self::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != Self::Running
    }
}

/// Session state shared between a session handle and its processing task.
#[derive(Debug)]
pub struct SessionStateCell(AtomicU8);

impl SessionStateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(SessionState::Running as u8))
    }

    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: SessionState) {
        self.0.store(state as u8, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.get() == SessionState::Running
    }
}

impl Default for SessionStateCell {
    fn default() -> Self {
        Self::new()
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The signature matches the composed block hash.
    Verified { block_hash: Hash48 },
    /// The session failed; `code` is what the producer was told.
    Failed {
        error: VerificationError,
        code: PublishStreamResponseCode,
    },
}

/// Terminal outcome of the session verifying `block_number`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub block_number: u64,
    pub outcome: VerificationOutcome,
}

impl VerificationResult {
    pub fn verified(block_number: u64, block_hash: Hash48) -> Self {
        Self {
            block_number,
            outcome: VerificationOutcome::Verified { block_hash },
        }
    }

    pub fn failed(block_number: u64, error: VerificationError) -> Self {
        let code = error.response_code();
        Self {
            block_number,
            outcome: VerificationOutcome::Failed { error, code },
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.outcome, VerificationOutcome::Verified { .. })
    }

    pub fn block_hash(&self) -> Option<Hash48> {
        match &self.outcome {
            VerificationOutcome::Verified { block_hash } => Some(*block_hash),
            VerificationOutcome::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_cell_transitions() {
        let cell = SessionStateCell::new();
        assert!(cell.is_running());
        cell.set(SessionState::Failed);
        assert_eq!(cell.get(), SessionState::Failed);
        assert!(cell.get().is_terminal());
    }

    #[test]
    fn test_failed_result_carries_code() {
        let result = VerificationResult::failed(
            9,
            VerificationError::BlockNumberMismatch {
                session_block: 9,
                proof_block: 10,
            },
        );
        assert!(!result.is_verified());
        assert_eq!(result.block_hash(), None);
        assert!(matches!(
            result.outcome,
            VerificationOutcome::Failed {
                code: PublishStreamResponseCode::StreamItemsBadStateProof,
                ..
            }
        ));
    }
}
