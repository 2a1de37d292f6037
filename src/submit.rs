use crate::leaderboard::{LeaderboardEntry, LeaderboardError, NewEntry};
use crate::ranked_store::RankedStore;
use crate::stats::CumulativeStats;
use crate::store::StatsStore;
use std::fmt;
use std::io;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 30;
pub const DEFAULT_MIN_ATTEMPTS: u32 = 3;

/// Why a submission was refused or failed. Every variant is recoverable;
/// the user fixes the input or simply tries again.
#[derive(Debug)]
pub enum SubmitError {
    UsernameLength(usize),
    UsernameCharset,
    NotEnoughAttempts { attempted: u32, required: u32 },
    NothingPending,
    AlreadySubmitting,
    Remote(LeaderboardError),
    ResetFailed(io::Error),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::UsernameLength(len) => write!(
                f,
                "username must be {MIN_USERNAME_LEN}-{MAX_USERNAME_LEN} characters (got {len})"
            ),
            SubmitError::UsernameCharset => {
                write!(f, "username may only contain letters, digits, '-' and '_'")
            }
            SubmitError::NotEnoughAttempts {
                attempted,
                required,
            } => write!(
                f,
                "answer at least {required} questions before submitting ({attempted} so far)"
            ),
            SubmitError::NothingPending => write!(f, "no submission awaiting confirmation"),
            SubmitError::AlreadySubmitting => write!(f, "a submission is already in flight"),
            SubmitError::Remote(e) => write!(f, "{e}"),
            SubmitError::ResetFailed(e) => write!(
                f,
                "score submitted, but clearing local stats failed: {e}"
            ),
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmitError::Remote(e) => Some(e),
            SubmitError::ResetFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// Trim and validate a username against the board's policy: 3–30 chars
/// drawn from letters, digits, '-' and '_'.
pub fn validate_username(raw: &str) -> Result<String, SubmitError> {
    let name = raw.trim();
    let len = name.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(SubmitError::UsernameLength(len));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(SubmitError::UsernameCharset);
    }
    Ok(name.to_string())
}

/// Where the workflow currently is. `Submitting` exists so a second
/// submit request or a re-entrant confirm while a write is in flight is
/// refused instead of double-submitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    AwaitingConfirmation,
    Submitting,
}

/// Validated snapshot waiting for the user's go-ahead. Holds a copy of
/// the stats so later session activity cannot leak into what was shown
/// at the confirmation prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    pub username: String,
    pub snapshot: CumulativeStats,
    pub accuracy: f64,
}

/// Drives a score submission through validate → confirm → upload →
/// reset. The local slot is zeroed only after the store acknowledges the
/// write; a failed write leaves it untouched.
#[derive(Debug)]
pub struct SubmitWorkflow {
    min_attempts: u32,
    state: SubmitState,
    pending: Option<PendingSubmission>,
}

impl SubmitWorkflow {
    pub fn new(min_attempts: u32) -> Self {
        Self {
            min_attempts,
            state: SubmitState::Idle,
            pending: None,
        }
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn pending(&self) -> Option<&PendingSubmission> {
        self.pending.as_ref()
    }

    /// Validate and stage a submission. Nothing has been written anywhere
    /// yet; the workflow now waits for `confirm` or `cancel`. Validation
    /// failure leaves whatever was staged before untouched.
    pub fn request(
        &mut self,
        username: &str,
        stats: &CumulativeStats,
    ) -> Result<&PendingSubmission, SubmitError> {
        if self.state == SubmitState::Submitting {
            return Err(SubmitError::AlreadySubmitting);
        }
        let username = validate_username(username)?;
        if stats.total_attempted < self.min_attempts {
            return Err(SubmitError::NotEnoughAttempts {
                attempted: stats.total_attempted,
                required: self.min_attempts,
            });
        }
        let accuracy = stats.accuracy_pct().unwrap_or(0.0);
        self.state = SubmitState::AwaitingConfirmation;
        Ok(self.pending.insert(PendingSubmission {
            username,
            snapshot: *stats,
            accuracy,
        }))
    }

    /// Drop the staged submission. Returns `false` when there was nothing
    /// to cancel (a write already in flight cannot be called back).
    pub fn cancel(&mut self) -> bool {
        if self.state != SubmitState::AwaitingConfirmation {
            return false;
        }
        self.pending = None;
        self.state = SubmitState::Idle;
        true
    }

    /// Upload the staged snapshot and, on acknowledged success, zero the
    /// local slot. On a failed write the slot is left as it was and the
    /// workflow returns to idle so the user can retry.
    pub fn confirm(
        &mut self,
        remote: &mut dyn RankedStore,
        local: &dyn StatsStore,
    ) -> Result<LeaderboardEntry, SubmitError> {
        if self.state != SubmitState::AwaitingConfirmation {
            return Err(SubmitError::NothingPending);
        }
        let pending = match self.pending.take() {
            Some(p) => p,
            None => return Err(SubmitError::NothingPending),
        };
        self.state = SubmitState::Submitting;

        let result = remote.submit(&NewEntry {
            username: pending.username.clone(),
            accuracy: pending.accuracy,
            total_correct: pending.snapshot.total_correct,
            total_attempted: pending.snapshot.total_attempted,
            matrix: pending.snapshot.matrix,
        });
        self.state = SubmitState::Idle;

        match result {
            Ok(stored) => {
                local.reset().map_err(SubmitError::ResetFailed)?;
                Ok(stored)
            }
            Err(e) => Err(SubmitError::Remote(e)),
        }
    }
}
