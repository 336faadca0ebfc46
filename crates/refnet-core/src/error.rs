use crate::CandidateId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RefNetError {
    #[error("candidate {candidate} cannot refer themselves")]
    SelfReferral { candidate: CandidateId },

    #[error("candidate {candidate} already has referrer {referrer}")]
    AlreadyReferred {
        candidate: CandidateId,
        referrer: CandidateId,
    },

    #[error("referral {referrer} -> {candidate} would close a cycle")]
    Cycle {
        referrer: CandidateId,
        candidate: CandidateId,
    },

    #[error("invalid parameter '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("target size {target} unreachable within {horizon} steps at bonus {max_bonus}")]
    Infeasible {
        target: f64,
        horizon: usize,
        max_bonus: u64,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl RefNetError {
    pub fn invalid_parameter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RefNetError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RefNetError>;
