//! Error types for the bankroll ledger
//!
//! This module defines all error types that can occur while creating, updating
//! and settling bets and while replaying event logs.
//!
//! # Error Categories
//!
//! - **NotFound**: the bet does not exist or belongs to another user
//! - **Forbidden**: quota exceeded, manual result on a bet that is not pending
//! - **Validation**: missing payout for a win, non-positive stake, duplicates
//! - **LedgerWrite**: the atomic ledger write failed and was rolled back
//! - **Input**: CSV and file errors while reading an event log
//!
//! A platform that cannot be resolved is not an error: the reversal engine
//! reports it as a skipped ledger update and the bet operation still succeeds.

use super::bet::BetId;
use super::platform::{PlatformId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Broad class of a [`LedgerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Validation,
    LedgerWrite,
    Input,
}

/// Main error type for the bankroll ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Bet missing, or owned by a different user
    #[error("Bet {bet} not found for user {user}")]
    BetNotFound { user: UserId, bet: BetId },

    /// Monthly bet quota reached
    #[error("User {user} reached the monthly limit of {limit} bets")]
    QuotaExceeded { user: UserId, limit: u32 },

    /// Manual result attempted on a bet that already has an outcome
    #[error("Bet {bet} is {status}; manual results only apply to pending bets")]
    BetNotPending { bet: BetId, status: String },

    /// A win with neither a payout nor odds to derive one from
    #[error("Bet {bet} cannot be settled as won without a payout or odds")]
    MissingPayout { bet: BetId },

    /// Non-positive stake, negative payout, non-positive odds or overflow
    #[error("Invalid {field} amount {amount}")]
    InvalidAmount { field: String, amount: Decimal },

    /// Unknown or disallowed status value
    #[error("Invalid bet status '{status}'")]
    InvalidStatus { status: String },

    /// A bet with this id already exists
    #[error("Bet {bet} already exists")]
    DuplicateBet { bet: BetId },

    /// The user already has a platform with this name
    #[error("Platform '{name}' already exists for user {user}")]
    DuplicatePlatform { user: UserId, name: String },

    /// The atomic ledger write was rejected and rolled back
    #[error("Ledger update failed for platform {platform}: {reason}")]
    LedgerWriteFailed { platform: PlatformId, reason: String },

    /// Balance arithmetic overflowed inside a ledger write
    #[error("Arithmetic overflow in {operation} for platform {platform}")]
    ArithmeticOverflow {
        operation: String,
        platform: PlatformId,
    },

    /// CSV parsing error in an event log
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError { line: Option<u64>, message: String },

    /// I/O error while reading or writing files
    #[error("I/O error: {message}")]
    IoError { message: String },
}

impl LedgerError {
    /// Class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::BetNotFound { .. } => ErrorKind::NotFound,
            LedgerError::QuotaExceeded { .. } | LedgerError::BetNotPending { .. } => {
                ErrorKind::Forbidden
            }
            LedgerError::MissingPayout { .. }
            | LedgerError::InvalidAmount { .. }
            | LedgerError::InvalidStatus { .. }
            | LedgerError::DuplicateBet { .. }
            | LedgerError::DuplicatePlatform { .. } => ErrorKind::Validation,
            LedgerError::LedgerWriteFailed { .. } | LedgerError::ArithmeticOverflow { .. } => {
                ErrorKind::LedgerWrite
            }
            LedgerError::ParseError { .. } | LedgerError::IoError { .. } => ErrorKind::Input,
        }
    }

    /// HTTP-equivalent status for the CRUD layer
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::Validation => 422,
            ErrorKind::Input => 400,
            ErrorKind::LedgerWrite => 500,
        }
    }

    /// 4xx-equivalent: the request itself must change before retrying
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// 5xx-equivalent: nothing was applied and the whole operation may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::LedgerWrite)
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    pub fn bet_not_found(user: UserId, bet: BetId) -> Self {
        LedgerError::BetNotFound { user, bet }
    }

    pub fn quota_exceeded(user: UserId, limit: u32) -> Self {
        LedgerError::QuotaExceeded { user, limit }
    }

    pub fn bet_not_pending(bet: BetId, status: impl ToString) -> Self {
        LedgerError::BetNotPending {
            bet,
            status: status.to_string(),
        }
    }

    pub fn missing_payout(bet: BetId) -> Self {
        LedgerError::MissingPayout { bet }
    }

    pub fn invalid_amount(field: &str, amount: Decimal) -> Self {
        LedgerError::InvalidAmount {
            field: field.to_string(),
            amount,
        }
    }

    pub fn invalid_status(status: &str) -> Self {
        LedgerError::InvalidStatus {
            status: status.to_string(),
        }
    }

    pub fn duplicate_bet(bet: BetId) -> Self {
        LedgerError::DuplicateBet { bet }
    }

    pub fn duplicate_platform(user: UserId, name: &str) -> Self {
        LedgerError::DuplicatePlatform {
            user,
            name: name.to_string(),
        }
    }

    pub fn ledger_write_failed(platform: PlatformId, reason: &str) -> Self {
        LedgerError::LedgerWriteFailed {
            platform,
            reason: reason.to_string(),
        }
    }

    pub fn arithmetic_overflow(operation: &str, platform: PlatformId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            platform,
        }
    }
}
