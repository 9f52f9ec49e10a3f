//! The module contains the errors the ledger can throw.
//!
//! Most variants map one-to-one onto an HTTP status in the server crate;
//! [`InsufficientFunds`] carries the missing amount so callers can surface
//! a top-up prompt instead of a bare failure.
//!
//!  [`InsufficientFunds`]: LedgerError::InsufficientFunds
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Insufficient funds: {shortfall} missing")]
    InsufficientFunds { shortfall: i64 },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Not authorized: {0}")]
    NotAuthorized(String),
    #[error("Campaign fee already paid")]
    AlreadyPaid,
    #[error("Withdrawal already confirmed")]
    AlreadyConfirmed,
    #[error("A withdrawal request is already pending")]
    WithdrawalAlreadyPending,
    #[error("Payment not completed: {0}")]
    PaymentNotCompleted(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Payment provider error: {0}")]
    Payment(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::InsufficientFunds { shortfall: a },
                Self::InsufficientFunds { shortfall: b },
            ) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::NotAuthorized(a), Self::NotAuthorized(b)) => a == b,
            (Self::AlreadyPaid, Self::AlreadyPaid) => true,
            (Self::AlreadyConfirmed, Self::AlreadyConfirmed) => true,
            (Self::WithdrawalAlreadyPending, Self::WithdrawalAlreadyPending) => true,
            (Self::PaymentNotCompleted(a), Self::PaymentNotCompleted(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Payment(a), Self::Payment(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
