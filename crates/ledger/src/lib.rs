//! Monetary core for the advertising marketplace.
//!
//! The [`Ledger`] owns every balance movement: coin purchases, campaign
//! fees, refunds and wallet withdrawals. All mutations run inside a
//! database transaction and land in an immutable transaction log.

pub use accounts::{Account, BalanceKind};
pub use campaigns::{
    Campaign, CampaignClosure, CampaignStatus, DEFAULT_CAMPAIGN_FEE_COINS, FeePayment,
};
pub use coin_packages::CoinPackage;
pub use error::LedgerError;
pub use ops::{Ledger, LedgerBuilder};
pub use payment::{
    PaymentIntent, PaymentLookup, PaymentMetadata, PaymentProvider, PaymentState, PurchaseReceipt,
};
pub use stripe::StripeGateway;
pub use threads::{BankDetails, MessageKind, RequestStatus, Sender, ThreadMessage};
pub use transactions::{Transaction, TransactionKind, TransactionStatus};
pub use users::Role;

pub mod accounts;
pub mod campaigns;
pub mod coin_packages;
mod error;
mod ops;
mod payment;
mod stripe;
pub mod threads;
pub mod transactions;
pub mod users;

type ResultLedger<T> = Result<T, LedgerError>;
