//! Payment provider seam.
//!
//! The ledger never talks to a card processor directly; it goes through
//! [`PaymentProvider`] so tests can swap in a stub and the production
//! build can use [`StripeGateway`].
//!
//! [`StripeGateway`]: crate::stripe::StripeGateway

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Metadata attached to a payment intent so a later confirmation can be
/// verified server-side without trusting the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub account_id: String,
    pub coin_amount: i64,
}

/// A freshly created payment intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider-side reference, later used to confirm the purchase.
    pub reference: String,
    /// Secret the client needs to complete the payment in the browser.
    pub client_secret: String,
    pub amount_minor: i64,
    pub coin_amount: i64,
}

/// Provider-side payment state, collapsed to what the ledger cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentState {
    Succeeded,
    Processing,
    Canceled,
}

impl PaymentState {
    /// Maps the provider's status string. Anything that is neither a
    /// success nor a terminal cancellation is still in flight.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "succeeded" => Self::Succeeded,
            "canceled" => Self::Canceled,
            _ => Self::Processing,
        }
    }
}

/// The provider's view of an existing payment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentLookup {
    pub status: PaymentState,
    pub metadata: PaymentMetadata,
}

/// Outcome of a confirmed coin purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub coins_credited: i64,
    pub new_coin_balance: i64,
}

#[async_trait::async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a payment intent for `amount_minor` in `currency`, tagged
    /// with `metadata` for server-side verification on confirm.
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: PaymentMetadata,
    ) -> Result<PaymentIntent, LedgerError>;

    /// Looks up a payment by its provider reference.
    async fn retrieve_payment(&self, reference: &str) -> Result<PaymentLookup, LedgerError>;
}
