//! Stripe-backed [`PaymentProvider`].
//!
//! Uses the PaymentIntents REST API with form-encoded requests. The base
//! URL is overridable so tests can point the gateway at a local mock.

use std::collections::HashMap;

use serde::Deserialize;

use crate::{
    LedgerError,
    payment::{PaymentIntent, PaymentLookup, PaymentMetadata, PaymentProvider, PaymentState},
};

const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(secret_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: String,
    amount: i64,
    status: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

fn metadata_from_response(metadata: &HashMap<String, String>) -> Result<PaymentMetadata, LedgerError> {
    let account_id = metadata
        .get("account_id")
        .cloned()
        .ok_or_else(|| LedgerError::Payment("payment has no account_id metadata".to_string()))?;
    let coin_amount = metadata
        .get("coin_amount")
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| LedgerError::Payment("payment has no coin_amount metadata".to_string()))?;
    Ok(PaymentMetadata {
        account_id,
        coin_amount,
    })
}

#[async_trait::async_trait]
impl PaymentProvider for StripeGateway {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: PaymentMetadata,
    ) -> Result<PaymentIntent, LedgerError> {
        let amount = amount_minor.to_string();
        let coin_amount = metadata.coin_amount.to_string();
        let form: Vec<(&str, &str)> = vec![
            ("amount", amount.as_str()),
            ("currency", currency),
            ("payment_method_types[]", "card"),
            ("metadata[account_id]", metadata.account_id.as_str()),
            ("metadata[coin_amount]", coin_amount.as_str()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(|err| LedgerError::Payment(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("stripe create intent failed: {status} {body}");
            return Err(LedgerError::Payment(format!(
                "payment intent creation failed with status {status}"
            )));
        }

        let intent: IntentResponse = response
            .json()
            .await
            .map_err(|err| LedgerError::Payment(err.to_string()))?;

        Ok(PaymentIntent {
            reference: intent.id,
            client_secret: intent.client_secret,
            amount_minor: intent.amount,
            coin_amount: metadata.coin_amount,
        })
    }

    async fn retrieve_payment(&self, reference: &str) -> Result<PaymentLookup, LedgerError> {
        let response = self
            .http
            .get(format!("{}/v1/payment_intents/{reference}", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|err| LedgerError::Payment(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("stripe retrieve intent {reference} failed: {status}");
            return Err(LedgerError::Payment(format!(
                "payment lookup failed with status {status}"
            )));
        }

        let intent: IntentResponse = response
            .json()
            .await
            .map_err(|err| LedgerError::Payment(err.to_string()))?;

        Ok(PaymentLookup {
            status: PaymentState::from_provider(&intent.status),
            metadata: metadata_from_response(&intent.metadata)?,
        })
    }
}
