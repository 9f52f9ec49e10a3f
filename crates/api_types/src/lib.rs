use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod campaign {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignNew {
        pub name: String,
        /// Coins debited when the fee is paid. Server default applies when
        /// absent.
        pub fee_coins: Option<i64>,
        /// Campaign cost in minor currency units, refunded on closure.
        pub cost_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignCreated {
        pub id: Uuid,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CampaignStatus {
        Pending,
        Approved,
        Active,
        Rejected,
        Cancelled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignView {
        pub id: Uuid,
        pub account_id: String,
        pub name: String,
        pub fee_coins: i64,
        pub cost_minor: i64,
        pub status: CampaignStatus,
        pub rejection_reason: Option<String>,
        pub fee_paid: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeePay {
        pub campaign_id: Uuid,
    }

    /// Outcome of a fee payment. A short balance is a normal response,
    /// not an error, so the client can prompt for a top-up.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case", tag = "outcome")]
    pub enum FeePayResponse {
        Paid { new_coin_balance: i64 },
        InsufficientCoins { shortfall: i64 },
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignReject {
        pub reason: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignClosed {
        pub status: CampaignStatus,
        /// Wallet credit issued by this closure, if any.
        pub refund_minor: Option<i64>,
    }
}

pub mod coins {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseNew {
        pub coin_amount: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseIntent {
        /// Payment-provider reference, echoed back on confirm.
        pub reference: String,
        pub client_secret: String,
        pub amount_minor: i64,
        pub coin_amount: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseConfirm {
        pub reference: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseReceipt {
        /// Zero when the confirmation was a replay.
        pub coins_credited: i64,
        pub new_coin_balance: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CoinPackageView {
        pub coin_amount: i64,
        pub price_minor: i64,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Balance {
        pub coin_balance: i64,
        pub wallet_balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalNew {
        pub amount_minor: i64,
        pub bank_name: String,
        pub account_title: String,
        pub iban: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalConfirmed {
        pub new_wallet_balance_minor: i64,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Payment,
        Withdraw,
        Refund,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionStatus {
        Pending,
        Completed,
        Failed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub amount: i64,
        pub status: TransactionStatus,
        pub created_at: DateTime<Utc>,
        pub note: Option<String>,
    }

    #[derive(Debug, Deserialize, Serialize)]
    pub struct TransactionQuery {
        pub kind: Option<TransactionKind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }
}

pub mod thread {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MessageNew {
        pub text: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MessageCreated {
        pub id: Uuid,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MessageKind {
        Message,
        Withdraw,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Sender {
        User,
        Admin,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RequestStatus {
        Pending,
        Confirmed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MessageView {
        pub id: Uuid,
        pub kind: MessageKind,
        pub text: Option<String>,
        pub bank_name: Option<String>,
        pub account_title: Option<String>,
        pub iban: Option<String>,
        pub amount_minor: Option<i64>,
        pub status: Option<RequestStatus>,
        pub sender: Sender,
        pub is_read: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ThreadResponse {
        pub messages: Vec<MessageView>,
    }
}
