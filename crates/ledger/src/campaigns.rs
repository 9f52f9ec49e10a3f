//! Campaign lifecycle.
//!
//! A campaign moves through `pending -> approved -> active` and terminates
//! in `rejected` or `cancelled`. Paying the fee debits the owner's coin
//! balance; closing a fee-paid campaign refunds its wallet cost exactly
//! once, keyed by `campaign:{id}:refund`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

/// Coins debited for a campaign fee when the caller does not pick a price.
pub const DEFAULT_CAMPAIGN_FEE_COINS: i64 = 1200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    Approved,
    Active,
    Rejected,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal states accept no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }
}

impl TryFrom<&str> for CampaignStatus {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "active" => Ok(Self::Active),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(LedgerError::InvalidTransition(format!(
                "invalid campaign status: {other}"
            ))),
        }
    }
}

/// Outcome of a fee payment attempt.
///
/// A short coin balance is a recoverable state for the caller, not an
/// error, so it gets its own variant instead of bubbling up as
/// [`LedgerError::InsufficientFunds`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum FeePayment {
    Paid { new_coin_balance: i64 },
    InsufficientCoins { shortfall: i64 },
}

/// Result of closing a campaign (reject or cancel).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignClosure {
    pub status: CampaignStatus,
    /// Wallet credit issued by this closure, if the fee had been paid.
    pub refund_minor: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub account_id: String,
    pub name: String,
    pub fee_coins: i64,
    pub cost_minor: i64,
    pub status: CampaignStatus,
    pub rejection_reason: Option<String>,
    pub fee_paid: bool,
    pub refund_txn_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(
        account_id: String,
        name: String,
        fee_coins: i64,
        cost_minor: i64,
    ) -> ResultLedger<Self> {
        if fee_coins <= 0 {
            return Err(LedgerError::InvalidAmount(
                "fee_coins must be > 0".to_string(),
            ));
        }
        if cost_minor <= 0 {
            return Err(LedgerError::InvalidAmount(
                "cost_minor must be > 0".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            name,
            fee_coins,
            cost_minor,
            status: CampaignStatus::Pending,
            rejection_reason: None,
            fee_paid: false,
            refund_txn_id: None,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub fee_coins: i64,
    pub cost_minor: i64,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub fee_paid: bool,
    pub refund_txn_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Campaign> for ActiveModel {
    fn from(campaign: &Campaign) -> Self {
        Self {
            id: ActiveValue::Set(campaign.id.to_string()),
            account_id: ActiveValue::Set(campaign.account_id.clone()),
            name: ActiveValue::Set(campaign.name.clone()),
            fee_coins: ActiveValue::Set(campaign.fee_coins),
            cost_minor: ActiveValue::Set(campaign.cost_minor),
            status: ActiveValue::Set(campaign.status.as_str().to_string()),
            rejection_reason: ActiveValue::Set(campaign.rejection_reason.clone()),
            fee_paid: ActiveValue::Set(campaign.fee_paid),
            refund_txn_id: ActiveValue::Set(campaign.refund_txn_id.map(|id| id.to_string())),
            created_at: ActiveValue::Set(campaign.created_at),
            updated_at: ActiveValue::Set(campaign.updated_at),
        }
    }
}

impl TryFrom<Model> for Campaign {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::KeyNotFound("campaign not exists".to_string()))?,
            account_id: model.account_id,
            name: model.name,
            fee_coins: model.fee_coins,
            cost_minor: model.cost_minor,
            status: CampaignStatus::try_from(model.status.as_str())?,
            rejection_reason: model.rejection_reason,
            fee_paid: model.fee_paid,
            refund_txn_id: model.refund_txn_id.and_then(|s| Uuid::parse_str(&s).ok()),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
