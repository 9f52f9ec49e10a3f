//! Transaction log primitives.
//!
//! Every balance movement is recorded as an immutable `Transaction` row.
//! `external_ref` ties a row to a payment-provider reference (unique, so a
//! confirmation can be replayed safely); `idempotency_key` does the same
//! for internally generated movements such as campaign refunds.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Payment,
    Withdraw,
    Refund,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Withdraw => "withdraw",
            Self::Refund => "refund",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "payment" => Ok(Self::Payment),
            "withdraw" => Ok(Self::Withdraw),
            "refund" => Ok(Self::Refund),
            other => Err(LedgerError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(LedgerError::InvalidAmount(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: String,
    pub kind: TransactionKind,
    pub amount: i64,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub external_ref: Option<String>,
    pub idempotency_key: Option<String>,
    pub note: Option<String>,
}

impl Transaction {
    pub fn new(
        account_id: String,
        kind: TransactionKind,
        amount: i64,
        status: TransactionStatus,
    ) -> ResultLedger<Self> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount("amount must be > 0".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            kind,
            amount,
            status,
            created_at: Utc::now(),
            external_ref: None,
            idempotency_key: None,
            note: None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub kind: String,
    pub amount: i64,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub external_ref: Option<String>,
    pub idempotency_key: Option<String>,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            account_id: ActiveValue::Set(tx.account_id.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount: ActiveValue::Set(tx.amount),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            created_at: ActiveValue::Set(tx.created_at),
            external_ref: ActiveValue::Set(tx.external_ref.clone()),
            idempotency_key: ActiveValue::Set(tx.idempotency_key.clone()),
            note: ActiveValue::Set(tx.note.clone()),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::KeyNotFound("transaction not exists".to_string()))?,
            account_id: model.account_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: model.amount,
            status: TransactionStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
            external_ref: model.external_ref,
            idempotency_key: model.idempotency_key,
            note: model.note,
        })
    }
}
