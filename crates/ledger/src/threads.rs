//! Per-account message thread.
//!
//! One thread per account, shared between the user and the admins. Plain
//! messages and withdrawal requests share the table; a withdrawal request
//! is a `withdraw` row carrying bank details, an amount and a
//! pending/confirmed status.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Message,
    Withdraw,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Withdraw => "withdraw",
        }
    }
}

impl TryFrom<&str> for MessageKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "message" => Ok(Self::Message),
            "withdraw" => Ok(Self::Withdraw),
            other => Err(LedgerError::InvalidTransition(format!(
                "invalid message kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Admin,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for Sender {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(LedgerError::InvalidTransition(format!(
                "invalid sender: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Confirmed,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
        }
    }
}

impl TryFrom<&str> for RequestStatus {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            other => Err(LedgerError::InvalidTransition(format!(
                "invalid request status: {other}"
            ))),
        }
    }
}

/// Destination details supplied with a withdrawal request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_title: String,
    pub iban: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: Uuid,
    pub account_id: String,
    pub kind: MessageKind,
    pub text: Option<String>,
    pub bank_details: Option<BankDetails>,
    pub amount_minor: Option<i64>,
    pub status: Option<RequestStatus>,
    pub sender: Sender,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl ThreadMessage {
    pub fn message(account_id: String, sender: Sender, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            kind: MessageKind::Message,
            text: Some(text),
            bank_details: None,
            amount_minor: None,
            status: None,
            sender,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    pub fn withdrawal_request(
        account_id: String,
        amount_minor: i64,
        bank_details: BankDetails,
    ) -> ResultLedger<Self> {
        if amount_minor <= 0 {
            return Err(LedgerError::InvalidAmount(
                "withdrawal amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            kind: MessageKind::Withdraw,
            text: None,
            bank_details: Some(bank_details),
            amount_minor: Some(amount_minor),
            status: Some(RequestStatus::Pending),
            sender: Sender::User,
            is_read: false,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "thread_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub kind: String,
    pub text: Option<String>,
    pub bank_name: Option<String>,
    pub account_title: Option<String>,
    pub iban: Option<String>,
    pub amount_minor: Option<i64>,
    pub status: Option<String>,
    pub sender: String,
    pub is_read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ThreadMessage> for ActiveModel {
    fn from(msg: &ThreadMessage) -> Self {
        Self {
            id: ActiveValue::Set(msg.id.to_string()),
            account_id: ActiveValue::Set(msg.account_id.clone()),
            kind: ActiveValue::Set(msg.kind.as_str().to_string()),
            text: ActiveValue::Set(msg.text.clone()),
            bank_name: ActiveValue::Set(msg.bank_details.as_ref().map(|b| b.bank_name.clone())),
            account_title: ActiveValue::Set(
                msg.bank_details.as_ref().map(|b| b.account_title.clone()),
            ),
            iban: ActiveValue::Set(msg.bank_details.as_ref().map(|b| b.iban.clone())),
            amount_minor: ActiveValue::Set(msg.amount_minor),
            status: ActiveValue::Set(msg.status.map(|s| s.as_str().to_string())),
            sender: ActiveValue::Set(msg.sender.as_str().to_string()),
            is_read: ActiveValue::Set(msg.is_read),
            created_at: ActiveValue::Set(msg.created_at),
        }
    }
}

impl TryFrom<Model> for ThreadMessage {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let bank_details = match (model.bank_name, model.account_title, model.iban) {
            (Some(bank_name), Some(account_title), Some(iban)) => Some(BankDetails {
                bank_name,
                account_title,
                iban,
            }),
            _ => None,
        };
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::KeyNotFound("message not exists".to_string()))?,
            account_id: model.account_id,
            kind: MessageKind::try_from(model.kind.as_str())?,
            text: model.text,
            bank_details,
            amount_minor: model.amount_minor,
            status: model
                .status
                .as_deref()
                .map(RequestStatus::try_from)
                .transpose()?,
            sender: Sender::try_from(model.sender.as_str())?,
            is_read: model.is_read,
            created_at: model.created_at,
        })
    }
}
