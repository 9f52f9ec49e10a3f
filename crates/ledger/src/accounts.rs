//! Account balances.
//!
//! An account holds two independent balances for one user: a coin balance
//! spent on campaign fees, and a wallet balance in minor currency units
//! credited by refunds and drained by withdrawals. The account id is the
//! username; rows are created lazily on first credit.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which of the two balances an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceKind {
    Coin,
    Wallet,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub coin_balance: i64,
    pub wallet_balance_minor: i64,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// An account that has never been credited. Reads treat a missing row
    /// as this value.
    pub fn empty(id: String) -> Self {
        Self {
            id,
            coin_balance: 0,
            wallet_balance_minor: 0,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub coin_balance: i64,
    pub wallet_balance_minor: i64,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Account {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            coin_balance: model.coin_balance,
            wallet_balance_minor: model.wallet_balance_minor,
            updated_at: model.updated_at,
        }
    }
}
