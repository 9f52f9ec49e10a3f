//! Purchasable coin packages.
//!
//! The price table is the only source of truth for what a coin bundle
//! costs; purchase requests naming an unknown coin amount are refused.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinPackage {
    pub id: Uuid,
    pub coin_amount: i64,
    pub price_minor: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "coin_packages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub coin_amount: i64,
    pub price_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CoinPackage> for ActiveModel {
    fn from(package: &CoinPackage) -> Self {
        Self {
            id: ActiveValue::Set(package.id.to_string()),
            coin_amount: ActiveValue::Set(package.coin_amount),
            price_minor: ActiveValue::Set(package.price_minor),
        }
    }
}

impl From<Model> for CoinPackage {
    fn from(model: Model) -> Self {
        Self {
            id: Uuid::parse_str(&model.id).unwrap_or_else(|_| Uuid::nil()),
            coin_amount: model.coin_amount,
            price_minor: model.price_minor,
        }
    }
}
