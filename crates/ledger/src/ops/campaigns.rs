use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    BalanceKind, Campaign, CampaignClosure, CampaignStatus, FeePayment, LedgerError, ResultLedger,
    TransactionKind, TransactionStatus, campaigns,
};

use super::{Ledger, normalize_optional_text, normalize_required_text, with_tx};

/// How a campaign leaves the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Closure {
    Rejected,
    Cancelled,
}

impl Closure {
    fn status(self) -> CampaignStatus {
        match self {
            Self::Rejected => CampaignStatus::Rejected,
            Self::Cancelled => CampaignStatus::Cancelled,
        }
    }
}

impl Ledger {
    /// Creates a campaign in `pending` for `owner`. The fee defaults to
    /// [`DEFAULT_CAMPAIGN_FEE_COINS`] when not given.
    ///
    /// [`DEFAULT_CAMPAIGN_FEE_COINS`]: crate::DEFAULT_CAMPAIGN_FEE_COINS
    pub async fn create_campaign(
        &self,
        owner: &str,
        name: &str,
        fee_coins: Option<i64>,
        cost_minor: i64,
    ) -> ResultLedger<Uuid> {
        let name = normalize_required_text(name, "campaign name")?;
        let fee_coins = fee_coins.unwrap_or(crate::DEFAULT_CAMPAIGN_FEE_COINS);
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, owner).await?;
            let campaign = Campaign::new(owner.to_string(), name, fee_coins, cost_minor)?;
            campaigns::ActiveModel::from(&campaign).insert(&db_tx).await?;
            Ok(campaign.id)
        })
    }

    pub async fn campaign(&self, campaign_id: Uuid) -> ResultLedger<Campaign> {
        with_tx!(self, |db_tx| {
            let model = self.require_campaign(&db_tx, campaign_id).await?;
            Campaign::try_from(model)
        })
    }

    pub async fn campaigns_for(&self, account_id: &str) -> ResultLedger<Vec<Campaign>> {
        let models: Vec<campaigns::Model> = campaigns::Entity::find()
            .filter(campaigns::Column::AccountId.eq(account_id.to_string()))
            .order_by_desc(campaigns::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Campaign::try_from).collect()
    }

    /// Pays the campaign fee from the owner's coin balance.
    ///
    /// A short balance is reported as [`FeePayment::InsufficientCoins`]
    /// with the missing amount, leaving the campaign untouched so the
    /// owner can top up and retry. Paying twice is an error.
    pub async fn pay_fee(&self, campaign_id: Uuid, caller: &str) -> ResultLedger<FeePayment> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_owned_campaign(&db_tx, campaign_id, caller)
                .await?;
            if model.fee_paid {
                return Err(LedgerError::AlreadyPaid);
            }
            let status = CampaignStatus::try_from(model.status.as_str())?;
            if !matches!(status, CampaignStatus::Pending | CampaignStatus::Approved) {
                return Err(LedgerError::InvalidTransition(format!(
                    "cannot pay fee for a {} campaign",
                    status.as_str()
                )));
            }

            let new_coin_balance = match self
                .mutate_balance(&db_tx, caller, BalanceKind::Coin, -model.fee_coins)
                .await
            {
                Ok(balance) => balance,
                Err(LedgerError::InsufficientFunds { shortfall }) => {
                    return Ok(FeePayment::InsufficientCoins { shortfall });
                }
                Err(err) => return Err(err),
            };

            self.record_transaction(
                &db_tx,
                caller,
                TransactionKind::Payment,
                model.fee_coins,
                TransactionStatus::Completed,
                None,
                Some(format!("campaign:{campaign_id}:fee")),
                Some(format!("fee for campaign {}", model.name)),
            )
            .await?;

            let update = campaigns::ActiveModel {
                id: ActiveValue::Set(model.id),
                fee_paid: ActiveValue::Set(true),
                status: ActiveValue::Set(CampaignStatus::Active.as_str().to_string()),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            update.update(&db_tx).await?;

            Ok(FeePayment::Paid { new_coin_balance })
        })
    }

    /// Marks a pending campaign as approved. Reviewer or admin only.
    pub async fn approve_campaign(&self, campaign_id: Uuid, reviewer: &str) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            self.require_reviewer(&db_tx, reviewer).await?;
            let model = self.require_campaign(&db_tx, campaign_id).await?;
            let status = CampaignStatus::try_from(model.status.as_str())?;
            if status != CampaignStatus::Pending {
                return Err(LedgerError::InvalidTransition(format!(
                    "cannot approve a {} campaign",
                    status.as_str()
                )));
            }
            let update = campaigns::ActiveModel {
                id: ActiveValue::Set(model.id),
                status: ActiveValue::Set(CampaignStatus::Approved.as_str().to_string()),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Rejects a campaign with a reason. Reviewer or admin only. Refunds
    /// the wallet cost if the fee had been paid.
    pub async fn reject_campaign(
        &self,
        campaign_id: Uuid,
        reviewer: &str,
        reason: &str,
    ) -> ResultLedger<CampaignClosure> {
        let reason = normalize_required_text(reason, "rejection reason")?;
        with_tx!(self, |db_tx| {
            self.require_reviewer(&db_tx, reviewer).await?;
            let model = self.require_campaign(&db_tx, campaign_id).await?;
            self.close_campaign(&db_tx, model, Closure::Rejected, Some(reason))
                .await
        })
    }

    /// Cancels a campaign. Owner only. Refunds the wallet cost if the fee
    /// had been paid.
    pub async fn cancel_campaign(
        &self,
        campaign_id: Uuid,
        owner: &str,
    ) -> ResultLedger<CampaignClosure> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_owned_campaign(&db_tx, campaign_id, owner)
                .await?;
            self.close_campaign(&db_tx, model, Closure::Cancelled, None)
                .await
        })
    }

    /// Shared reject/cancel path. The refund is keyed on the campaign id
    /// so a replayed closure can never credit the wallet twice.
    async fn close_campaign(
        &self,
        db: &DatabaseTransaction,
        model: campaigns::Model,
        closure: Closure,
        rejection_reason: Option<String>,
    ) -> ResultLedger<CampaignClosure> {
        let status = CampaignStatus::try_from(model.status.as_str())?;
        if status.is_terminal() {
            return Err(LedgerError::InvalidTransition(format!(
                "campaign is already {}",
                status.as_str()
            )));
        }

        let mut refund_minor = None;
        let mut refund_txn_id = None;
        if model.fee_paid {
            let key = format!("campaign:{}:refund", model.id);
            let txn_id = self
                .refund_in_tx(
                    db,
                    &model.account_id,
                    model.cost_minor,
                    normalize_optional_text(rejection_reason.as_deref()),
                    &key,
                )
                .await?;
            refund_minor = Some(model.cost_minor);
            refund_txn_id = Some(txn_id);
        }

        let new_status = closure.status();
        let update = campaigns::ActiveModel {
            id: ActiveValue::Set(model.id),
            status: ActiveValue::Set(new_status.as_str().to_string()),
            rejection_reason: ActiveValue::Set(rejection_reason),
            refund_txn_id: ActiveValue::Set(refund_txn_id.map(|id| id.to_string())),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        update.update(db).await?;

        Ok(CampaignClosure {
            status: new_status,
            refund_minor,
        })
    }
}
