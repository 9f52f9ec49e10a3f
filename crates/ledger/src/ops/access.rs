use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger, Role, campaigns, users};

use super::Ledger;

impl Ledger {
    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultLedger<users::Model> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound("user not exists".to_string()))
    }

    /// The caller's role, failing on unknown users.
    pub(super) async fn require_role(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultLedger<Role> {
        let model = self.require_user(db, username).await?;
        Role::try_from(model.role.as_str())
    }

    pub(super) async fn require_reviewer(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultLedger<()> {
        let role = self.require_role(db, username).await?;
        if !role.can_review() {
            return Err(LedgerError::NotAuthorized(format!(
                "{username} cannot review campaigns"
            )));
        }
        Ok(())
    }

    pub(super) async fn require_admin(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultLedger<()> {
        let role = self.require_role(db, username).await?;
        if !role.is_admin() {
            return Err(LedgerError::NotAuthorized(format!(
                "{username} cannot confirm withdrawals"
            )));
        }
        Ok(())
    }

    pub(super) async fn require_campaign(
        &self,
        db: &DatabaseTransaction,
        campaign_id: Uuid,
    ) -> ResultLedger<campaigns::Model> {
        campaigns::Entity::find_by_id(campaign_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound("campaign not exists".to_string()))
    }

    /// Same as [`require_campaign`] but also checks the caller owns it.
    ///
    /// [`require_campaign`]: Ledger::require_campaign
    pub(super) async fn require_owned_campaign(
        &self,
        db: &DatabaseTransaction,
        campaign_id: Uuid,
        owner: &str,
    ) -> ResultLedger<campaigns::Model> {
        let model = self.require_campaign(db, campaign_id).await?;
        if model.account_id != owner {
            return Err(LedgerError::NotAuthorized(format!(
                "{owner} does not own this campaign"
            )));
        }
        Ok(model)
    }
}
