use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    BalanceKind, BankDetails, LedgerError, MessageKind, RequestStatus, ResultLedger, Sender,
    ThreadMessage, TransactionKind, TransactionStatus, threads,
};

use super::{Ledger, normalize_required_text, with_tx};

impl Ledger {
    /// Posts a plain message to an account's thread.
    pub async fn post_message(
        &self,
        account_id: &str,
        sender: Sender,
        text: &str,
    ) -> ResultLedger<Uuid> {
        let text = normalize_required_text(text, "message text")?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, account_id).await?;
            let message = ThreadMessage::message(account_id.to_string(), sender, text);
            threads::ActiveModel::from(&message).insert(&db_tx).await?;
            Ok(message.id)
        })
    }

    /// The account's thread, oldest first.
    pub async fn thread(&self, account_id: &str) -> ResultLedger<Vec<ThreadMessage>> {
        let models: Vec<threads::Model> = threads::Entity::find()
            .filter(threads::Column::AccountId.eq(account_id.to_string()))
            .order_by_asc(threads::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(ThreadMessage::try_from).collect()
    }

    /// Opens a withdrawal request on the account's thread.
    ///
    /// The wallet balance is checked up front so obviously hopeless
    /// requests are refused, but nothing is reserved; the money only
    /// moves when an admin confirms. One pending request per account.
    pub async fn request_withdrawal(
        &self,
        account_id: &str,
        amount_minor: i64,
        bank_details: BankDetails,
    ) -> ResultLedger<Uuid> {
        let bank_details = BankDetails {
            bank_name: normalize_required_text(&bank_details.bank_name, "bank name")?,
            account_title: normalize_required_text(&bank_details.account_title, "account title")?,
            iban: normalize_required_text(&bank_details.iban, "IBAN")?,
        };
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, account_id).await?;

            let balance = self
                .find_account(&db_tx, account_id)
                .await?
                .map(|model| model.wallet_balance_minor)
                .unwrap_or(0);
            if balance < amount_minor {
                return Err(LedgerError::InsufficientFunds {
                    shortfall: amount_minor - balance,
                });
            }

            let pending = threads::Entity::find()
                .filter(threads::Column::AccountId.eq(account_id.to_string()))
                .filter(threads::Column::Kind.eq(MessageKind::Withdraw.as_str()))
                .filter(threads::Column::Status.eq(RequestStatus::Pending.as_str()))
                .one(&db_tx)
                .await?;
            if pending.is_some() {
                return Err(LedgerError::WithdrawalAlreadyPending);
            }

            let request =
                ThreadMessage::withdrawal_request(account_id.to_string(), amount_minor, bank_details)?;
            threads::ActiveModel::from(&request).insert(&db_tx).await?;
            Ok(request.id)
        })
    }

    /// Confirms a pending withdrawal request. Admin only.
    ///
    /// The wallet balance is re-validated at confirmation time with a
    /// guarded debit, so a request that was affordable when opened still
    /// fails cleanly if the money has since been spent. Returns the new
    /// wallet balance.
    pub async fn confirm_withdrawal(
        &self,
        account_id: &str,
        request_id: Uuid,
        approver: &str,
    ) -> ResultLedger<i64> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, approver).await?;

            let model = threads::Entity::find_by_id(request_id.to_string())
                .filter(threads::Column::AccountId.eq(account_id.to_string()))
                .filter(threads::Column::Kind.eq(MessageKind::Withdraw.as_str()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    LedgerError::KeyNotFound("withdrawal request not exists".to_string())
                })?;

            let status = model
                .status
                .as_deref()
                .map(RequestStatus::try_from)
                .transpose()?
                .ok_or_else(|| {
                    LedgerError::KeyNotFound("withdrawal request not exists".to_string())
                })?;
            if status == RequestStatus::Confirmed {
                return Err(LedgerError::AlreadyConfirmed);
            }

            let amount_minor = model.amount_minor.ok_or_else(|| {
                LedgerError::InvalidAmount("withdrawal request has no amount".to_string())
            })?;

            let new_balance = self
                .mutate_balance(&db_tx, account_id, BalanceKind::Wallet, -amount_minor)
                .await?;
            self.record_transaction(
                &db_tx,
                account_id,
                TransactionKind::Withdraw,
                amount_minor,
                TransactionStatus::Completed,
                None,
                Some(format!("withdrawal:{request_id}:confirm")),
                model.bank_name.clone(),
            )
            .await?;

            let update = threads::ActiveModel {
                id: ActiveValue::Set(model.id),
                status: ActiveValue::Set(Some(RequestStatus::Confirmed.as_str().to_string())),
                is_read: ActiveValue::Set(true),
                ..Default::default()
            };
            update.update(&db_tx).await?;

            Ok(new_balance)
        })
    }

    /// Marks every message in the account's thread as read.
    pub async fn mark_thread_read(&self, account_id: &str) -> ResultLedger<()> {
        use sea_orm::sea_query::Expr;
        threads::Entity::update_many()
            .col_expr(threads::Column::IsRead, Expr::value(true))
            .filter(threads::Column::AccountId.eq(account_id.to_string()))
            .exec(&self.database)
            .await?;
        Ok(())
    }
}
