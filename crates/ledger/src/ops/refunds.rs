use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{BalanceKind, LedgerError, ResultLedger, TransactionKind, TransactionStatus};

use super::{Ledger, normalize_optional_text, with_tx};

impl Ledger {
    /// Credits an account's wallet balance exactly once per idempotency
    /// key. Replays return the id of the transaction recorded the first
    /// time. The account row is created if this is its first credit.
    pub async fn refund(
        &self,
        account_id: &str,
        amount_minor: i64,
        note: Option<&str>,
        idempotency_key: &str,
    ) -> ResultLedger<Uuid> {
        let note = normalize_optional_text(note);
        with_tx!(self, |db_tx| {
            self.refund_in_tx(&db_tx, account_id, amount_minor, note, idempotency_key)
                .await
        })
    }

    /// Transactional body of [`refund`], shared with campaign closures so
    /// the refund commits atomically with the status change.
    ///
    /// [`refund`]: Ledger::refund
    pub(super) async fn refund_in_tx(
        &self,
        db: &DatabaseTransaction,
        account_id: &str,
        amount_minor: i64,
        note: Option<String>,
        idempotency_key: &str,
    ) -> ResultLedger<Uuid> {
        if amount_minor <= 0 {
            return Err(LedgerError::InvalidAmount(
                "refund amount must be > 0".to_string(),
            ));
        }

        if let Some(existing) = self
            .find_transaction_by_key(db, account_id, idempotency_key)
            .await?
        {
            return Uuid::parse_str(&existing.id)
                .map_err(|_| LedgerError::KeyNotFound("invalid transaction id".to_string()));
        }

        self.mutate_balance(db, account_id, BalanceKind::Wallet, amount_minor)
            .await?;
        self.record_transaction(
            db,
            account_id,
            TransactionKind::Refund,
            amount_minor,
            TransactionStatus::Completed,
            None,
            Some(idempotency_key.to_string()),
            note,
        )
        .await
    }
}
