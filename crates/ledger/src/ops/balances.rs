use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Account, BalanceKind, LedgerError, ResultLedger, accounts, transactions, Transaction,
    TransactionKind, TransactionStatus,
};

use super::{Ledger, with_tx};

impl BalanceKind {
    fn column(self) -> accounts::Column {
        match self {
            Self::Coin => accounts::Column::CoinBalance,
            Self::Wallet => accounts::Column::WalletBalanceMinor,
        }
    }
}

impl Ledger {
    /// Current balances for an account. Accounts that were never credited
    /// read as zero on both balances.
    pub async fn balance(&self, account_id: &str) -> ResultLedger<Account> {
        with_tx!(self, |db_tx| {
            let model = accounts::Entity::find_by_id(account_id.to_string())
                .one(&db_tx)
                .await?;
            Ok(model
                .map(Account::from)
                .unwrap_or_else(|| Account::empty(account_id.to_string())))
        })
    }

    pub(super) async fn find_account(
        &self,
        db: &DatabaseTransaction,
        account_id: &str,
    ) -> ResultLedger<Option<accounts::Model>> {
        accounts::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Inserts the account row if it does not exist yet. Credits create
    /// accounts lazily; debits never do.
    async fn get_or_create_account(
        &self,
        db: &DatabaseTransaction,
        account_id: &str,
    ) -> ResultLedger<accounts::Model> {
        if let Some(model) = self.find_account(db, account_id).await? {
            return Ok(model);
        }
        let model = accounts::ActiveModel {
            id: ActiveValue::Set(account_id.to_string()),
            coin_balance: ActiveValue::Set(0),
            wallet_balance_minor: ActiveValue::Set(0),
            updated_at: ActiveValue::Set(Utc::now()),
        };
        model.insert(db).await.map_err(Into::into)
    }

    /// Applies `delta` to one balance and returns the new value.
    ///
    /// Debits run as a single conditional UPDATE filtered on the balance
    /// being sufficient; zero rows affected means the funds were not there
    /// (or the account does not exist) and yields
    /// [`LedgerError::InsufficientFunds`] with the exact shortfall. Credits
    /// create the account row lazily.
    pub(super) async fn mutate_balance(
        &self,
        db: &DatabaseTransaction,
        account_id: &str,
        kind: BalanceKind,
        delta: i64,
    ) -> ResultLedger<i64> {
        let column = kind.column();

        if delta >= 0 {
            let model = self.get_or_create_account(db, account_id).await?;
            accounts::Entity::update_many()
                .col_expr(column, Expr::col(column).add(delta))
                .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(accounts::Column::Id.eq(account_id.to_string()))
                .exec(db)
                .await?;
            let current = match kind {
                BalanceKind::Coin => model.coin_balance,
                BalanceKind::Wallet => model.wallet_balance_minor,
            };
            return Ok(current + delta);
        }

        let amount = -delta;
        let result = accounts::Entity::update_many()
            .col_expr(column, Expr::col(column).sub(amount))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::Id.eq(account_id.to_string()))
            .filter(column.gte(amount))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            let current = self
                .find_account(db, account_id)
                .await?
                .map(|model| match kind {
                    BalanceKind::Coin => model.coin_balance,
                    BalanceKind::Wallet => model.wallet_balance_minor,
                })
                .unwrap_or(0);
            return Err(LedgerError::InsufficientFunds {
                shortfall: amount - current,
            });
        }

        let model = self
            .find_account(db, account_id)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound("account not exists".to_string()))?;
        Ok(match kind {
            BalanceKind::Coin => model.coin_balance,
            BalanceKind::Wallet => model.wallet_balance_minor,
        })
    }

    /// Appends a row to the transaction log.
    #[allow(clippy::too_many_arguments)]
    pub(super) async fn record_transaction(
        &self,
        db: &DatabaseTransaction,
        account_id: &str,
        kind: TransactionKind,
        amount: i64,
        status: TransactionStatus,
        external_ref: Option<String>,
        idempotency_key: Option<String>,
        note: Option<String>,
    ) -> ResultLedger<Uuid> {
        let mut tx = Transaction::new(account_id.to_string(), kind, amount, status)?;
        tx.external_ref = external_ref;
        tx.idempotency_key = idempotency_key;
        tx.note = note;
        transactions::ActiveModel::from(&tx).insert(db).await?;
        Ok(tx.id)
    }

    /// Finds an existing log row by per-account idempotency key.
    pub(super) async fn find_transaction_by_key(
        &self,
        db: &DatabaseTransaction,
        account_id: &str,
        idempotency_key: &str,
    ) -> ResultLedger<Option<transactions::Model>> {
        transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.to_string()))
            .filter(transactions::Column::IdempotencyKey.eq(idempotency_key.to_string()))
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Finds an existing log row by payment-provider reference.
    pub(super) async fn find_transaction_by_external_ref(
        &self,
        db: &DatabaseTransaction,
        external_ref: &str,
    ) -> ResultLedger<Option<transactions::Model>> {
        transactions::Entity::find()
            .filter(transactions::Column::ExternalRef.eq(external_ref.to_string()))
            .one(db)
            .await
            .map_err(Into::into)
    }
}
