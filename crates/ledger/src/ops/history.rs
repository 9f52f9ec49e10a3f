use sea_orm::{QueryFilter, QueryOrder, prelude::*};

use crate::{ResultLedger, Transaction, TransactionKind, transactions};

use super::Ledger;

impl Ledger {
    /// The account's transaction log, newest first, optionally filtered
    /// by kind.
    pub async fn transaction_history(
        &self,
        account_id: &str,
        kind: Option<TransactionKind>,
    ) -> ResultLedger<Vec<Transaction>> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.to_string()))
            .order_by_desc(transactions::Column::CreatedAt);
        if let Some(kind) = kind {
            query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        let models: Vec<transactions::Model> = query.all(&self.database).await?;
        models.into_iter().map(Transaction::try_from).collect()
    }
}
