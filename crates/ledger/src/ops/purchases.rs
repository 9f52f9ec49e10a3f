use sea_orm::{QueryFilter, TransactionTrait, prelude::*};

use crate::{
    BalanceKind, LedgerError, ResultLedger, TransactionKind, TransactionStatus, coin_packages,
    payment::{PaymentIntent, PaymentMetadata, PaymentState, PurchaseReceipt},
};

use super::{Ledger, with_tx};

impl Ledger {
    /// Lists the coin packages available for purchase.
    pub async fn coin_packages(&self) -> ResultLedger<Vec<crate::CoinPackage>> {
        let models: Vec<coin_packages::Model> = coin_packages::Entity::find()
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    /// Starts a coin purchase: resolves the price of `coin_amount` from
    /// the package table and asks the payment provider for an intent
    /// tagged with the buyer and the coin amount. Nothing is credited
    /// until the payment is confirmed.
    pub async fn initiate_purchase(
        &self,
        account_id: &str,
        coin_amount: i64,
    ) -> ResultLedger<PaymentIntent> {
        let package = coin_packages::Entity::find()
            .filter(coin_packages::Column::CoinAmount.eq(coin_amount))
            .one(&self.database)
            .await?
            .ok_or_else(|| {
                LedgerError::InvalidAmount(format!("no coin package for {coin_amount} coins"))
            })?;

        self.payments
            .create_payment_intent(
                package.price_minor,
                "usd",
                PaymentMetadata {
                    account_id: account_id.to_string(),
                    coin_amount,
                },
            )
            .await
    }

    /// Confirms a coin purchase by provider reference.
    ///
    /// The provider is asked for the payment's current state; anything but
    /// a success is refused without touching balances. Crediting is
    /// idempotent on `external_ref`: a replayed confirmation finds the
    /// recorded transaction and returns the current balance with zero
    /// coins credited.
    pub async fn confirm_purchase(
        &self,
        account_id: &str,
        external_ref: &str,
    ) -> ResultLedger<PurchaseReceipt> {
        let lookup = self.payments.retrieve_payment(external_ref).await?;
        match lookup.status {
            PaymentState::Succeeded => {}
            PaymentState::Processing => {
                return Err(LedgerError::PaymentNotCompleted(
                    "payment is still processing".to_string(),
                ));
            }
            PaymentState::Canceled => {
                return Err(LedgerError::PaymentNotCompleted(
                    "payment was canceled".to_string(),
                ));
            }
        }
        if lookup.metadata.account_id != account_id {
            return Err(LedgerError::NotAuthorized(
                "payment belongs to another account".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            if self
                .find_transaction_by_external_ref(&db_tx, external_ref)
                .await?
                .is_some()
            {
                let current = self
                    .find_account(&db_tx, account_id)
                    .await?
                    .map(|model| model.coin_balance)
                    .unwrap_or(0);
                return Ok(PurchaseReceipt {
                    coins_credited: 0,
                    new_coin_balance: current,
                });
            }

            let new_coin_balance = self
                .mutate_balance(
                    &db_tx,
                    account_id,
                    BalanceKind::Coin,
                    lookup.metadata.coin_amount,
                )
                .await?;
            self.record_transaction(
                &db_tx,
                account_id,
                TransactionKind::Payment,
                lookup.metadata.coin_amount,
                TransactionStatus::Completed,
                Some(external_ref.to_string()),
                None,
                Some("coin purchase".to_string()),
            )
            .await?;

            Ok(PurchaseReceipt {
                coins_credited: lookup.metadata.coin_amount,
                new_coin_balance,
            })
        })
    }
}
