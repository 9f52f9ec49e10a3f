use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use ledger::{
    BankDetails, CampaignStatus, FeePayment, Ledger, LedgerError, PaymentIntent, PaymentLookup,
    PaymentMetadata, PaymentProvider, PaymentState, Sender, TransactionKind,
    DEFAULT_CAMPAIGN_FEE_COINS,
};
use migration::MigratorTrait;
use uuid::Uuid;

/// In-memory payment provider: every created intent is stored by
/// reference, and the reported state can be flipped per reference.
#[derive(Default)]
struct TestGateway {
    intents: Mutex<HashMap<String, PaymentMetadata>>,
    states: Mutex<HashMap<String, PaymentState>>,
}

impl TestGateway {
    fn set_state(&self, reference: &str, state: PaymentState) {
        self.states
            .lock()
            .unwrap()
            .insert(reference.to_string(), state);
    }
}

#[async_trait::async_trait]
impl PaymentProvider for TestGateway {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        _currency: &str,
        metadata: PaymentMetadata,
    ) -> Result<PaymentIntent, LedgerError> {
        let reference = format!("pi_{}", Uuid::new_v4().simple());
        let coin_amount = metadata.coin_amount;
        self.intents
            .lock()
            .unwrap()
            .insert(reference.clone(), metadata);
        Ok(PaymentIntent {
            reference: reference.clone(),
            client_secret: format!("{reference}_secret"),
            amount_minor,
            coin_amount,
        })
    }

    async fn retrieve_payment(&self, reference: &str) -> Result<PaymentLookup, LedgerError> {
        let metadata = self
            .intents
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| LedgerError::Payment("unknown payment intent".to_string()))?;
        let status = self
            .states
            .lock()
            .unwrap()
            .get(reference)
            .copied()
            .unwrap_or(PaymentState::Succeeded);
        Ok(PaymentLookup { status, metadata })
    }
}

async fn ledger_with_db() -> (Ledger, Arc<TestGateway>, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (username, role) in [
        ("alice", "customer"),
        ("bob", "customer"),
        ("rita", "reviewer"),
        ("root", "admin"),
    ] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, role) VALUES (?, ?, ?)",
            vec![username.into(), "password".into(), role.into()],
        ))
        .await
        .unwrap();
    }
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO coin_packages (id, coin_amount, price_minor) VALUES (?, ?, ?)",
        vec![
            Uuid::new_v4().to_string().into(),
            1200i64.into(),
            999i64.into(),
        ],
    ))
    .await
    .unwrap();

    let gateway = Arc::new(TestGateway::default());
    let ledger = Ledger::builder()
        .database(db.clone())
        .payments(gateway.clone())
        .build()
        .await
        .unwrap();
    (ledger, gateway, db)
}

async fn buy_coins(ledger: &Ledger, account: &str, coin_amount: i64) -> String {
    let intent = ledger.initiate_purchase(account, coin_amount).await.unwrap();
    ledger
        .confirm_purchase(account, &intent.reference)
        .await
        .unwrap();
    intent.reference
}

#[tokio::test]
async fn purchase_credits_coins_once() {
    let (ledger, _gateway, _db) = ledger_with_db().await;

    let intent = ledger.initiate_purchase("alice", 1200).await.unwrap();
    assert_eq!(intent.amount_minor, 999);
    assert_eq!(intent.coin_amount, 1200);

    let receipt = ledger
        .confirm_purchase("alice", &intent.reference)
        .await
        .unwrap();
    assert_eq!(receipt.coins_credited, 1200);
    assert_eq!(receipt.new_coin_balance, 1200);

    // Replayed confirmation credits nothing.
    let replay = ledger
        .confirm_purchase("alice", &intent.reference)
        .await
        .unwrap();
    assert_eq!(replay.coins_credited, 0);
    assert_eq!(replay.new_coin_balance, 1200);

    let account = ledger.balance("alice").await.unwrap();
    assert_eq!(account.coin_balance, 1200);
}

#[tokio::test]
async fn purchase_requires_known_package() {
    let (ledger, _gateway, _db) = ledger_with_db().await;

    let err = ledger.initiate_purchase("alice", 77).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
}

#[tokio::test]
async fn incomplete_payment_is_refused() {
    let (ledger, gateway, _db) = ledger_with_db().await;

    let intent = ledger.initiate_purchase("alice", 1200).await.unwrap();
    gateway.set_state(&intent.reference, PaymentState::Processing);

    let err = ledger
        .confirm_purchase("alice", &intent.reference)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PaymentNotCompleted(_)));
    assert_eq!(ledger.balance("alice").await.unwrap().coin_balance, 0);

    gateway.set_state(&intent.reference, PaymentState::Canceled);
    let err = ledger
        .confirm_purchase("alice", &intent.reference)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PaymentNotCompleted(_)));
}

#[tokio::test]
async fn confirm_checks_payment_owner() {
    let (ledger, _gateway, _db) = ledger_with_db().await;

    let intent = ledger.initiate_purchase("alice", 1200).await.unwrap();
    let err = ledger
        .confirm_purchase("bob", &intent.reference)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotAuthorized(_)));
}

#[tokio::test]
async fn fee_payment_activates_campaign() {
    let (ledger, _gateway, _db) = ledger_with_db().await;
    buy_coins(&ledger, "alice", 1200).await;

    let campaign_id = ledger
        .create_campaign("alice", "Spring sale", None, 5000)
        .await
        .unwrap();

    let outcome = ledger.pay_fee(campaign_id, "alice").await.unwrap();
    assert_eq!(outcome, FeePayment::Paid { new_coin_balance: 0 });

    let campaign = ledger.campaign(campaign_id).await.unwrap();
    assert_eq!(campaign.status, CampaignStatus::Active);
    assert!(campaign.fee_paid);
    assert_eq!(campaign.fee_coins, DEFAULT_CAMPAIGN_FEE_COINS);

    // Paying again is a conflict, not a double debit.
    let err = ledger.pay_fee(campaign_id, "alice").await.unwrap_err();
    assert_eq!(err, LedgerError::AlreadyPaid);
    assert_eq!(ledger.balance("alice").await.unwrap().coin_balance, 0);
}

#[tokio::test]
async fn short_balance_reports_shortfall_without_debit() {
    let (ledger, _gateway, _db) = ledger_with_db().await;

    let campaign_id = ledger
        .create_campaign("alice", "Spring sale", None, 5000)
        .await
        .unwrap();

    let outcome = ledger.pay_fee(campaign_id, "alice").await.unwrap();
    assert_eq!(
        outcome,
        FeePayment::InsufficientCoins {
            shortfall: DEFAULT_CAMPAIGN_FEE_COINS
        }
    );

    let campaign = ledger.campaign(campaign_id).await.unwrap();
    assert_eq!(campaign.status, CampaignStatus::Pending);
    assert!(!campaign.fee_paid);
}

#[tokio::test]
async fn one_balance_pays_only_one_fee() {
    let (ledger, _gateway, _db) = ledger_with_db().await;
    buy_coins(&ledger, "alice", 1200).await;

    let first = ledger
        .create_campaign("alice", "First", None, 1000)
        .await
        .unwrap();
    let second = ledger
        .create_campaign("alice", "Second", None, 1000)
        .await
        .unwrap();

    let outcome = ledger.pay_fee(first, "alice").await.unwrap();
    assert!(matches!(outcome, FeePayment::Paid { .. }));

    let outcome = ledger.pay_fee(second, "alice").await.unwrap();
    assert_eq!(
        outcome,
        FeePayment::InsufficientCoins {
            shortfall: DEFAULT_CAMPAIGN_FEE_COINS
        }
    );
}

#[tokio::test]
async fn only_the_owner_pays_the_fee() {
    let (ledger, _gateway, _db) = ledger_with_db().await;
    buy_coins(&ledger, "bob", 1200).await;

    let campaign_id = ledger
        .create_campaign("alice", "Spring sale", None, 5000)
        .await
        .unwrap();

    let err = ledger.pay_fee(campaign_id, "bob").await.unwrap_err();
    assert!(matches!(err, LedgerError::NotAuthorized(_)));
}

#[tokio::test]
async fn rejection_refunds_paid_fee_once() {
    let (ledger, _gateway, _db) = ledger_with_db().await;
    buy_coins(&ledger, "alice", 1200).await;

    let campaign_id = ledger
        .create_campaign("alice", "Spring sale", None, 5000)
        .await
        .unwrap();
    ledger.pay_fee(campaign_id, "alice").await.unwrap();

    let closure = ledger
        .reject_campaign(campaign_id, "rita", "policy violation")
        .await
        .unwrap();
    assert_eq!(closure.status, CampaignStatus::Rejected);
    assert_eq!(closure.refund_minor, Some(5000));

    let account = ledger.balance("alice").await.unwrap();
    assert_eq!(account.wallet_balance_minor, 5000);

    let campaign = ledger.campaign(campaign_id).await.unwrap();
    assert_eq!(
        campaign.rejection_reason.as_deref(),
        Some("policy violation")
    );
    assert!(campaign.refund_txn_id.is_some());

    // Closing an already closed campaign must not refund again.
    let err = ledger
        .reject_campaign(campaign_id, "rita", "again")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition(_)));
    assert_eq!(ledger.balance("alice").await.unwrap().wallet_balance_minor, 5000);
}

#[tokio::test]
async fn unpaid_campaign_closes_without_refund() {
    let (ledger, _gateway, _db) = ledger_with_db().await;

    let campaign_id = ledger
        .create_campaign("alice", "Spring sale", None, 5000)
        .await
        .unwrap();

    let closure = ledger.cancel_campaign(campaign_id, "alice").await.unwrap();
    assert_eq!(closure.status, CampaignStatus::Cancelled);
    assert_eq!(closure.refund_minor, None);
    assert_eq!(ledger.balance("alice").await.unwrap().wallet_balance_minor, 0);
}

#[tokio::test]
async fn approval_requires_reviewer_role() {
    let (ledger, _gateway, _db) = ledger_with_db().await;

    let campaign_id = ledger
        .create_campaign("alice", "Spring sale", None, 5000)
        .await
        .unwrap();

    let err = ledger
        .approve_campaign(campaign_id, "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotAuthorized(_)));

    ledger.approve_campaign(campaign_id, "rita").await.unwrap();
    let campaign = ledger.campaign(campaign_id).await.unwrap();
    assert_eq!(campaign.status, CampaignStatus::Approved);

    // Approving twice is an invalid transition.
    let err = ledger
        .approve_campaign(campaign_id, "rita")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition(_)));
}

#[tokio::test]
async fn withdrawal_flow_debits_on_confirm() {
    let (ledger, _gateway, _db) = ledger_with_db().await;
    buy_coins(&ledger, "alice", 1200).await;

    // Fund the wallet through a campaign refund.
    let campaign_id = ledger
        .create_campaign("alice", "Spring sale", None, 5000)
        .await
        .unwrap();
    ledger.pay_fee(campaign_id, "alice").await.unwrap();
    ledger.cancel_campaign(campaign_id, "alice").await.unwrap();

    let request_id = ledger
        .request_withdrawal(
            "alice",
            3000,
            BankDetails {
                bank_name: "First Bank".to_string(),
                account_title: "Alice".to_string(),
                iban: "DE00 0000 0000".to_string(),
            },
        )
        .await
        .unwrap();

    // Nothing is reserved before confirmation.
    assert_eq!(ledger.balance("alice").await.unwrap().wallet_balance_minor, 5000);

    let new_balance = ledger
        .confirm_withdrawal("alice", request_id, "root")
        .await
        .unwrap();
    assert_eq!(new_balance, 2000);

    let err = ledger
        .confirm_withdrawal("alice", request_id, "root")
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::AlreadyConfirmed);
    assert_eq!(ledger.balance("alice").await.unwrap().wallet_balance_minor, 2000);
}

#[tokio::test]
async fn only_one_pending_withdrawal_per_account() {
    let (ledger, _gateway, _db) = ledger_with_db().await;
    buy_coins(&ledger, "alice", 1200).await;
    let campaign_id = ledger
        .create_campaign("alice", "Spring sale", None, 5000)
        .await
        .unwrap();
    ledger.pay_fee(campaign_id, "alice").await.unwrap();
    ledger.cancel_campaign(campaign_id, "alice").await.unwrap();

    let details = BankDetails {
        bank_name: "First Bank".to_string(),
        account_title: "Alice".to_string(),
        iban: "DE00 0000 0000".to_string(),
    };
    ledger
        .request_withdrawal("alice", 1000, details.clone())
        .await
        .unwrap();
    let err = ledger
        .request_withdrawal("alice", 1000, details)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::WithdrawalAlreadyPending);
}

#[tokio::test]
async fn withdrawal_needs_funds_and_admin() {
    let (ledger, _gateway, _db) = ledger_with_db().await;

    let details = BankDetails {
        bank_name: "First Bank".to_string(),
        account_title: "Alice".to_string(),
        iban: "DE00 0000 0000".to_string(),
    };

    // Empty wallet: the request itself is refused with the shortfall.
    let err = ledger
        .request_withdrawal("alice", 2500, details.clone())
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::InsufficientFunds { shortfall: 2500 });

    // Fund the wallet, open a request, then have a non-admin confirm.
    buy_coins(&ledger, "alice", 1200).await;
    let campaign_id = ledger
        .create_campaign("alice", "Spring sale", None, 5000)
        .await
        .unwrap();
    ledger.pay_fee(campaign_id, "alice").await.unwrap();
    ledger.cancel_campaign(campaign_id, "alice").await.unwrap();

    let request_id = ledger
        .request_withdrawal("alice", 2500, details)
        .await
        .unwrap();
    let err = ledger
        .confirm_withdrawal("alice", request_id, "rita")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotAuthorized(_)));
}

#[tokio::test]
async fn thread_keeps_messages_and_requests_in_order() {
    let (ledger, _gateway, _db) = ledger_with_db().await;
    buy_coins(&ledger, "alice", 1200).await;
    let campaign_id = ledger
        .create_campaign("alice", "Spring sale", None, 5000)
        .await
        .unwrap();
    ledger.pay_fee(campaign_id, "alice").await.unwrap();
    ledger.cancel_campaign(campaign_id, "alice").await.unwrap();

    ledger
        .post_message("alice", Sender::User, "when will my payout arrive?")
        .await
        .unwrap();
    ledger
        .request_withdrawal(
            "alice",
            1000,
            BankDetails {
                bank_name: "First Bank".to_string(),
                account_title: "Alice".to_string(),
                iban: "DE00 0000 0000".to_string(),
            },
        )
        .await
        .unwrap();
    ledger
        .post_message("alice", Sender::Admin, "processing it now")
        .await
        .unwrap();

    let thread = ledger.thread("alice").await.unwrap();
    assert_eq!(thread.len(), 3);
    assert_eq!(thread[0].text.as_deref(), Some("when will my payout arrive?"));
    assert!(thread[1].bank_details.is_some());
    assert_eq!(thread[2].sender, Sender::Admin);
}

#[tokio::test]
async fn history_filters_by_kind() {
    let (ledger, _gateway, _db) = ledger_with_db().await;
    buy_coins(&ledger, "alice", 1200).await;
    let campaign_id = ledger
        .create_campaign("alice", "Spring sale", None, 5000)
        .await
        .unwrap();
    ledger.pay_fee(campaign_id, "alice").await.unwrap();
    ledger.cancel_campaign(campaign_id, "alice").await.unwrap();

    let all = ledger.transaction_history("alice", None).await.unwrap();
    assert_eq!(all.len(), 3);

    let refunds = ledger
        .transaction_history("alice", Some(TransactionKind::Refund))
        .await
        .unwrap();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].amount, 5000);

    let payments = ledger
        .transaction_history("alice", Some(TransactionKind::Payment))
        .await
        .unwrap();
    assert_eq!(payments.len(), 2);
}

#[tokio::test]
async fn accounts_are_created_lazily_on_credit() {
    let (ledger, _gateway, _db) = ledger_with_db().await;

    // Reading an untouched account works and reports zero.
    let account = ledger.balance("bob").await.unwrap();
    assert_eq!(account.coin_balance, 0);
    assert_eq!(account.wallet_balance_minor, 0);

    // A direct refund creates the account row.
    ledger
        .refund("bob", 1500, Some("goodwill"), "manual:bob:1")
        .await
        .unwrap();
    assert_eq!(ledger.balance("bob").await.unwrap().wallet_balance_minor, 1500);

    // Same key replayed: no double credit.
    ledger
        .refund("bob", 1500, Some("goodwill"), "manual:bob:1")
        .await
        .unwrap();
    assert_eq!(ledger.balance("bob").await.unwrap().wallet_balance_minor, 1500);
}

#[tokio::test]
async fn concurrent_fee_payments_spend_one_balance_once() {
    let (ledger, _gateway, _db) = ledger_with_db().await;
    buy_coins(&ledger, "alice", 1200).await;

    let first = ledger
        .create_campaign("alice", "First", None, 1000)
        .await
        .unwrap();
    let second = ledger
        .create_campaign("alice", "Second", None, 1000)
        .await
        .unwrap();

    // Both payments race for the same 1200 coins; the guarded debit must
    // let exactly one through.
    let ledger = Arc::new(ledger);
    let pay_first = tokio::spawn({
        let ledger = ledger.clone();
        async move { ledger.pay_fee(first, "alice").await }
    });
    let pay_second = tokio::spawn({
        let ledger = ledger.clone();
        async move { ledger.pay_fee(second, "alice").await }
    });

    let outcomes = [
        pay_first.await.unwrap().unwrap(),
        pay_second.await.unwrap().unwrap(),
    ];
    let paid = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, FeePayment::Paid { .. }))
        .count();
    assert_eq!(paid, 1);
    assert!(outcomes.iter().any(|outcome| matches!(
        outcome,
        FeePayment::InsufficientCoins {
            shortfall: DEFAULT_CAMPAIGN_FEE_COINS
        }
    )));
    assert_eq!(ledger.balance("alice").await.unwrap().coin_balance, 0);
}

#[tokio::test]
async fn confirm_fails_when_wallet_drained_after_request() {
    let (ledger, _gateway, db) = ledger_with_db().await;
    buy_coins(&ledger, "alice", 1200).await;
    let campaign_id = ledger
        .create_campaign("alice", "Spring sale", None, 5000)
        .await
        .unwrap();
    ledger.pay_fee(campaign_id, "alice").await.unwrap();
    ledger.cancel_campaign(campaign_id, "alice").await.unwrap();

    let request_id = ledger
        .request_withdrawal(
            "alice",
            5000,
            BankDetails {
                bank_name: "First Bank".to_string(),
                account_title: "Alice".to_string(),
                iban: "DE00 0000 0000".to_string(),
            },
        )
        .await
        .unwrap();

    // The money leaves the wallet while the request sits pending.
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE accounts SET wallet_balance_minor = ? WHERE id = ?",
        vec![1000i64.into(), "alice".into()],
    ))
    .await
    .unwrap();

    let err = ledger
        .confirm_withdrawal("alice", request_id, "root")
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::InsufficientFunds { shortfall: 4000 });
    assert_eq!(ledger.balance("alice").await.unwrap().wallet_balance_minor, 1000);

    // The request stays pending and confirms once the wallet is funded.
    let thread = ledger.thread("alice").await.unwrap();
    let request = thread.iter().find(|msg| msg.id == request_id).unwrap();
    assert_eq!(request.status, Some(ledger::RequestStatus::Pending));

    ledger
        .refund("alice", 4000, None, "manual:alice:topup")
        .await
        .unwrap();
    let new_balance = ledger
        .confirm_withdrawal("alice", request_id, "root")
        .await
        .unwrap();
    assert_eq!(new_balance, 0);
}

#[tokio::test]
async fn campaign_cost_must_be_positive() {
    let (ledger, _gateway, _db) = ledger_with_db().await;

    let err = ledger
        .create_campaign("alice", "Free", None, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    let err = ledger
        .create_campaign("alice", "Negative", None, -5)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
}
