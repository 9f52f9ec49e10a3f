use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use tower::ServiceExt;
use uuid::Uuid;

use ledger::{
    Ledger, LedgerError, PaymentIntent, PaymentLookup, PaymentMetadata, PaymentProvider,
    PaymentState,
};
use migration::MigratorTrait;

#[derive(Default)]
struct TestGateway {
    intents: Mutex<HashMap<String, PaymentMetadata>>,
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
        Ok(PaymentLookup {
            status: PaymentState::Succeeded,
            metadata,
        })
    }
}

async fn test_app() -> (Router, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (username, role) in [("alice", "customer"), ("root", "admin")] {
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

    let ledger = Ledger::builder()
        .database(db.clone())
        .payments(Arc::new(TestGateway::default()))
        .build()
        .await
        .unwrap();

    (server::app(ledger, db.clone()), db)
}

fn basic_auth(username: &str, password: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

fn json_request(method: &str, uri: &str, auth: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn requests_without_credentials_are_rejected() {
    let (app, _db) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/balance")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let (app, _db) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/balance")
                .header(header::AUTHORIZATION, basic_auth("alice", "wrong"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn balance_starts_at_zero() {
    let (app, _db) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/balance")
                .header(header::AUTHORIZATION, basic_auth("alice", "password"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["coin_balance"], 0);
    assert_eq!(body["wallet_balance_minor"], 0);
}

#[tokio::test]
async fn purchase_and_confirm_credit_coins() {
    let (app, _db) = test_app().await;
    let auth = basic_auth("alice", "password");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/coins/purchase",
            &auth,
            serde_json::json!({ "coin_amount": 1200 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let intent = json_body(response).await;
    assert_eq!(intent["amount_minor"], 999);
    let reference = intent["reference"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/coins/confirm",
            &auth,
            serde_json::json!({ "reference": reference }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let receipt = json_body(response).await;
    assert_eq!(receipt["coins_credited"], 1200);
    assert_eq!(receipt["new_coin_balance"], 1200);
}

#[tokio::test]
async fn fee_shortfall_is_a_success_response() {
    let (app, _db) = test_app().await;
    let auth = basic_auth("alice", "password");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/campaigns",
            &auth,
            serde_json::json!({ "name": "Spring sale", "cost_minor": 5000 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = json_body(response).await;
    let campaign_id = created["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/campaigns/fee",
            &auth,
            serde_json::json!({ "campaign_id": campaign_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["outcome"], "insufficient_coins");
    assert_eq!(body["shortfall"], 1200);
}

#[tokio::test]
async fn campaign_review_requires_privileges() {
    let (app, _db) = test_app().await;
    let auth = basic_auth("alice", "password");
    let admin = basic_auth("root", "password");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/campaigns",
            &auth,
            serde_json::json!({ "name": "Spring sale", "cost_minor": 5000 }),
        ))
        .await
        .unwrap();
    let created = json_body(response).await;
    let campaign_id = created["id"].as_str().unwrap().to_string();

    // A customer cannot approve their own campaign.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/campaigns/{campaign_id}/approve"))
                .header(header::AUTHORIZATION, &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/campaigns/{campaign_id}/approve"))
                .header(header::AUTHORIZATION, &admin)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "approved");
}

#[tokio::test]
async fn empty_withdrawal_request_is_unprocessable() {
    let (app, _db) = test_app().await;
    let auth = basic_auth("alice", "password");

    let response = app
        .oneshot(json_request(
            "POST",
            "/wallet/withdrawals",
            &auth,
            serde_json::json!({
                "amount_minor": 2500,
                "bank_name": "First Bank",
                "account_title": "Alice",
                "iban": "DE00 0000 0000"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn thread_round_trip() {
    let (app, _db) = test_app().await;
    let auth = basic_auth("alice", "password");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/thread",
            &auth,
            serde_json::json!({ "text": "hello there" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/thread")
                .header(header::AUTHORIZATION, &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["messages"][0]["text"], "hello there");
    assert_eq!(body["messages"][0]["sender"], "user");
}
