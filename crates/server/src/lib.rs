use axum::{Json, http::StatusCode, response::IntoResponse};
use ledger::LedgerError;

use serde::Serialize;
pub use server::{app, run, run_with_listener, spawn_with_listener};

mod campaigns;
mod coins;
mod server;
mod thread;
mod user;
mod wallet;

pub mod types {
    pub mod campaign {
        pub use api_types::campaign::{
            CampaignClosed, CampaignCreated, CampaignNew, CampaignReject, CampaignStatus,
            CampaignView, FeePay, FeePayResponse,
        };
    }

    pub mod coins {
        pub use api_types::coins::{
            CoinPackageView, PurchaseConfirm, PurchaseIntent, PurchaseNew, PurchaseReceipt,
        };
    }

    pub mod wallet {
        pub use api_types::wallet::{
            Balance, TransactionListResponse, TransactionQuery, TransactionView,
            WithdrawalConfirmed, WithdrawalCreated, WithdrawalNew,
        };
    }

    pub mod thread {
        pub use api_types::thread::{MessageCreated, MessageNew, MessageView, ThreadResponse};
    }
}

pub enum ServerError {
    Ledger(LedgerError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_ledger_error(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::NotAuthorized(_) => StatusCode::FORBIDDEN,
        LedgerError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::InvalidTransition(_)
        | LedgerError::AlreadyPaid
        | LedgerError::AlreadyConfirmed
        | LedgerError::WithdrawalAlreadyPending => StatusCode::CONFLICT,
        LedgerError::PaymentNotCompleted(_) => StatusCode::PAYMENT_REQUIRED,
        LedgerError::Payment(_) => StatusCode::BAD_GATEWAY,
        LedgerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        LedgerError::InsufficientFunds { .. } | LedgerError::InvalidAmount(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn message_for_ledger_error(err: LedgerError) -> String {
    match err {
        LedgerError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Ledger(err) => (status_for_ledger_error(&err), message_for_ledger_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<LedgerError> for ServerError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_authorized_maps_to_403() {
        let res = ServerError::from(LedgerError::NotAuthorized("nope".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn not_found_maps_to_404() {
        let res = ServerError::from(LedgerError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflicts_map_to_409() {
        let res = ServerError::from(LedgerError::AlreadyPaid).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res = ServerError::from(LedgerError::AlreadyConfirmed).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res = ServerError::from(LedgerError::WithdrawalAlreadyPending).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res =
            ServerError::from(LedgerError::InvalidTransition("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn payment_not_completed_maps_to_402() {
        let res =
            ServerError::from(LedgerError::PaymentNotCompleted("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn provider_failure_maps_to_502() {
        let res = ServerError::from(LedgerError::Payment("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn validation_maps_to_422() {
        let res = ServerError::from(LedgerError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res = ServerError::from(LedgerError::InsufficientFunds { shortfall: 5 }).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
