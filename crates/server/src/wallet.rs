//! Balance, history and withdrawal API endpoints

use api_types::wallet::{
    Balance, TransactionKind, TransactionListResponse, TransactionQuery, TransactionStatus,
    TransactionView, WithdrawalConfirmed, WithdrawalCreated, WithdrawalNew,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn kind_domain(kind: TransactionKind) -> ledger::TransactionKind {
    match kind {
        TransactionKind::Payment => ledger::TransactionKind::Payment,
        TransactionKind::Withdraw => ledger::TransactionKind::Withdraw,
        TransactionKind::Refund => ledger::TransactionKind::Refund,
    }
}

fn kind_view(kind: ledger::TransactionKind) -> TransactionKind {
    match kind {
        ledger::TransactionKind::Payment => TransactionKind::Payment,
        ledger::TransactionKind::Withdraw => TransactionKind::Withdraw,
        ledger::TransactionKind::Refund => TransactionKind::Refund,
    }
}

fn status_view(status: ledger::TransactionStatus) -> TransactionStatus {
    match status {
        ledger::TransactionStatus::Pending => TransactionStatus::Pending,
        ledger::TransactionStatus::Completed => TransactionStatus::Completed,
        ledger::TransactionStatus::Failed => TransactionStatus::Failed,
    }
}

pub async fn balance(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Balance>, ServerError> {
    let account = state.ledger.balance(&user.username).await?;
    Ok(Json(Balance {
        coin_balance: account.coin_balance,
        wallet_balance_minor: account.wallet_balance_minor,
    }))
}

/// Handle requests for the caller's transaction log, newest first.
pub async fn transactions(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let history = state
        .ledger
        .transaction_history(&user.username, query.kind.map(kind_domain))
        .await?;
    Ok(Json(TransactionListResponse {
        transactions: history
            .into_iter()
            .map(|tx| TransactionView {
                id: tx.id,
                kind: kind_view(tx.kind),
                amount: tx.amount,
                status: status_view(tx.status),
                created_at: tx.created_at,
                note: tx.note,
            })
            .collect(),
    }))
}

/// Handle requests for opening a withdrawal request.
pub async fn withdrawal_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<WithdrawalNew>,
) -> Result<Json<WithdrawalCreated>, ServerError> {
    let id = state
        .ledger
        .request_withdrawal(
            &user.username,
            payload.amount_minor,
            ledger::BankDetails {
                bank_name: payload.bank_name,
                account_title: payload.account_title,
                iban: payload.iban,
            },
        )
        .await?;
    Ok(Json(WithdrawalCreated { id }))
}

/// Handle requests for confirming a withdrawal. The path carries the
/// account whose thread holds the request; only admins get past the
/// ledger's role check.
pub async fn withdrawal_confirm(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WithdrawalConfirmTarget>,
) -> Result<Json<WithdrawalConfirmed>, ServerError> {
    let new_balance = state
        .ledger
        .confirm_withdrawal(&payload.account_id, id, &user.username)
        .await?;
    Ok(Json(WithdrawalConfirmed {
        new_wallet_balance_minor: new_balance,
    }))
}

#[derive(Debug, serde::Deserialize)]
pub struct WithdrawalConfirmTarget {
    pub account_id: String,
}
