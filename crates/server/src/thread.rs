//! Message thread API endpoints

use api_types::thread::{
    MessageCreated, MessageKind, MessageNew, MessageView, RequestStatus, Sender, ThreadResponse,
};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, server::ServerState, user};

fn message_view(msg: ledger::ThreadMessage) -> MessageView {
    let (bank_name, account_title, iban) = match msg.bank_details {
        Some(details) => (
            Some(details.bank_name),
            Some(details.account_title),
            Some(details.iban),
        ),
        None => (None, None, None),
    };
    MessageView {
        id: msg.id,
        kind: match msg.kind {
            ledger::MessageKind::Message => MessageKind::Message,
            ledger::MessageKind::Withdraw => MessageKind::Withdraw,
        },
        text: msg.text,
        bank_name,
        account_title,
        iban,
        amount_minor: msg.amount_minor,
        status: msg.status.map(|s| match s {
            ledger::RequestStatus::Pending => RequestStatus::Pending,
            ledger::RequestStatus::Confirmed => RequestStatus::Confirmed,
        }),
        sender: match msg.sender {
            ledger::Sender::User => Sender::User,
            ledger::Sender::Admin => Sender::Admin,
        },
        is_read: msg.is_read,
        created_at: msg.created_at,
    }
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ThreadResponse>, ServerError> {
    let messages = state.ledger.thread(&user.username).await?;
    Ok(Json(ThreadResponse {
        messages: messages.into_iter().map(message_view).collect(),
    }))
}

/// Handle requests for posting a message to the caller's thread. Admins
/// post as `admin`, everyone else as `user`.
pub async fn message_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<MessageNew>,
) -> Result<Json<MessageCreated>, ServerError> {
    let role = ledger::Role::try_from(user.role.as_str())?;
    let sender = if role.is_admin() {
        ledger::Sender::Admin
    } else {
        ledger::Sender::User
    };
    let id = state
        .ledger
        .post_message(&user.username, sender, &payload.text)
        .await?;
    Ok(Json(MessageCreated { id }))
}

pub async fn mark_read(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<axum::http::StatusCode, ServerError> {
    state.ledger.mark_thread_read(&user.username).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
