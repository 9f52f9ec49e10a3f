//! Campaign API endpoints

use api_types::campaign::{
    CampaignClosed, CampaignCreated, CampaignNew, CampaignReject, CampaignStatus, CampaignView,
    FeePay, FeePayResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn status_view(status: ledger::CampaignStatus) -> CampaignStatus {
    match status {
        ledger::CampaignStatus::Pending => CampaignStatus::Pending,
        ledger::CampaignStatus::Approved => CampaignStatus::Approved,
        ledger::CampaignStatus::Active => CampaignStatus::Active,
        ledger::CampaignStatus::Rejected => CampaignStatus::Rejected,
        ledger::CampaignStatus::Cancelled => CampaignStatus::Cancelled,
    }
}

fn campaign_view(campaign: ledger::Campaign) -> CampaignView {
    CampaignView {
        id: campaign.id,
        account_id: campaign.account_id,
        name: campaign.name,
        fee_coins: campaign.fee_coins,
        cost_minor: campaign.cost_minor,
        status: status_view(campaign.status),
        rejection_reason: campaign.rejection_reason,
        fee_paid: campaign.fee_paid,
        created_at: campaign.created_at,
    }
}

/// Handle requests for creating a new campaign.
pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CampaignNew>,
) -> Result<Json<CampaignCreated>, ServerError> {
    let id = state
        .ledger
        .create_campaign(
            &user.username,
            &payload.name,
            payload.fee_coins,
            payload.cost_minor,
        )
        .await?;
    Ok(Json(CampaignCreated { id }))
}

/// Handle requests for listing the caller's campaigns.
pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<CampaignView>>, ServerError> {
    let campaigns = state.ledger.campaigns_for(&user.username).await?;
    Ok(Json(campaigns.into_iter().map(campaign_view).collect()))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignView>, ServerError> {
    let campaign = state.ledger.campaign(id).await?;
    let role = ledger::Role::try_from(user.role.as_str())?;
    if campaign.account_id != user.username && !role.can_review() {
        return Err(ServerError::Ledger(ledger::LedgerError::KeyNotFound(
            "campaign not exists".to_string(),
        )));
    }
    Ok(Json(campaign_view(campaign)))
}

/// Handle requests for paying a campaign fee.
///
/// Insufficient coins is a 200 with an `insufficient_coins` outcome, so
/// the client can offer a top-up instead of showing an error page.
pub async fn pay_fee(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<FeePay>,
) -> Result<Json<FeePayResponse>, ServerError> {
    let outcome = state
        .ledger
        .pay_fee(payload.campaign_id, &user.username)
        .await?;
    Ok(Json(match outcome {
        ledger::FeePayment::Paid { new_coin_balance } => FeePayResponse::Paid { new_coin_balance },
        ledger::FeePayment::InsufficientCoins { shortfall } => {
            FeePayResponse::InsufficientCoins { shortfall }
        }
    }))
}

pub async fn approve(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignView>, ServerError> {
    state.ledger.approve_campaign(id, &user.username).await?;
    let campaign = state.ledger.campaign(id).await?;
    Ok(Json(campaign_view(campaign)))
}

pub async fn reject(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CampaignReject>,
) -> Result<Json<CampaignClosed>, ServerError> {
    let closure = state
        .ledger
        .reject_campaign(id, &user.username, &payload.reason)
        .await?;
    Ok(Json(CampaignClosed {
        status: status_view(closure.status),
        refund_minor: closure.refund_minor,
    }))
}

pub async fn cancel(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignClosed>, ServerError> {
    let closure = state.ledger.cancel_campaign(id, &user.username).await?;
    Ok(Json(CampaignClosed {
        status: status_view(closure.status),
        refund_minor: closure.refund_minor,
    }))
}
