//! Coin purchase API endpoints

use api_types::coins::{
    CoinPackageView, PurchaseConfirm, PurchaseIntent, PurchaseNew, PurchaseReceipt,
};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, server::ServerState, user};

pub async fn packages(
    _: Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<CoinPackageView>>, ServerError> {
    let packages = state.ledger.coin_packages().await?;
    Ok(Json(
        packages
            .into_iter()
            .map(|p| CoinPackageView {
                coin_amount: p.coin_amount,
                price_minor: p.price_minor,
            })
            .collect(),
    ))
}

/// Handle requests for starting a coin purchase. The price comes from the
/// server-side package table, never from the client.
pub async fn purchase(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<PurchaseNew>,
) -> Result<Json<PurchaseIntent>, ServerError> {
    let intent = state
        .ledger
        .initiate_purchase(&user.username, payload.coin_amount)
        .await?;
    Ok(Json(PurchaseIntent {
        reference: intent.reference,
        client_secret: intent.client_secret,
        amount_minor: intent.amount_minor,
        coin_amount: intent.coin_amount,
    }))
}

/// Handle requests for confirming a coin purchase. Safe to retry: a
/// replayed confirmation credits nothing and reports the current balance.
pub async fn confirm(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<PurchaseConfirm>,
) -> Result<Json<PurchaseReceipt>, ServerError> {
    let receipt = state
        .ledger
        .confirm_purchase(&user.username, &payload.reference)
        .await?;
    Ok(Json(PurchaseReceipt {
        coins_credited: receipt.coins_credited,
        new_coin_balance: receipt.new_coin_balance,
    }))
}
