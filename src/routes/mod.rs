pub mod bids;
pub mod credentials;
pub mod documents;
mod guard;
pub mod health;
pub mod lots;
pub mod tenders;

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Tenders
        .route(
            "/tenders",
            get(tenders::list_tenders).post(tenders::create_tender),
        )
        .route(
            "/tenders/:tender_id",
            get(tenders::get_tender).patch(tenders::patch_tender),
        )
        .route(
            "/tenders/:tender_id/permissions",
            get(tenders::tender_permissions),
        )
        // Stage hand-off
        .route(
            "/tenders/:tender_id/extract_credentials",
            get(credentials::extract_credentials),
        )
        .route(
            "/tenders/:tender_id/credentials",
            patch(credentials::generate_credentials),
        )
        // Lots (nested under tenders)
        .route("/tenders/:tender_id/lots", post(lots::create_lot))
        .route(
            "/tenders/:tender_id/lots/:lot_id",
            get(lots::get_lot).patch(lots::patch_lot),
        )
        // Documents (nested under tenders)
        .route(
            "/tenders/:tender_id/documents",
            post(documents::create_document).get(documents::list_documents),
        )
        // Bids (nested under tenders)
        .route("/tenders/:tender_id/bids", post(bids::create_bid))
        .route(
            "/tenders/:tender_id/bids/:bid_id",
            get(bids::get_bid).patch(bids::patch_bid),
        )
        .route(
            "/tenders/:tender_id/bids/:bid_id/documents",
            post(bids::create_bid_document).get(bids::list_bid_documents),
        )
}
