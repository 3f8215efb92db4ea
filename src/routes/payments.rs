use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::config::MAX_RECEIPT_BYTES;
use crate::handlers::{confirmations, payments, receipts};
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn payment_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/quote", get(payments::get_quote))
        .route("/verify-2fa", post(payments::verify_two_fa))
        .route("/methods", get(payments::list_methods))
        .route("/methods/:method", get(payments::get_method_config))
        .route("/select-method", post(payments::select_method))
        .route("/", get(payments::list_payments))
        .route(
            "/:id/confirmation",
            post(confirmations::submit_confirmation)
                // receipt limit plus headroom for the text fields
                .layer(DefaultBodyLimit::max(MAX_RECEIPT_BYTES + 64 * 1024)),
        )
        .route_layer(from_fn_with_state(state, auth_middleware))
}

pub fn receipt_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:file_name", get(receipts::serve_receipt))
        .route_layer(from_fn_with_state(state, auth_middleware))
}
