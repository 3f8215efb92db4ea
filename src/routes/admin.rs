use axum::{middleware::from_fn_with_state, routing::post, Router};

use crate::handlers::admin;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/payments/:id/review", post(admin::review_payment))
        .route_layer(from_fn_with_state(state, auth_middleware))
}
