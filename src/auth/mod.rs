use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod gate;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod validation;

/// `/register` and `/login` are open; `/profile` sits behind [`gate::require_user`].
pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/profile", get(handlers::profile))
        .route_layer(middleware::from_fn_with_state(state, gate::require_user));

    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .merge(protected)
}
