//! Threaded messaging backend - engine, storage and HTTP adapter

pub mod core;
pub mod dtos;
pub mod engine;
pub mod entities;
pub mod repositories;
pub mod services;

// Re-exports of the main types
pub use crate::core::{AppError, AppState, Config, MessagingError};
pub use services::root;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

/// Builds the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/participants", configure_participant_routes(state.clone()))
        .nest("/threads", configure_thread_routes(state.clone()))
        .nest("/messages", configure_message_routes(state.clone()))
        .nest("/notifications", configure_notification_routes(state.clone()))
        .with_state(state)
}

fn configure_participant_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/me", get(get_current_participant))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

fn configure_thread_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::{authentication_middleware, thread_membership_middleware};
    use services::*;

    // authentication only
    let public_routes = Router::new()
        .route("/", post(create_thread))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    // authentication + thread membership
    let member_routes = Router::new()
        .route("/{thread_id}", get(get_thread).patch(update_thread))
        .route("/{thread_id}/add_participants", post(add_participants))
        .route("/{thread_id}/remove_participant", post(remove_participant))
        .route(
            "/{thread_id}/removable_participants",
            get(removable_participants),
        )
        .route("/{thread_id}/mark_as_read", post(mark_as_read))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            thread_membership_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(member_routes)
}

fn configure_message_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::{authentication_middleware, thread_membership_middleware};
    use services::*;

    let public_routes = Router::new()
        .route("/", get(list_latest_messages))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    let member_routes = Router::new()
        .route(
            "/{thread_id}",
            get(list_thread_messages).post(post_message),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            thread_membership_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(member_routes)
}

fn configure_notification_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/check", post(check_notifications))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}
