//! Read-only JSON dashboard for the rotation.
//!
//! Exposes an axum [`Router`] backed by any
//! [`mlm_core::store::RotationStore`]. Nothing here writes; the selection
//! loop is the only writer of rotation history.
//!
//! | Method | Path       | Notes |
//! |--------|------------|-------|
//! | `GET`  | `/leader`  | Latest selection; 404 before the first one |
//! | `GET`  | `/history` | Newest first |
//! | `GET`  | `/members` | Active participants, highest score first |
//! | `GET`  | `/next`    | Next meeting slot and occurrence; 404 without slots |
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", mlm_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{Router, routing::get};
use mlm_core::store::RotationStore;

pub use error::ApiError;

/// Build the dashboard router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RotationStore + 'static,
{
  Router::new()
    .route("/leader", get(handlers::leader::<S>))
    .route("/history", get(handlers::history::<S>))
    .route("/members", get(handlers::members::<S>))
    .route("/next", get(handlers::next::<S>))
    .with_state(store)
}
