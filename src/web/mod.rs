//! Web server module
//!
//! Provides the HTTP API: login, guarded flight search, price history and
//! a server-sent event stream of refreshed results.

mod auth;
mod error;
mod handlers;
mod routes;
mod sse;
mod state;

pub use auth::{issue_token, verify_token, Claims};
pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
