#![forbid(unsafe_code)]

pub mod dto;
pub mod extract;
pub mod response;
mod routes;
pub mod state;

use axum::Router;
use services::AppServices;

pub use extract::USER_ID_HEADER;
pub use response::AppError;
pub use state::AppState;

/// The full HTTP surface, ready to be layered and served.
pub fn router(services: AppServices) -> Router {
    routes::router().with_state(AppState::new(services))
}
