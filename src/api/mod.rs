pub mod auth;
mod error;
pub mod models;
mod server;
pub mod services;
pub mod state;

pub use auth::{AuthError, SessionResolver, SqliteSessions, User, SESSION_TOKEN_HEADER};
pub use error::ApiError;
pub use server::{router, run};
pub use state::AppState;
