mod schema;
mod sessions;
mod subscriptions;
mod types;

pub use schema::Database;
pub use types::{DatabaseError, Subscription};
