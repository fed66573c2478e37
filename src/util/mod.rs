//! Small helpers shared by the feed pipeline.
//!
//! - **URL validation**: rejects non-HTTP schemes and internal hosts before
//!   anything is fetched on a user's behalf
//! - **Text cleanup**: normalizes titles pulled out of untrusted feed XML

mod text;
mod url_validator;

pub use text::clean_title;
pub use url_validator::{validate_url, UrlValidationError};
