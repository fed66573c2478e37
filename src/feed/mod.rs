//! Feed discovery: from an arbitrary URL to a canonical feed URL and title.
//!
//! - [`fetcher`] - single-shot HTTP GET with redirect tracking and size cap
//! - [`markup`] - feed/HTML classification, `<link>` hint scan, title scan
//! - [`locator`] - input URL to feed URL
//! - [`title`] - feed URL to human-readable title
//!
//! # Example
//!
//! ```ignore
//! let fetcher = Fetcher::new(&FetchSettings::default())?;
//! let feed_url = locate_feed(&fetcher, "https://example.com/blog").await?;
//! let title = extract_title(&fetcher, &feed_url).await?;
//! ```

pub mod fetcher;
pub mod locator;
pub mod markup;
pub mod title;

pub use fetcher::{FetchError, FetchSettings, FetchedPage, Fetcher};
pub use locator::{locate_feed, resolve_hint, LocateError};
pub use markup::{Document, FeedKind, HtmlDocument, LinkElement, MarkupError};
pub use title::{extract_title, TitleError};
