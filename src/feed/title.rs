use super::fetcher::{FetchError, Fetcher};
use super::markup::{self, MarkupError};
use crate::util::clean_title;
use thiserror::Error;

/// Errors that can occur while reading a feed's title.
#[derive(Debug, Error)]
pub enum TitleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("unreadable feed: {0}")]
    Markup(#[from] MarkupError),
}

/// Fetches `feed_url` and returns the text of its first `<title>` element.
///
/// A feed without any title yields an empty string, which is a valid
/// outcome and not an error. The title is cleaned with [`clean_title`].
pub async fn extract_title(fetcher: &Fetcher, feed_url: &str) -> Result<String, TitleError> {
    let page = fetcher.fetch(feed_url).await?;
    let title = markup::first_title(&page.body)?
        .map(|raw| clean_title(&raw).into_owned())
        .unwrap_or_default();

    tracing::debug!(feed_url = %feed_url, title = %title, "Extracted feed title");
    Ok(title)
}
