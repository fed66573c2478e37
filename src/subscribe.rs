//! The subscribe request: resolve the feed, read its title, store it.
//!
//! Steps run strictly one after another and any failure ends the request.
//! A missing or unreadable title is not a failure; the subscription is
//! stored with an empty name instead.

use std::fmt;
use thiserror::Error;

use crate::feed::{extract_title, locate_feed, Fetcher, LocateError};
use crate::storage::{Database, DatabaseError, Subscription};

/// Where a subscribe request currently is. Used as a log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    TitleExtracting,
    DuplicateCheck,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolving => "resolving",
            Stage::TitleExtracting => "title_extracting",
            Stage::DuplicateCheck => "duplicate_check",
        };
        f.write_str(name)
    }
}

/// Terminal states of a request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// A new subscription row was written
    Inserted(Subscription),
    /// The resolved feed is already tracked (by this or another user)
    Conflict { feed_url: String },
}

/// Terminal failure of a subscribe request.
#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("could not resolve feed: {0}")]
    Locate(#[from] LocateError),
    #[error("could not store subscription: {0}")]
    Store(#[source] DatabaseError),
}

impl SubscribeError {
    pub fn stage(&self) -> Stage {
        match self {
            SubscribeError::Locate(_) => Stage::Resolving,
            SubscribeError::Store(_) => Stage::DuplicateCheck,
        }
    }
}

/// Runs the subscribe pipeline for `user_id` and `input_url`.
///
/// Resolution goes through [`locate_feed`]. If the resolved URL is already
/// stored the request ends as [`SubscribeOutcome::Conflict`] without fetching
/// the feed a second time. Otherwise the title is extracted and the row
/// inserted; the insert itself is the authoritative duplicate check, so a
/// concurrent request that wins the race still turns this one into a
/// `Conflict`.
pub async fn subscribe(
    fetcher: &Fetcher,
    db: &Database,
    user_id: i64,
    input_url: &str,
) -> Result<SubscribeOutcome, SubscribeError> {
    tracing::debug!(stage = %Stage::Resolving, user_id, url = %input_url, "Locating feed");
    let feed_url = locate_feed(fetcher, input_url).await?;

    if db
        .find_subscription_by_url(&feed_url)
        .await
        .map_err(SubscribeError::Store)?
        .is_some()
    {
        tracing::debug!(stage = %Stage::DuplicateCheck, feed_url = %feed_url, "Feed already tracked");
        return Ok(SubscribeOutcome::Conflict { feed_url });
    }

    tracing::debug!(stage = %Stage::TitleExtracting, feed_url = %feed_url, "Extracting title");
    let name = match extract_title(fetcher, &feed_url).await {
        Ok(title) => title,
        Err(e) => {
            tracing::warn!(
                stage = %Stage::TitleExtracting,
                feed_url = %feed_url,
                error = %e,
                "Title extraction failed, storing subscription without a name"
            );
            String::new()
        }
    };

    tracing::debug!(stage = %Stage::DuplicateCheck, feed_url = %feed_url, "Inserting subscription");
    match db.insert_subscription(user_id, &feed_url, &name).await {
        Ok(sub) => {
            tracing::info!(user_id, id = sub.id, feed_url = %sub.url, "Subscription created");
            Ok(SubscribeOutcome::Inserted(sub))
        }
        Err(DatabaseError::DuplicateSubscription(_)) => {
            tracing::debug!(feed_url = %feed_url, "Feed tracked by a concurrent request");
            Ok(SubscribeOutcome::Conflict { feed_url })
        }
        Err(e) => Err(SubscribeError::Store(e)),
    }
}
