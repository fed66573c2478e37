use super::fetcher::{FetchError, Fetcher};
use super::markup::{self, Document, MarkupError};
use thiserror::Error;
use url::Url;

/// Errors that can occur while turning an input URL into a feed URL.
#[derive(Debug, Error)]
pub enum LocateError {
    /// Fetching the input URL failed
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The fetched body could not be read as markup
    #[error("unreadable document: {0}")]
    Markup(#[from] MarkupError),
    /// The page advertised a feed link that is not a usable URL
    #[error("feed link {href:?} cannot be resolved against {base}")]
    UnresolvableHint { href: String, base: String },
    /// The page advertised a feed link the fetcher is not allowed to follow
    #[error("feed link {href:?} refused: {reason}")]
    RefusedHint { href: String, reason: String },
    /// The page is not a feed and advertises no feed link
    #[error("feed URL not found")]
    FeedNotFound,
}

/// Resolves `input_url` to the URL of the feed it stands for.
///
/// The input is fetched once. If the body is itself an RSS/Atom document,
/// the URL it was finally served from (after redirects) is returned.
/// Otherwise the body is scanned as HTML and the first `<link>` with
/// `rel="alternate"` or `rel="feed"` and a non-empty `href` wins; see
/// [`resolve_hint`] for how that `href` becomes absolute.
///
/// Nothing is cached: every call fetches and parses again.
///
/// # Errors
///
/// Returns [`LocateError::FeedNotFound`] when the page carries no feed hint,
/// and the other [`LocateError`] variants for transport and parse failures.
pub async fn locate_feed(fetcher: &Fetcher, input_url: &str) -> Result<String, LocateError> {
    let page = fetcher.fetch(input_url).await?;

    let href = match markup::classify(&page.body)? {
        Document::Feed(kind) => {
            tracing::debug!(url = %input_url, final_url = %page.final_url, ?kind, "Input URL is a feed");
            return Ok(page.final_url);
        }
        Document::Html(doc) => markup::find_feed_hints(&doc)
            .next()
            .and_then(|link| link.href())
            .map(str::to_owned),
    };

    let Some(href) = href else {
        tracing::debug!(
            url = %input_url,
            content_type = page.content_type.as_deref().unwrap_or(""),
            "No feed hint in page"
        );
        return Err(LocateError::FeedNotFound);
    };

    let resolved = resolve_hint(&href, input_url)?;

    // The hint becomes the stored feed URL, so it gets the same URL policy
    // as anything the fetcher requests
    if let Err(e) = fetcher.check_url(&resolved) {
        tracing::warn!(url = %input_url, feed_url = %resolved, error = %e, "Refusing feed hint");
        return Err(LocateError::RefusedHint {
            href: resolved,
            reason: e.to_string(),
        });
    }

    tracing::debug!(url = %input_url, href = %href, feed_url = %resolved, "Resolved feed hint");
    Ok(resolved)
}

/// Turns a feed hint `href` into an absolute URL.
///
/// An absolute http(s) `href` is returned exactly as written. A relative one
/// (path-absolute, path-relative or protocol-relative) is resolved against
/// the input URL with standard base-URL rules: `/feed.xml` found on
/// `http://example.com/blog` becomes `http://example.com/feed.xml`, and
/// `feed.xml` found on `http://example.com/blog/` becomes
/// `http://example.com/blog/feed.xml`.
///
/// # Errors
///
/// Returns [`LocateError::UnresolvableHint`] for absolute URLs with a
/// non-http(s) scheme, malformed `href` values, or an input URL that
/// cannot serve as a base.
pub fn resolve_hint(href: &str, input_url: &str) -> Result<String, LocateError> {
    let href = href.trim();
    let base = input_url.trim();

    let unresolvable = || LocateError::UnresolvableHint {
        href: href.to_owned(),
        base: base.to_owned(),
    };

    match Url::parse(href) {
        Ok(absolute) if matches!(absolute.scheme(), "http" | "https") => Ok(href.to_owned()),
        Ok(_) => Err(unresolvable()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base)
            .and_then(|base| base.join(href))
            .map(String::from)
            .map_err(|_| unresolvable()),
        Err(_) => Err(unresolvable()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::fetcher::FetchSettings;
    use proptest::prelude::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Example Blog</title></channel></rss>"#;

    fn local_fetcher() -> Fetcher {
        Fetcher::new(&FetchSettings {
            allow_private_networks: true,
            ..FetchSettings::default()
        })
        .unwrap()
    }

    // --- resolve_hint ---

    #[test]
    fn test_resolve_absolute_verbatim() {
        assert_eq!(
            resolve_hint("https://feeds.example.com/rss", "http://example.com/blog").unwrap(),
            "https://feeds.example.com/rss"
        );
    }

    #[test]
    fn test_resolve_path_absolute() {
        assert_eq!(
            resolve_hint("/feed.xml", "http://example.com/blog").unwrap(),
            "http://example.com/feed.xml"
        );
    }

    #[test]
    fn test_resolve_path_relative_uses_base_directory() {
        assert_eq!(
            resolve_hint("feed.xml", "http://example.com/blog/").unwrap(),
            "http://example.com/blog/feed.xml"
        );
        assert_eq!(
            resolve_hint("feed.xml", "http://example.com/blog").unwrap(),
            "http://example.com/feed.xml"
        );
        assert_eq!(
            resolve_hint("../rss", "http://example.com/blog/posts/").unwrap(),
            "http://example.com/blog/rss"
        );
        assert_eq!(
            resolve_hint("feed.xml", "http://example.com/").unwrap(),
            "http://example.com/feed.xml"
        );
    }

    #[test]
    fn test_resolve_path_absolute_ignores_base_path() {
        assert_eq!(
            resolve_hint("/feed.xml", "http://example.com/blog/").unwrap(),
            "http://example.com/feed.xml"
        );
    }

    #[test]
    fn test_resolve_protocol_relative() {
        assert_eq!(
            resolve_hint("//cdn.example.com/feed", "https://example.com").unwrap(),
            "https://cdn.example.com/feed"
        );
    }

    #[test]
    fn test_resolve_rejects_non_http_scheme() {
        let result = resolve_hint("javascript:alert(1)", "https://example.com");
        assert!(matches!(result, Err(LocateError::UnresolvableHint { .. })));
    }

    #[test]
    fn test_resolve_rejects_bad_base() {
        let result = resolve_hint("/feed.xml", "not a url");
        assert!(matches!(result, Err(LocateError::UnresolvableHint { .. })));
    }

    proptest! {
        #[test]
        fn prop_absolute_href_is_returned_verbatim(
            host in "[a-z]{1,12}\\.(com|org|net)",
            segments in prop::collection::vec("[a-z0-9_-]{1,8}", 0..4),
            base_path in "[a-z]{0,8}",
        ) {
            let href = format!("https://{}/{}", host, segments.join("/"));
            let base = format!("http://example.com/{}", base_path);
            prop_assert_eq!(resolve_hint(&href, &base).unwrap(), href);
        }
    }

    // --- locate_feed ---

    #[tokio::test]
    async fn test_locate_direct_feed_returns_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(RSS)
                    .insert_header("Content-Type", "application/rss+xml"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/rss", server.uri());
        let feed_url = locate_feed(&local_fetcher(), &url).await.unwrap();
        assert_eq!(feed_url, url);
    }

    #[tokio::test]
    async fn test_locate_feed_behind_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", format!("{}/cdn/rss", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cdn/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;

        let feed_url = locate_feed(&local_fetcher(), &format!("{}/latest", server.uri()))
            .await
            .unwrap();
        assert_eq!(feed_url, format!("{}/cdn/rss", server.uri()));
    }

    #[tokio::test]
    async fn test_locate_relative_hint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blog"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(
                        r#"<html><head>
                        <link rel="alternate" type="application/rss+xml" href="/feed.xml">
                        </head><body></body></html>"#,
                    )
                    .insert_header("Content-Type", "text/html"),
            )
            .mount(&server)
            .await;

        let feed_url = locate_feed(&local_fetcher(), &format!("{}/blog", server.uri()))
            .await
            .unwrap();
        assert_eq!(feed_url, format!("{}/feed.xml", server.uri()));
    }

    #[tokio::test]
    async fn test_locate_first_hint_wins() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><head>
                <link rel="stylesheet" href="/style.css">
                <link rel="alternate" href="">
                <link rel="feed" href="https://feeds.example.org/first">
                <link rel="alternate" href="https://feeds.example.org/second">
                </head></html>"#,
            ))
            .mount(&server)
            .await;

        let feed_url = locate_feed(&local_fetcher(), &server.uri()).await.unwrap();
        assert_eq!(feed_url, "https://feeds.example.org/first");
    }

    #[tokio::test]
    async fn test_locate_no_hint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body>Just a page</body></html>")
                    .insert_header("Content-Type", "text/html"),
            )
            .mount(&server)
            .await;

        let result = locate_feed(&local_fetcher(), &format!("{}/page", server.uri())).await;
        assert!(matches!(result, Err(LocateError::FeedNotFound)));
        assert_eq!(result.unwrap_err().to_string(), "feed URL not found");
    }

    #[tokio::test]
    async fn test_locate_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let result = locate_feed(&local_fetcher(), &server.uri()).await;
        assert!(matches!(result, Err(LocateError::Markup(MarkupError::Empty))));
    }

    #[tokio::test]
    async fn test_locate_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = locate_feed(&local_fetcher(), &server.uri()).await;
        assert!(matches!(
            result,
            Err(LocateError::Fetch(FetchError::HttpStatus(500)))
        ));
    }

    #[tokio::test]
    async fn test_locate_refuses_hint_to_private_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blog"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><head>
                <link rel="alternate" href="http://10.0.0.1/admin/feed">
                </head></html>"#,
            ))
            .mount(&server)
            .await;

        // Private hosts blocked; the mock server is reached by a public name
        let settings = FetchSettings::default();
        let client = Fetcher::client_builder(&settings)
            .resolve("blog.example.com", *server.address())
            .build()
            .unwrap();
        let fetcher = Fetcher::with_client(client, &settings);

        let input = format!("http://blog.example.com:{}/blog", server.address().port());
        let result = locate_feed(&fetcher, &input).await;
        assert!(
            matches!(result, Err(LocateError::RefusedHint { ref href, .. }) if href == "http://10.0.0.1/admin/feed"),
            "got {result:?}"
        );
    }
}
