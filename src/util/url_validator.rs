use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Reasons a user-supplied URL is refused before it is fetched.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// The URL points to a private/internal IP address.
    #[error("Private IP address not allowed: {0}")]
    PrivateIp(String),
    /// The URL points to localhost.
    #[error("Localhost not allowed")]
    Localhost,
}

/// Validates a URL the service is about to fetch on a user's behalf.
///
/// Only `http` and `https` are accepted. Unless `allow_private` is set, the
/// host must not be localhost, a loopback address, or a private, link-local
/// or unspecified IP, which keeps the subscribe endpoint from being used to
/// scan the network the service runs in.
///
/// # Examples
///
/// ```
/// use feedsub::util::validate_url;
///
/// let url = validate_url("https://example.com/feed.xml", false).unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(validate_url("http://localhost/feed", false).is_err());
/// assert!(validate_url("http://localhost/feed", true).is_ok());
/// assert!(validate_url("file:///etc/passwd", true).is_err());
/// ```
pub fn validate_url(url_str: &str, allow_private: bool) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    let host = url.host_str().ok_or(UrlValidationError::MissingHost)?;

    if allow_private {
        return Ok(url);
    }

    // `localhost.` and `example.com.` name the same hosts as without the dot
    let host = host.strip_suffix('.').unwrap_or(host);

    if is_localhost_name(host) {
        return Err(UrlValidationError::Localhost);
    }

    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    if let Ok(ip) = host_for_parse.parse::<IpAddr>() {
        if ip.is_loopback() {
            return Err(UrlValidationError::Localhost);
        }
        if is_private_ip(&ip) {
            return Err(UrlValidationError::PrivateIp(ip.to_string()));
        }
    }

    Ok(url)
}

/// `localhost` and anything under it (RFC 6761).
fn is_localhost_name(host: &str) -> bool {
    let lower = host.to_ascii_lowercase();
    lower == "localhost" || lower.ends_with(".localhost")
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            ipv4.is_private() || ipv4.is_loopback() || ipv4.is_link_local() || ipv4.is_unspecified()
        }
        IpAddr::V6(ipv6) => {
            if ipv6.is_loopback() || ipv6.is_unspecified() {
                return true;
            }
            let segments = ipv6.segments();
            // fc00::/7
            let is_unique_local = (segments[0] & 0xfe00) == 0xfc00;
            // fe80::/10
            let is_link_local = (segments[0] & 0xffc0) == 0xfe80;
            is_unique_local || is_link_local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_urls_accepted() {
        assert!(validate_url("https://example.com/feed.xml", false).is_ok());
        assert!(validate_url("http://news.example.org", false).is_ok());
        assert!(validate_url("https://example.com:443/feed.xml", false).is_ok());
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let url = validate_url("  https://example.com/blog \n", false).unwrap();
        assert_eq!(url.as_str(), "https://example.com/blog");
    }

    #[test]
    fn test_unparseable_url_rejected() {
        let result = validate_url("not a url", false);
        assert!(matches!(result, Err(UrlValidationError::InvalidUrl(_))));
    }

    #[test]
    fn test_non_http_schemes_rejected() {
        assert!(matches!(
            validate_url("file:///etc/passwd", false),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(validate_url("ftp://example.com", true).is_err());
    }

    #[test]
    fn test_localhost_rejected() {
        assert!(matches!(
            validate_url("http://localhost/feed", false),
            Err(UrlValidationError::Localhost)
        ));
        assert!(matches!(
            validate_url("http://127.0.0.1/feed", false),
            Err(UrlValidationError::Localhost)
        ));
        assert!(validate_url("http://[::1]/feed", false).is_err());
    }

    #[test]
    fn test_fully_qualified_localhost_rejected() {
        assert!(matches!(
            validate_url("http://localhost.:8080/internal", false),
            Err(UrlValidationError::Localhost)
        ));
        assert!(matches!(
            validate_url("http://LOCALHOST./feed", false),
            Err(UrlValidationError::Localhost)
        ));
        assert!(matches!(
            validate_url("http://admin.localhost/feed", false),
            Err(UrlValidationError::Localhost)
        ));
        assert!(validate_url("https://example.com./feed", false).is_ok());
    }

    #[test]
    fn test_private_ips_rejected() {
        assert!(validate_url("http://192.168.1.1/feed", false).is_err());
        assert!(validate_url("http://10.0.0.1:3000/feed", false).is_err());
        assert!(validate_url("http://172.16.0.1/feed", false).is_err());
        assert!(validate_url("http://169.254.1.1/feed", false).is_err());
        assert!(validate_url("http://[fe80::1]/feed", false).is_err());
        assert!(validate_url("http://0.0.0.0/feed", false).is_err());
    }

    #[test]
    fn test_allow_private_permits_internal_hosts() {
        assert!(validate_url("http://127.0.0.1:8080/feed", true).is_ok());
        assert!(validate_url("http://192.168.1.1/feed", true).is_ok());
        assert!(validate_url("http://localhost/feed", true).is_ok());
    }
}
