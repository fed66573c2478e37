//! Markup inspection: telling feeds apart from web pages, pulling `<link>`
//! feed hints out of HTML, and reading the first `<title>` of a feed.
//!
//! Element and attribute names are compared by local name only, so a
//! prefixed `atom:link` or `dc:title` is treated exactly like `link` or
//! `title`.

use quick_xml::events::Event;
use quick_xml::Reader;
use scraper::{ElementRef, Html};
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Errors raised while reading markup.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// Nothing to parse: the body is empty or whitespace only
    #[error("document is empty")]
    Empty,
    /// The body is not well-formed XML
    #[error("malformed XML: {0}")]
    Xml(String),
}

/// Which syndication format a feed document uses, judged by its root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Rss,
    Atom,
}

/// A `<link>` element lifted out of an HTML page.
///
/// Attribute names are stored lowercased with any namespace prefix removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkElement {
    attributes: Vec<(String, String)>,
}

impl LinkElement {
    pub fn new<K, V>(attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (local_name(k.as_ref()).to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Value of the named attribute, if present. Names are matched
    /// case-insensitively and without namespace prefix.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        let name = local_name(name);
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The trimmed `href`, or `None` when it is missing or blank.
    pub fn href(&self) -> Option<&str> {
        self.attribute("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
    }

    /// True when `rel` is `alternate` or `feed` and there is a usable `href`.
    pub fn is_feed_hint(&self) -> bool {
        let rel_matches = self.attribute("rel").is_some_and(|rel| {
            let rel = rel.trim();
            rel.eq_ignore_ascii_case("alternate") || rel.eq_ignore_ascii_case("feed")
        });
        rel_matches && self.href().is_some()
    }
}

/// An HTML page reduced to the parts feed discovery cares about.
#[derive(Debug, Clone, Default)]
pub struct HtmlDocument {
    links: Vec<LinkElement>,
}

impl HtmlDocument {
    /// Every `<link>` element in document order.
    pub fn links(&self) -> &[LinkElement] {
        &self.links
    }
}

/// Result of [`classify`].
#[derive(Debug, Clone)]
pub enum Document {
    /// Well-formed XML whose root is `<rss>` or `<feed>`
    Feed(FeedKind),
    /// Anything else that parsed as HTML
    Html(HtmlDocument),
}

/// Decides whether `body` is a feed or a page to scan for hints.
///
/// A strict XML parse is attempted first; only a well-formed document with
/// an `rss` or `feed` root counts as a feed. Everything else goes through the
/// lenient HTML parser.
///
/// # Errors
///
/// Returns [`MarkupError::Empty`] for a body with no content, which neither
/// parser can turn into a document.
pub fn classify(body: &[u8]) -> Result<Document, MarkupError> {
    let body = strip_bom(body);
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(MarkupError::Empty);
    }

    match xml_root_name(body).as_deref() {
        Some("rss") => return Ok(Document::Feed(FeedKind::Rss)),
        Some("feed") => return Ok(Document::Feed(FeedKind::Atom)),
        _ => {}
    }

    Ok(Document::Html(parse_html(body)))
}

/// Feed hints of an HTML page, in document order.
///
/// No ranking is applied: callers take the first one.
pub fn find_feed_hints(doc: &HtmlDocument) -> impl Iterator<Item = &LinkElement> + '_ {
    doc.links.iter().filter(|link| link.is_feed_hint())
}

/// Text content of the first `title` element of an XML document.
///
/// Text and CDATA of nested elements are concatenated. Returns `Ok(None)`
/// when the document has no title at all.
///
/// # Errors
///
/// Returns [`MarkupError::Xml`] if the XML is malformed before the first
/// title has been read completely, or [`MarkupError::Empty`] for an empty body.
pub fn first_title(body: &[u8]) -> Result<Option<String>, MarkupError> {
    let body = strip_bom(body);
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(MarkupError::Empty);
    }

    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    let mut title: Option<String> = None;
    let mut nested: usize = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if title.is_some() {
                    nested += 1;
                } else if e.local_name().as_ref() == b"title" {
                    title = Some(String::new());
                }
            }
            Ok(Event::Empty(e)) => {
                if title.is_none() && e.local_name().as_ref() == b"title" {
                    return Ok(Some(String::new()));
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(acc) = title.as_mut() {
                    let text = t
                        .unescape()
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned().into());
                    acc.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(acc) = title.as_mut() {
                    acc.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(_)) => {
                if title.is_some() {
                    if nested == 0 {
                        return Ok(title);
                    }
                    nested -= 1;
                }
            }
            Ok(Event::Eof) => {
                return match title {
                    Some(_) => Err(MarkupError::Xml(
                        "document ended inside <title>".to_owned(),
                    )),
                    None => Ok(None),
                };
            }
            Err(e) => return Err(MarkupError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
}

/// Local name of the root element if `body` is well-formed XML, else `None`.
fn xml_root_name(body: &[u8]) -> Option<String> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    let mut depth: usize = 0;
    let mut root: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if depth == 0 {
                    // A second top-level element is not well-formed
                    if root.is_some() {
                        return None;
                    }
                    root = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                if depth == 0 {
                    if root.is_some() {
                        return None;
                    }
                    root = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.checked_sub(1)?;
            }
            Ok(Event::Text(t)) => {
                if depth == 0 && !t.iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }

    if depth != 0 {
        return None;
    }
    root
}

fn parse_html(body: &[u8]) -> HtmlDocument {
    let text = String::from_utf8_lossy(body);
    let html = Html::parse_document(&text);

    let links = html
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| local_name(el.value().name()).eq_ignore_ascii_case("link"))
        .map(|el| LinkElement::new(el.value().attrs()))
        .collect();

    HtmlDocument { links }
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn strip_bom(body: &[u8]) -> &[u8] {
    body.strip_prefix(UTF8_BOM).unwrap_or(body)
}
