//! Deep-link URL parsing
//!
//! A link is only trusted when its host passes the [`DomainRegistry`]. Parsing
//! never panics: malformed input is reported as `None`.

use std::collections::HashMap;

use url::Url;

use crate::domain::DomainRegistry;
use crate::model::ParsedDeepLink;

/// Splits `url` into its path and query parameters.
///
/// Returns `None` if the URL cannot be parsed, has no host, or its host is
/// not an allowed domain. Query values are percent-decoded; when a key is
/// repeated the last value wins.
///
/// # Example
///
/// ```
/// # use deeplinknow::domain::DomainRegistry;
/// # use deeplinknow::link::parse_deep_link;
/// let registry = DomainRegistry::default();
/// let link = parse_deep_link(&registry, "https://deeplinknow.com/product/123?campaign=summer").unwrap();
/// assert_eq!(link.path, "/product/123");
/// assert_eq!(link.params["campaign"], "summer");
/// ```
pub fn parse_deep_link(registry: &DomainRegistry, url: &str) -> Option<ParsedDeepLink> {
    let url = Url::parse(url.trim()).ok()?;

    let host = url.host_str().unwrap_or_default();
    if !registry.is_valid_domain(host) {
        return None;
    }

    let params: HashMap<String, String> = url
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    Some(ParsedDeepLink {
        path: url.path().to_string(),
        params,
    })
}

/// Host part of a clipboard or link string, if it parses as an absolute URL.
pub(crate) fn host_of(text: &str) -> Option<String> {
    let url = Url::parse(text.trim()).ok()?;
    url.host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}
