//! Textual URL reduction and query/form parsing.
//!
//! Expectations may ignore the query string or the fragment of a URL, so the
//! comparison works on a reduced form of the URL the client was actually
//! called with. Reduction is purely textual; the one subtlety is that a `?`
//! appearing after `#` belongs to the fragment and does not start a query.

use std::collections::BTreeMap;

use url::form_urlencoded;

/// Multi-valued parameter map produced by [`extract_query`] and
/// [`parse_form`].
pub type ParamMap = BTreeMap<String, Vec<String>>;

/// Splits a URL into its pre-fragment part and optional fragment.
fn split_fragment(url: &str) -> (&str, Option<&str>) {
    url.split_once('#')
        .map_or((url, None), |(head, fragment)| (head, Some(fragment)))
}

/// Strips the query and/or fragment from a URL.
///
/// # Example
///
/// ```
/// use stagehand_mock::reduce_url;
///
/// let url = "https://host/path?a=b#frag";
/// assert_eq!(reduce_url(url, true, false), "https://host/path#frag");
/// assert_eq!(reduce_url(url, false, true), "https://host/path?a=b");
/// assert_eq!(reduce_url(url, true, true), "https://host/path");
/// ```
#[must_use]
pub fn reduce_url(url: &str, without_query: bool, without_fragment: bool) -> String {
    let (head, fragment) = split_fragment(url);
    let path = if without_query {
        head.split_once('?').map_or(head, |(before, _)| before)
    } else {
        head
    };
    let mut reduced = String::from(path);
    if !without_fragment {
        if let Some(fragment_part) = fragment {
            reduced.push('#');
            reduced.push_str(fragment_part);
        }
    }
    reduced
}

/// Extracts the query parameters of a URL into a multimap.
///
/// Blank values are kept: `?a=&b` yields empty-string values for both `a`
/// and `b`. A `?` inside the fragment is not treated as a query.
#[must_use]
pub fn extract_query(url: &str) -> ParamMap {
    let (head, _fragment) = split_fragment(url);
    head.split_once('?')
        .map_or_else(ParamMap::new, |(_, query)| parse_urlencoded(query))
}

/// Parses an `application/x-www-form-urlencoded` body into a multimap.
///
/// Invalid UTF-8 sequences are replaced, mirroring lossy decoding on the
/// wire; blank values are kept.
#[must_use]
pub fn parse_form(body: &[u8]) -> ParamMap {
    let text = String::from_utf8_lossy(body);
    parse_urlencoded(&text)
}

fn parse_urlencoded(input: &str) -> ParamMap {
    let mut params = ParamMap::new();
    for (key, value) in form_urlencoded::parse(input.as_bytes()) {
        params
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    params
}

#[cfg(test)]
mod tests;
