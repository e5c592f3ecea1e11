//! Unit tests for URL reduction and query parsing.

use rstest::rstest;

use super::*;

// ---------------------------------------------------------------------------
// reduce_url
// ---------------------------------------------------------------------------

#[rstest]
#[case::untouched("https://host/p?a=b#f", false, false, "https://host/p?a=b#f")]
#[case::drop_query("https://host/p?a=b#f", true, false, "https://host/p#f")]
#[case::drop_fragment("https://host/p?a=b#f", false, true, "https://host/p?a=b")]
#[case::drop_both("https://host/p?a=b#f", true, true, "https://host/p")]
#[case::no_query("https://host/p#f", true, false, "https://host/p#f")]
#[case::no_fragment("https://host/p?a=b", false, true, "https://host/p?a=b")]
fn reduce_url_cases(
    #[case] url: &str,
    #[case] without_query: bool,
    #[case] without_fragment: bool,
    #[case] expected: &str,
) {
    assert_eq!(reduce_url(url, without_query, without_fragment), expected);
}

#[test]
fn question_mark_in_fragment_is_not_a_query() {
    assert_eq!(
        reduce_url("https://host/p#f?not=query", true, false),
        "https://host/p#f?not=query"
    );
    assert_eq!(
        reduce_url("https://host/p#f?not=query", false, true),
        "https://host/p"
    );
}

// ---------------------------------------------------------------------------
// extract_query
// ---------------------------------------------------------------------------

#[test]
fn extract_query_returns_multimap() {
    let params = extract_query("https://host/p?a=1&b=2&a=3");
    assert_eq!(params.get("a"), Some(&vec!["1".into(), "3".into()]));
    assert_eq!(params.get("b"), Some(&vec!["2".into()]));
}

#[test]
fn extract_query_keeps_blank_values() {
    let params = extract_query("https://host/p?a=&b");
    assert_eq!(params.get("a"), Some(&vec![String::new()]));
    assert_eq!(params.get("b"), Some(&vec![String::new()]));
}

#[test]
fn extract_query_without_query_is_empty() {
    assert!(extract_query("https://host/p").is_empty());
    assert!(extract_query("https://host/p#f?a=b").is_empty());
}

#[test]
fn extract_query_decodes_percent_escapes() {
    let params = extract_query("https://host/p?k=a%20b");
    assert_eq!(params.get("k"), Some(&vec!["a b".into()]));
}

// ---------------------------------------------------------------------------
// parse_form
// ---------------------------------------------------------------------------

#[test]
fn parse_form_splits_pairs() {
    let params = parse_form(b"user=jane&token=&scope=read&scope=write");
    assert_eq!(params.get("user"), Some(&vec!["jane".into()]));
    assert_eq!(params.get("token"), Some(&vec![String::new()]));
    assert_eq!(params.get("scope"), Some(&vec!["read".into(), "write".into()]));
}

#[test]
fn parse_form_of_empty_body_is_empty() {
    assert!(parse_form(b"").is_empty());
}
