//! Tests for deep-link parsing

use std::collections::HashMap;

use deeplinknow::domain::DomainRegistry;
use deeplinknow::link::parse_deep_link;
use deeplinknow::model::{CustomDomain, ParsedDeepLink};

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_parse_deep_link_with_valid_url() {
    let registry = DomainRegistry::default();

    let result = parse_deep_link(
        &registry,
        "https://deeplinknow.com/product/123?referrer=social_share&campaign=summer",
    );

    assert_eq!(
        result,
        Some(ParsedDeepLink {
            path: "/product/123".to_string(),
            params: params(&[("referrer", "social_share"), ("campaign", "summer")]),
        })
    );
}

#[test]
fn test_parse_deep_link_with_invalid_domain() {
    let registry = DomainRegistry::default();

    assert_eq!(parse_deep_link(&registry, "https://invalid-domain.com/x"), None);
    assert_eq!(
        parse_deep_link(&registry, "https://invalid-domain.com/product/123?referrer=social_share"),
        None
    );
}

#[test]
fn test_parse_deep_link_with_malformed_url() {
    let registry = DomainRegistry::default();

    assert_eq!(parse_deep_link(&registry, "not-a-url"), None);
    assert_eq!(parse_deep_link(&registry, ""), None);
    assert_eq!(parse_deep_link(&registry, "https://"), None);
    assert_eq!(parse_deep_link(&registry, "mailto:someone@deeplinknow.com"), None);
}

#[test]
fn test_parse_deep_link_last_duplicate_wins() {
    let registry = DomainRegistry::default();

    let result = parse_deep_link(&registry, "https://deeplinknow.com/p?tag=a&tag=b").unwrap();

    assert_eq!(result.params, params(&[("tag", "b")]));
}

#[test]
fn test_parse_deep_link_decodes_query_values() {
    let registry = DomainRegistry::default();

    let result =
        parse_deep_link(&registry, "https://go.deeplink.now/search?q=red%20shoes&next=%2Fcart").unwrap();

    assert_eq!(result.path, "/search");
    assert_eq!(result.params, params(&[("q", "red shoes"), ("next", "/cart")]));
}

#[test]
fn test_parse_deep_link_with_custom_domain() {
    let registry = DomainRegistry::default();
    let url = "https://links.example.com/promo?code=XYZ";
    assert_eq!(parse_deep_link(&registry, url), None);

    registry.merge_verified(&[CustomDomain {
        domain: Some("links.example.com".to_string()),
        verified: Some(true),
    }]);

    let result = parse_deep_link(&registry, url).unwrap();
    assert_eq!(result.path, "/promo");
    assert_eq!(result.params, params(&[("code", "XYZ")]));
}

#[test]
fn test_route_strips_one_leading_slash() {
    let registry = DomainRegistry::default();

    let data = parse_deep_link(
        &registry,
        "https://deeplinknow.com/this_is_a_test_url/anything/else/here?blah=123",
    )
    .unwrap()
    .into_deep_link_data();
    assert_eq!(data.route, "this_is_a_test_url/anything/else/here");
    assert_eq!(data.params, params(&[("blah", "123")]));

    let root = parse_deep_link(&registry, "https://deeplinknow.com/")
        .unwrap()
        .into_deep_link_data();
    assert_eq!(root.route, "");
    assert!(root.params.is_empty());

    let bare = parse_deep_link(&registry, "https://deeplinknow.com")
        .unwrap()
        .into_deep_link_data();
    assert_eq!(bare.route, "");
}
