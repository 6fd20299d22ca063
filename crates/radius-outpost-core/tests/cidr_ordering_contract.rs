//! Contract Test: Longest-Prefix-First Resolution
//!
//! This test verifies how client networks decide which provider (and which
//! shared secret) answers a request.
//!
//! Constraints verified:
//! - A network matches its first and last address and nothing outside it
//! - Overlapping rules resolve to the most specific one, whatever the input order
//! - A malformed segment never disables the provider's other networks
//! - Unmatched addresses resolve to no provider
//!
//! If this test fails, someone has changed:
//! - The rule sort order
//! - Per-segment error tolerance
//! - Provider evaluation order

mod common;

use common::*;
use radius_outpost_core::{CidrRuleSet, ProviderDirectory};
use std::net::IpAddr;

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[tokio::test]
async fn single_provider_scenario() {
    let directory = ProviderDirectory::new();
    let source = ScriptedSource::fixed(vec![provider("vpn", "s1", "10.0.0.0/24")]);

    directory.refresh(&source).await.expect("refresh succeeds");

    let found = directory.lookup(ip("10.0.0.5")).expect("10.0.0.5 is authorized");
    assert_eq!(found.provider.shared_secret().as_bytes(), b"s1");
    assert_eq!(found.provider.application_slug(), "vpn-app");
    assert_eq!(found.provider.flow_slug(), "default-authentication-flow");

    assert!(
        directory.lookup(ip("10.0.1.5")).is_none(),
        "10.0.1.5 is outside every client network"
    );
}

#[tokio::test]
async fn overlapping_ranges_prefer_longest_prefix() {
    for networks in ["10.0.0.0/8,10.0.0.0/24", "10.0.0.0/24,10.0.0.0/8"] {
        let directory = ProviderDirectory::new();
        let source = ScriptedSource::fixed(vec![provider("vpn", "s1", networks)]);
        directory.refresh(&source).await.unwrap();

        let record = &directory.snapshot()[0];
        let order: Vec<String> = record
            .client_networks()
            .iter()
            .map(|rule| rule.to_string())
            .collect();
        assert_eq!(order, vec!["10.0.0.0/24", "10.0.0.0/8"], "input: {}", networks);

        let found = directory.lookup(ip("10.0.0.5")).unwrap();
        assert_eq!(
            found.network,
            "10.0.0.0/24".parse::<ipnet::IpNet>().unwrap(),
            "input: {}",
            networks
        );
    }
}

#[tokio::test]
async fn matched_rule_maps_back_to_input_position() {
    let directory = ProviderDirectory::new();
    let source = ScriptedSource::fixed(vec![provider(
        "vpn",
        "s1",
        "garbage,172.16.0.0/12,172.16.5.0/24",
    )]);
    directory.refresh(&source).await.unwrap();

    assert_eq!(directory.lookup(ip("172.16.5.1")).unwrap().source_index, 2);
    assert_eq!(directory.lookup(ip("172.20.0.1")).unwrap().source_index, 1);
}

#[tokio::test]
async fn malformed_segment_does_not_block_valid_ones() {
    let directory = ProviderDirectory::new();
    let source = ScriptedSource::fixed(vec![provider(
        "vpn",
        "s1",
        "10.0.0.0/24,300.1.1.1/8,,192.168.1.0/24",
    )]);

    let summary = directory.refresh(&source).await.expect("refresh tolerates bad CIDRs");
    assert_eq!(summary.rules, 4);
    assert_eq!(summary.holes, 2);

    assert!(directory.lookup(ip("10.0.0.200")).is_some());
    assert!(directory.lookup(ip("192.168.1.1")).is_some());
    assert!(directory.lookup(ip("11.1.1.1")).is_none());
}

#[tokio::test]
async fn provider_with_only_invalid_networks_matches_nothing() {
    let directory = ProviderDirectory::new();
    let source = ScriptedSource::fixed(vec![
        provider("broken", "s-broken", "nonsense"),
        provider("vpn", "s-vpn", "0.0.0.0/0"),
    ]);
    directory.refresh(&source).await.unwrap();

    let found = directory.lookup(ip("203.0.113.9")).unwrap();
    assert_eq!(found.provider.name(), "vpn");
}

#[test]
fn network_and_last_address_both_match() {
    let cases = [
        ("10.0.0.0/24", "10.0.0.0", "10.0.0.255", "10.0.1.0"),
        ("10.0.0.0/31", "10.0.0.0", "10.0.0.1", "10.0.0.2"),
        ("0.0.0.0/0", "0.0.0.0", "255.255.255.255", "::1"),
        ("fd00::/64", "fd00::", "fd00::ffff:ffff:ffff:ffff", "fd00:0:0:1::"),
    ];

    for (cidr, first, last, outside) in cases {
        let set = CidrRuleSet::parse(cidr);
        assert!(set.matching_rule(ip(first)).is_some(), "{} / {}", cidr, first);
        assert!(set.matching_rule(ip(last)).is_some(), "{} / {}", cidr, last);
        assert!(set.matching_rule(ip(outside)).is_none(), "{} / {}", cidr, outside);
    }
}

#[tokio::test]
async fn default_dual_stack_networks_authorize_everyone() {
    let directory = ProviderDirectory::new();
    let source = ScriptedSource::fixed(vec![provider("vpn", "s1", "0.0.0.0/0, ::/0")]);
    directory.refresh(&source).await.unwrap();

    assert!(directory.lookup(ip("198.51.100.4")).is_some());
    assert!(directory.lookup(ip("2001:db8::4")).is_some());
    assert!(directory.lookup(ip("::ffff:198.51.100.4")).is_some());
}
