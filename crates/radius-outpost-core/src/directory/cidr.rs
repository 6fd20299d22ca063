// # CIDR Rule Set
//
// Parses a provider's comma-separated client network list into rules ordered
// most specific first.
//
// ## Parsing
//
// Every comma-delimited segment becomes exactly one rule. A segment that
// fails to parse becomes a hole: it is logged, keeps its slot, and never
// matches. One bad entry must not lock out every other client network of the
// provider.
//
// ## Ordering
//
// Rules are sorted by ascending host-bit count (a /32 before a /24 before a
// /8). Holes sort after every parsed network. The sort is stable, so rules of
// equal specificity keep their input order. Each rule remembers its
// `source_index`, the position of its segment in the raw input.

use crate::error::Error;
use ipnet::IpNet;
use std::net::IpAddr;
use tracing::error;

/// One parsed segment of a client network list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidrRule {
    source_index: usize,
    kind: RuleKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RuleKind {
    Network(IpNet),
    Hole(String),
}

impl CidrRule {
    /// Parse one segment
    ///
    /// Whitespace around the segment is ignored. Host bits are cleared, so
    /// "10.0.0.7/24" is stored as "10.0.0.0/24".
    pub fn parse(source_index: usize, segment: &str) -> Result<Self, Error> {
        let network: IpNet = segment
            .trim()
            .parse()
            .map_err(|e: ipnet::AddrParseError| Error::cidr_parse(segment, e.to_string()))?;

        Ok(Self {
            source_index,
            kind: RuleKind::Network(network.trunc()),
        })
    }

    /// Create a hole standing in for an unparseable segment
    pub fn hole(source_index: usize, segment: impl Into<String>) -> Self {
        Self {
            source_index,
            kind: RuleKind::Hole(segment.into()),
        }
    }

    /// Position of this rule's segment in the raw input
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// The parsed network, or `None` for a hole
    pub fn network(&self) -> Option<IpNet> {
        match self.kind {
            RuleKind::Network(net) => Some(net),
            RuleKind::Hole(_) => None,
        }
    }

    /// Whether this rule is a hole
    pub fn is_hole(&self) -> bool {
        matches!(self.kind, RuleKind::Hole(_))
    }

    /// Number of host bits; holes report `u8::MAX` so they sort last
    pub fn host_bits(&self) -> u8 {
        match self.kind {
            RuleKind::Network(net) => net.max_prefix_len() - net.prefix_len(),
            RuleKind::Hole(_) => u8::MAX,
        }
    }

    /// Whether the address lies inside this rule's network
    ///
    /// IPv4-mapped IPv6 addresses are compared as IPv4. Holes never match.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match self.kind {
            RuleKind::Network(net) => net.contains(&canonical(addr)),
            RuleKind::Hole(_) => false,
        }
    }
}

impl std::fmt::Display for CidrRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            RuleKind::Network(net) => write!(f, "{}", net),
            RuleKind::Hole(segment) => write!(f, "<invalid: {:?}>", segment),
        }
    }
}

/// A provider's client networks, most specific first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CidrRuleSet {
    rules: Vec<CidrRule>,
}

impl CidrRuleSet {
    /// Parse a comma-separated list of networks
    ///
    /// Never fails. Each unparseable segment is logged and kept as a hole,
    /// so the result always has one rule per input segment.
    pub fn parse(raw: &str) -> Self {
        let mut rules: Vec<CidrRule> = raw
            .split(',')
            .enumerate()
            .map(|(idx, segment)| {
                CidrRule::parse(idx, segment).unwrap_or_else(|e| {
                    error!(cidr = %segment, error = %e, "Failed to parse CIDR");
                    CidrRule::hole(idx, segment)
                })
            })
            .collect();

        rules.sort_by_key(CidrRule::host_bits);

        Self { rules }
    }

    /// Iterate rules in evaluation order
    pub fn iter(&self) -> std::slice::Iter<'_, CidrRule> {
        self.rules.iter()
    }

    /// Number of rules, holes included
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules at all
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of holes
    pub fn hole_count(&self) -> usize {
        self.rules.iter().filter(|rule| rule.is_hole()).count()
    }

    /// First (most specific) rule containing the address
    pub fn matching_rule(&self, addr: IpAddr) -> Option<&CidrRule> {
        self.rules.iter().find(|rule| rule.contains(addr))
    }
}

impl<'a> IntoIterator for &'a CidrRuleSet {
    type Item = &'a CidrRule;
    type IntoIter = std::slice::Iter<'a, CidrRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

fn canonical(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(addr),
        IpAddr::V4(_) => addr,
    }
}
