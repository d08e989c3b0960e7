//! Packet record types produced by the capture collaborator.
//!
//! The scoring core only consumes `length`; every other field passes through
//! for reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// PROTOCOL CHAIN
// ============================================================================

/// Ordered protocol names for one packet, outermost layer first
/// (e.g. `eth:ethertype:ip:tcp`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProtocolChain(Vec<String>);

impl ProtocolChain {
    pub fn new(layers: Vec<String>) -> Self {
        Self(layers)
    }

    /// Parse a colon-separated chain; empty segments are skipped.
    pub fn parse(chain: &str) -> Self {
        Self(
            chain
                .split(':')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
        )
    }

    /// Outermost layer name, what the live reporter shows for a packet.
    pub fn outermost(&self) -> Option<&str> {
        self.0.first().map(|s| s.as_str())
    }

    pub fn innermost(&self) -> Option<&str> {
        self.0.last().map(|s| s.as_str())
    }

    pub fn layers(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ProtocolChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(":"))
    }
}

impl From<&str> for ProtocolChain {
    fn from(chain: &str) -> Self {
        Self::parse(chain)
    }
}

// ============================================================================
// PACKET RECORD
// ============================================================================

/// One captured packet's metadata. Immutable once captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub destination: String,
    /// On-wire length in bytes, the only field the scorer reads.
    pub length: u64,
    pub protocols: ProtocolChain,
}

impl PacketRecord {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        length: u64,
        protocols: ProtocolChain,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            source: source.into(),
            destination: destination.into(),
            length,
            protocols,
        }
    }

    /// Minimal record for feeds that only carry a size.
    pub fn of_length(length: u64) -> Self {
        Self::new("", "", length, ProtocolChain::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chain() {
        let chain = ProtocolChain::parse("eth:ethertype:ip:tcp");
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.outermost(), Some("eth"));
        assert_eq!(chain.innermost(), Some("tcp"));
    }

    #[test]
    fn test_chain_display_round_trip() {
        let raw = "eth:ethertype:ip:udp:dns";
        assert_eq!(ProtocolChain::parse(raw).to_string(), raw);
    }

    #[test]
    fn test_empty_chain() {
        let chain = ProtocolChain::parse("");
        assert!(chain.is_empty());
        assert_eq!(chain.outermost(), None);
    }

    #[test]
    fn test_of_length() {
        let record = PacketRecord::of_length(1514);
        assert_eq!(record.length, 1514);
        assert!(record.protocols.is_empty());
    }
}
