//! Prefixed node identifiers.
//!
//! Every node in the layered graph is keyed by a [`NodeId`]: a `u64` whose
//! top byte is a single-character namespace prefix and whose low 56 bits are
//! a monotonically assigned index. The prefix keeps ids from different
//! producers (segments, objects, places) disjoint, and the packed form keeps
//! ids `Copy` and totally ordered for deterministic iteration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of bits reserved for the index portion of a node id.
const INDEX_BITS: u32 = 56;

/// Mask selecting the index portion of a node id.
const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;

/// Opaque node identifier.
///
/// Ordering is prefix-major, index-minor, which makes id-ordered iteration
/// group nodes by namespace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        NodeSymbol::from(*self).fmt(f)
    }
}

/// Human-readable view of a [`NodeId`]: a prefix character plus an index.
///
/// # Example
///
/// ```
/// use scene_graph_core::types::NodeSymbol;
///
/// let symbol = NodeSymbol::new('O', 3);
/// assert_eq!(symbol.prefix(), 'O');
/// assert_eq!(symbol.index(), 3);
/// assert_eq!(symbol.to_string(), "O(3)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeSymbol(NodeId);

impl NodeSymbol {
    /// Create a symbol from a prefix character and an index.
    ///
    /// The index is truncated to 56 bits; the prefix is truncated to one byte.
    #[must_use]
    pub fn new(prefix: char, index: u64) -> Self {
        let packed = ((prefix as u64 & 0xff) << INDEX_BITS) | (index & INDEX_MASK);
        Self(NodeId(packed))
    }

    /// The packed node id.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.0
    }

    /// Namespace prefix character.
    #[must_use]
    pub fn prefix(&self) -> char {
        (((self.0).0 >> INDEX_BITS) as u8) as char
    }

    /// Index within the namespace.
    #[must_use]
    pub fn index(&self) -> u64 {
        (self.0).0 & INDEX_MASK
    }

    /// Advance to the next index in the same namespace, returning the
    /// symbol prior to the increment.
    pub fn advance(&mut self) -> NodeSymbol {
        let current = *self;
        *self = NodeSymbol::new(self.prefix(), self.index() + 1);
        current
    }
}

impl From<NodeSymbol> for NodeId {
    fn from(symbol: NodeSymbol) -> Self {
        symbol.id()
    }
}

impl From<NodeId> for NodeSymbol {
    fn from(id: NodeId) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.prefix(), self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_roundtrip() {
        let symbol = NodeSymbol::new('S', 42);
        assert_eq!(symbol.prefix(), 'S');
        assert_eq!(symbol.index(), 42);

        let id = symbol.id();
        let back = NodeSymbol::from(id);
        assert_eq!(back, symbol);
    }

    #[test]
    fn test_symbol_display() {
        assert_eq!(NodeSymbol::new('O', 0).to_string(), "O(0)");
        assert_eq!(NodeSymbol::new('P', 17).to_string(), "P(17)");
    }

    #[test]
    fn test_ids_order_prefix_major() {
        let a = NodeSymbol::new('O', u64::MAX & ((1 << 56) - 1)).id();
        let b = NodeSymbol::new('S', 0).id();
        assert!(a < b, "every 'O' id must sort before every 'S' id");
    }

    #[test]
    fn test_advance_returns_prior_symbol() {
        let mut symbol = NodeSymbol::new('O', 5);
        let prior = symbol.advance();
        assert_eq!(prior.index(), 5);
        assert_eq!(symbol.index(), 6);
        assert_eq!(symbol.prefix(), 'O');
    }
}
