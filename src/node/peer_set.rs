//! Static peer set supplied at node construction
use std::net::SocketAddr;
use std::sync::Arc;

use rand::seq::IndexedRandom;

/// Immutable, ordered list of peer addresses
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerSet {
    peers: Arc<[SocketAddr]>,
}

impl PeerSet {
    pub fn new(peers: Vec<SocketAddr>) -> Self {
        Self {
            peers: peers.into(),
        }
    }

    /// `min(count, len)` distinct peers chosen uniformly at random
    pub fn choose_many(&self, count: usize) -> Vec<SocketAddr> {
        let mut rng = rand::rng();
        self.peers
            .choose_multiple(&mut rng, count)
            .copied()
            .collect()
    }

    /// One peer chosen uniformly at random, if there are any
    pub fn choose_one(&self) -> Option<SocketAddr> {
        let mut rng = rand::rng();
        self.peers.choose(&mut rng).copied()
    }

    pub fn as_slice(&self) -> &[SocketAddr] {
        &self.peers
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl Default for PeerSet {
    fn default() -> Self {
        PeerSet::new(Vec::new())
    }
}

impl From<Vec<SocketAddr>> for PeerSet {
    fn from(peers: Vec<SocketAddr>) -> Self {
        PeerSet::new(peers)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn peers(n: u16) -> PeerSet {
        PeerSet::new(
            (0..n)
                .map(|i| SocketAddr::from(([127, 0, 0, 1], 7000 + i)))
                .collect(),
        )
    }

    #[test]
    fn test_choose_many_is_bounded_and_distinct() {
        let set = peers(5);
        for _ in 0..100 {
            let chosen = set.choose_many(2);
            assert_eq!(chosen.len(), 2);
            let unique: HashSet<_> = chosen.iter().collect();
            assert_eq!(unique.len(), 2);
            assert!(chosen.iter().all(|p| set.as_slice().contains(p)));
        }
    }

    #[test]
    fn test_choose_many_caps_at_peer_count() {
        let set = peers(1);
        assert_eq!(set.choose_many(2).len(), 1);
    }

    #[test]
    fn test_empty_set() {
        let set = PeerSet::default();
        assert!(set.is_empty());
        assert!(set.choose_many(2).is_empty());
        assert!(set.choose_one().is_none());
    }

    #[test]
    fn test_choose_one_reaches_every_peer() {
        let set = peers(3);
        let seen: HashSet<_> = (0..200).filter_map(|_| set.choose_one()).collect();
        assert_eq!(seen.len(), 3);
    }
}
