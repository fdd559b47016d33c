//! SHA-256 provenance hashing for contributing feeds.

use sha2::{Digest, Sha256};

use crate::feed::OracleFeed;

/// Compute the hex-encoded SHA-256 hash of `content`.
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Leaf hash of a feed: `sha256("{source}:{value}:{timestamp}")`.
pub fn leaf_hash(feed: &OracleFeed) -> String {
    let leaf = format!("{}:{}:{}", feed.source, feed.value, feed.timestamp);
    sha256_hex(leaf.as_bytes())
}

/// Fold leaf hashes into a Merkle root.
///
/// Parents hash the concatenated hex of their children; an unpaired last
/// node is paired with itself. Returns `None` when there are no leaves.
pub fn merkle_root(leaves: Vec<String>) -> Option<String> {
    if leaves.is_empty() {
        return None;
    }

    let mut level = leaves;
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                sha256_hex(format!("{left}{right}").as_bytes())
            })
            .collect();
    }

    level.pop()
}

/// Merkle root over feeds, in the given order.
pub fn feeds_merkle_root<'a>(feeds: impl IntoIterator<Item = &'a OracleFeed>) -> Option<String> {
    merkle_root(feeds.into_iter().map(leaf_hash).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(sha256_hex(b"").len(), 64);
    }

    #[test]
    fn test_single_leaf_is_its_own_root() {
        let leaf = sha256_hex(b"x");
        assert_eq!(merkle_root(vec![leaf.clone()]), Some(leaf));
        assert_eq!(merkle_root(vec![]), None);
    }

    #[test]
    fn test_odd_leaf_is_duplicated() {
        let a = sha256_hex(b"a");
        let b = sha256_hex(b"b");
        let c = sha256_hex(b"c");

        let ab = sha256_hex(format!("{a}{b}").as_bytes());
        let cc = sha256_hex(format!("{c}{c}").as_bytes());
        let expected = sha256_hex(format!("{ab}{cc}").as_bytes());

        assert_eq!(merkle_root(vec![a, b, c]), Some(expected));
    }

    #[test]
    fn test_feed_root_depends_on_content_and_order() {
        let f1 = OracleFeed::price("binance", "BTC", 100.0, 1);
        let f2 = OracleFeed::price("pyth", "BTC", 101.0, 2);
        let tampered = OracleFeed::price("pyth", "BTC", 101.5, 2);

        let root = feeds_merkle_root([&f1, &f2]);
        assert_eq!(root, feeds_merkle_root([&f1, &f2]));
        assert_ne!(root, feeds_merkle_root([&f2, &f1]));
        assert_ne!(root, feeds_merkle_root([&f1, &tampered]));
    }
}
