//! Content fingerprints (C1).
//!
//! A `Fingerprint` is a fixed-width Blake2b-512 digest. Equality implies content
//! equality with overwhelming probability; the total order exists only so
//! fingerprints can be sorted deterministically before being combined (so a
//! directory's fingerprint does not depend on the order its children were
//! enumerated in).

use blake2::digest::consts::U64;
use blake2::{Blake2b, Digest};
use std::cmp::Ordering;
use std::fmt;

type Blake2b512 = Blake2b<U64>;

/// Width of a fingerprint in bytes (Blake2b-512).
pub const FINGERPRINT_LEN: usize = 64;

/// An opaque, fixed-width content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Reconstruct a fingerprint from its raw digest bytes (used when loading a
    /// persisted record; never used to fabricate a digest from non-hash data).
    #[must_use]
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    /// Hash a byte slice directly.
    #[must_use]
    pub fn of_bytes(buf: &[u8]) -> Self {
        let mut hasher = Blake2b512::new();
        hasher.update(buf);
        Self::from_digest(hasher)
    }

    fn from_digest(hasher: Blake2b512) -> Self {
        let out = hasher.finalize();
        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&out);
        Self(bytes)
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Combine a set of child fingerprints into one aggregate fingerprint (C1).
    ///
    /// Children are sorted by [`order`] before concatenation, so the result is
    /// insensitive to the order they were produced in — this is what makes a
    /// directory fingerprint commutative over its children (spec invariant 5).
    #[must_use]
    pub fn combine<I: IntoIterator<Item = Fingerprint>>(children: I) -> Self {
        let mut sorted: Vec<Fingerprint> = children.into_iter().collect();
        sorted.sort_by(order);

        let mut hasher = Blake2b512::new();
        for fp in &sorted {
            hasher.update(&fp.0);
        }
        Self::from_digest(hasher)
    }

    /// Hex-encoded representation, for display and for use as a stable cache key
    /// component.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(FINGERPRINT_LEN * 2);
        for byte in &self.0 {
            s.push_str(&format!("{byte:02x}"));
        }
        s
    }
}

/// Total order over fingerprints: length first (always equal here, since every
/// fingerprint is a fixed-width digest, but the comparison is written generically
/// per spec §4.1), then byte-by-byte.
#[must_use]
pub fn order(a: &Fingerprint, b: &Fingerprint) -> Ordering {
    a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(&b.0))
}

impl PartialOrd for Fingerprint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(order(self, other))
    }
}

impl Ord for Fingerprint {
    fn cmp(&self, other: &Self) -> Ordering {
        order(self, other)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn of_bytes_is_deterministic() {
        let a = Fingerprint::of_bytes(b"hello world");
        let b = Fingerprint::of_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn of_bytes_differs_on_different_input() {
        let a = Fingerprint::of_bytes(b"hello world");
        let b = Fingerprint::of_bytes(b"hello world!");
        assert_ne!(a, b);
    }

    #[test]
    fn combine_is_order_insensitive() {
        let a = Fingerprint::of_bytes(b"a");
        let b = Fingerprint::of_bytes(b"b");
        let c = Fingerprint::of_bytes(b"c");

        let combined_1 = Fingerprint::combine([a, b, c]);
        let combined_2 = Fingerprint::combine([c, a, b]);
        let combined_3 = Fingerprint::combine([b, c, a]);

        assert_eq!(combined_1, combined_2);
        assert_eq!(combined_2, combined_3);
    }

    #[test]
    fn combine_differs_on_different_children() {
        let a = Fingerprint::of_bytes(b"a");
        let b = Fingerprint::of_bytes(b"b");
        let c = Fingerprint::of_bytes(b"c");

        let with_c = Fingerprint::combine([a, b, c]);
        let without_c = Fingerprint::combine([a, b]);

        assert_ne!(with_c, without_c);
    }

    #[test]
    fn to_hex_round_trips_len() {
        let fp = Fingerprint::of_bytes(b"x");
        assert_eq!(fp.to_hex().len(), FINGERPRINT_LEN * 2);
    }

    #[test]
    fn order_is_total() {
        let a = Fingerprint::of_bytes(b"a");
        let b = Fingerprint::of_bytes(b"b");
        // Exactly one of a<b, a==b, a>b holds.
        let cmp = order(&a, &b);
        assert_eq!(cmp, a.cmp(&b));
        if a != b {
            assert_ne!(cmp, Ordering::Equal);
        }
    }
}
