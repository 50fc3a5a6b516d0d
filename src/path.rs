//! Bit-level paths into the map trie.

use core::cmp::Ordering;
use core::fmt;

use bitvec::prelude::*;

use crate::{KeyPath, KEY_BITS};

/// The kind of trie node a path points at, derived from the path width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// An internal node, with fewer than [`KEY_BITS`] significant bits.
    Branch,
    /// A leaf node, with a full-width path. Leaf paths coincide with keys.
    Leaf,
}

/// The path to a node in the map trie: a fixed-width bitstring of which only the first
/// `len` bits are significant.
///
/// Paths are value types. The bits beyond the significant count are zero by
/// construction, so equality and ordering over the raw representation agree with
/// equality and ordering over the significant bits.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ProofPath {
    // The bits after `len` are always zero.
    bits: [u8; 32],
    len: u16,
}

impl ProofPath {
    /// Create a path from a raw bit buffer and a significant bit count. Bits beyond the
    /// count are masked off.
    ///
    /// Panics if `len` exceeds [`KEY_BITS`]; the wire decoder is expected to never
    /// produce such a count.
    pub fn new(bits: [u8; 32], len: u16) -> Self {
        assert!(
            len as usize <= KEY_BITS,
            "{len} significant bits out of range 0..={KEY_BITS}"
        );
        ProofPath {
            bits: masked(bits, len),
            len,
        }
    }

    /// Create the full-width path of a key.
    pub fn new_leaf(key: KeyPath) -> Self {
        ProofPath {
            bits: key,
            len: KEY_BITS as u16,
        }
    }

    /// Parse a `ProofPath` from a bit string.
    #[cfg(test)]
    pub fn from_bit_str(s: &str) -> Self {
        let mut bits = BitVec::<u8, Msb0>::new();
        assert!(s.len() <= KEY_BITS, "bit string too long");
        for ch in s.chars() {
            match ch {
                '0' => bits.push(false),
                '1' => bits.push(true),
                _ => panic!("invalid character in bit string"),
            }
        }
        let len = bits.len() as u16;
        bits.resize(KEY_BITS, false);
        // unwrap: resized to 256 bits, or 32 bytes, above.
        ProofPath::new(bits.as_raw_slice().try_into().unwrap(), len)
    }

    /// The number of significant bits.
    pub fn num_bits(&self) -> u16 {
        self.len
    }

    /// The significant bits of the path.
    pub fn bits(&self) -> &BitSlice<u8, Msb0> {
        &self.bits.view_bits::<Msb0>()[..self.len as usize]
    }

    /// The kind of node this path points at.
    pub fn kind(&self) -> PathKind {
        if self.len as usize == KEY_BITS {
            PathKind::Leaf
        } else {
            PathKind::Branch
        }
    }

    /// Whether this path is a prefix of `other`. Every path is a prefix of itself.
    pub fn is_prefix_of(&self, other: &ProofPath) -> bool {
        self.len <= other.len && self.bits() == &other.bits()[..self.len as usize]
    }

    /// The longest path that is a prefix of both `self` and `other`.
    ///
    /// The common prefix of two equal paths is the path itself; the common prefix of a
    /// path and an extension of it is the shorter of the two.
    pub fn common_prefix(&self, other: &ProofPath) -> ProofPath {
        let shared = shared_bits(self.bits(), other.bits());
        ProofPath {
            bits: masked(self.bits, shared as u16),
            len: shared as u16,
        }
    }

    /// The raw path buffer, for the full wire encoding.
    pub fn raw_bytes(&self) -> &[u8; 32] {
        &self.bits
    }

    /// The minimum whole bytes holding the significant bits, for the compressed wire
    /// encoding. Trailing bits in the final byte are zero.
    pub fn compressed_bytes(&self) -> &[u8] {
        &self.bits[..(self.len as usize + 7) / 8]
    }

    /// The significant bit count as a single wire byte. A full-width count wraps to
    /// zero; the node kind disambiguates.
    pub fn len_byte(&self) -> u8 {
        self.len as u8
    }
}

// Zero every bit of `bits` at index `len` or beyond.
fn masked(mut bits: [u8; 32], len: u16) -> [u8; 32] {
    let len = len as usize;
    if len % 8 != 0 {
        bits[len / 8] &= 0xffu8 << (8 - len % 8);
    }
    for byte in &mut bits[(len + 7) / 8..] {
        *byte = 0;
    }
    bits
}

// The number of leading bits shared between two bit slices.
fn shared_bits(a: &BitSlice<u8, Msb0>, b: &BitSlice<u8, Msb0>) -> usize {
    a.iter()
        .by_vals()
        .zip(b.iter().by_vals())
        .take_while(|(a, b)| a == b)
        .count()
}

impl Ord for ProofPath {
    // Bitwise from the most significant bit; a strict prefix precedes its extensions.
    fn cmp(&self, other: &Self) -> Ordering {
        self.bits().cmp(other.bits())
    }
}

impl PartialOrd for ProofPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ProofPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len == 0 {
            write!(f, "ProofPath(root)")
        } else {
            write!(
                f,
                "ProofPath({}/{})",
                hex::encode(self.compressed_bytes()),
                self.len
            )
        }
    }
}

#[cfg(feature = "borsh")]
impl borsh::BorshSerialize for ProofPath {
    fn serialize<W: borsh::io::Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        borsh::BorshSerialize::serialize(&self.bits, writer)?;
        borsh::BorshSerialize::serialize(&self.len, writer)
    }
}

#[cfg(feature = "borsh")]
impl borsh::BorshDeserialize for ProofPath {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let bits = <[u8; 32] as borsh::BorshDeserialize>::deserialize_reader(reader)?;
        let len = <u16 as borsh::BorshDeserialize>::deserialize_reader(reader)?;
        if len as usize > KEY_BITS {
            return Err(borsh::io::Error::new(
                borsh::io::ErrorKind::InvalidData,
                "significant bit count out of range",
            ));
        }
        Ok(ProofPath::new(bits, len))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ProofPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&(self.bits, self.len), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ProofPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (bits, len) = <([u8; 32], u16) as serde::Deserialize>::deserialize(deserializer)?;
        if len as usize > KEY_BITS {
            return Err(serde::de::Error::custom("significant bit count out of range"));
        }
        Ok(ProofPath::new(bits, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_bitwise_with_prefixes_first() {
        let p = ProofPath::from_bit_str;

        assert!(p("0") < p("1"));
        assert!(p("00") < p("01"));
        assert!(p("0") < p("00"));
        assert!(p("01") < p("1"));
        assert!(p("011") < p("1"));
        assert_eq!(p("101"), p("101"));

        // A branch precedes any leaf it is a prefix of.
        let mut key = [0u8; 32];
        key[0] = 0b1000_0000;
        assert!(p("1") < ProofPath::new_leaf(key));

        // Leaf order coincides with byte order of the keys.
        assert!(ProofPath::new_leaf([0x00; 32]) < ProofPath::new_leaf([0x01; 32]));
    }

    #[test]
    fn prefix_test() {
        let p = ProofPath::from_bit_str;

        assert!(p("").is_prefix_of(&p("0")));
        assert!(p("01").is_prefix_of(&p("0110")));
        assert!(p("01").is_prefix_of(&p("01")));
        assert!(!p("01").is_prefix_of(&p("00")));
        assert!(!p("0110").is_prefix_of(&p("01")));
        assert!(!p("1").is_prefix_of(&p("01")));
    }

    #[test]
    fn common_prefix_of_diverging_paths() {
        let p = ProofPath::from_bit_str;

        assert_eq!(p("0101").common_prefix(&p("0110")), p("01"));
        assert_eq!(p("0101").common_prefix(&p("0110")).num_bits(), 2);
        assert_eq!(p("1100").common_prefix(&p("0100")), p(""));

        // Of two equal paths: either. Of a path and its extension: the shorter.
        assert_eq!(p("1011").common_prefix(&p("1011")), p("1011"));
        assert_eq!(p("10").common_prefix(&p("1011")), p("10"));
        assert_eq!(p("1011").common_prefix(&p("10")), p("10"));

        assert_eq!(
            p("0101").common_prefix(&p("0110")),
            p("0110").common_prefix(&p("0101")),
        );
    }

    #[test]
    fn construction_masks_trailing_bits() {
        let path = ProofPath::new([0xff; 32], 4);
        assert_eq!(path, ProofPath::from_bit_str("1111"));
        assert_eq!(path.raw_bytes()[0], 0b1111_0000);
        assert!(path.raw_bytes()[1..].iter().all(|&b| b == 0));

        // Junk padding does not leak into equality or ordering.
        let mut other = [0u8; 32];
        other[0] = 0b1111_1010;
        assert_eq!(ProofPath::new(other, 4), path);
    }

    #[test]
    fn kind_is_derived_from_width() {
        assert_eq!(ProofPath::new_leaf([0; 32]).kind(), PathKind::Leaf);
        assert_eq!(ProofPath::new([0; 32], 256).kind(), PathKind::Leaf);
        assert_eq!(ProofPath::new([0; 32], 255).kind(), PathKind::Branch);
        assert_eq!(ProofPath::new([0; 32], 0).kind(), PathKind::Branch);
    }

    #[test]
    fn encoding_accessors() {
        let path = ProofPath::from_bit_str("10110");
        assert_eq!(path.compressed_bytes(), &[0b1011_0000]);
        assert_eq!(path.len_byte(), 5);

        let path = ProofPath::from_bit_str("101101011");
        assert_eq!(path.compressed_bytes(), &[0b1011_0101, 0b1000_0000]);
        assert_eq!(path.len_byte(), 9);

        assert_eq!(ProofPath::from_bit_str("").compressed_bytes(), &[] as &[u8]);

        // A leaf encodes all 32 bytes; its count byte wraps to zero.
        let leaf = ProofPath::new_leaf([0xab; 32]);
        assert_eq!(leaf.compressed_bytes(), &[0xab; 32]);
        assert_eq!(leaf.len_byte(), 0);
        assert_eq!(leaf.raw_bytes(), &[0xab; 32]);
    }

    #[test]
    #[should_panic]
    fn oversized_bit_count_panics() {
        let _ = ProofPath::new([0; 32], 257);
    }
}
