//! Bit-level key access.
//!
//! Bit `0` is always the most significant bit of the first byte (or of the
//! integer), so the ordering derived from [`BitKey::compare`] agrees with
//! plain lexicographic byte order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Bitwise access to a key, as consumed by the trie.
///
/// Only [`bit_len`](BitKey::bit_len) and [`bit`](BitKey::bit) are required.
/// The provided methods derive everything else from them and may be
/// overridden with faster versions; overrides must stay consistent with the
/// bit-by-bit definitions.
pub trait BitKey {
    /// Length of the key in bits.
    fn bit_len(&self) -> usize;

    /// Returns the bit at `index`. Callers guarantee `index < self.bit_len()`;
    /// implementations may panic otherwise.
    fn bit(&self, index: usize) -> bool;

    /// Index of the first bit at which the two keys differ.
    ///
    /// When one key is a prefix of the other, this is the length of the
    /// shorter one. Returns `None` when both keys are equal.
    fn contrast(&self, other: &Self) -> Option<usize> {
        let len = self.bit_len();
        let other_len = other.bit_len();
        let min = len.min(other_len);
        if let Some(i) = (0..min).find(|&i| self.bit(i) != other.bit(i)) {
            return Some(i);
        }
        (len != other_len).then_some(min)
    }

    /// Total order consistent with the bits: a 1-bit ranks above a 0-bit at
    /// the first differing position, and a prefix ranks below its extensions.
    fn compare(&self, other: &Self) -> Ordering {
        match self.contrast(other) {
            None => Ordering::Equal,
            Some(i) if i == self.bit_len() => Ordering::Less,
            Some(i) if i == other.bit_len() => Ordering::Greater,
            Some(i) => {
                if self.bit(i) {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
        }
    }

    /// Whether `prefix` is a prefix of this key. Equal keys count only when
    /// `inclusive` is set.
    fn is_prefixed_by(&self, prefix: &Self, inclusive: bool) -> bool {
        match self.contrast(prefix) {
            None => inclusive,
            Some(i) => i == prefix.bit_len(),
        }
    }

    /// Bounds-checked variant of [`bit`](BitKey::bit).
    fn checked_bit(&self, index: usize) -> Result<bool> {
        let len = self.bit_len();
        if index < len {
            Ok(self.bit(index))
        } else {
            Err(Error::BitIndexOutOfBounds { index, len })
        }
    }
}

// =============================================================================
// Byte helpers
// =============================================================================

#[inline]
fn byte_bit(bytes: &[u8], index: usize) -> bool {
    bytes[index / 8] & (0x80 >> (index % 8)) != 0
}

/// First differing bit between two MSB-first bit buffers of the given bit
/// lengths. Bits past a buffer's length are ignored.
fn contrast_bytes(a: &[u8], a_bits: usize, b: &[u8], b_bits: usize) -> Option<usize> {
    let min = a_bits.min(b_bits);
    let full = min / 8;
    if let Some(i) = a[..full].iter().zip(&b[..full]).position(|(x, y)| x != y) {
        return Some(i * 8 + (a[i] ^ b[i]).leading_zeros() as usize);
    }
    let rem = min % 8;
    if rem != 0 {
        let diff = (a[full] ^ b[full]) & (0xFFu8 << (8 - rem));
        if diff != 0 {
            return Some(full * 8 + diff.leading_zeros() as usize);
        }
    }
    (a_bits != b_bits).then_some(min)
}

impl BitKey for [u8] {
    #[inline]
    fn bit_len(&self) -> usize {
        self.len() * 8
    }

    #[inline]
    fn bit(&self, index: usize) -> bool {
        byte_bit(self, index)
    }

    fn contrast(&self, other: &Self) -> Option<usize> {
        contrast_bytes(self, self.len() * 8, other, other.len() * 8)
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl<const N: usize> BitKey for [u8; N] {
    #[inline]
    fn bit_len(&self) -> usize {
        N * 8
    }

    #[inline]
    fn bit(&self, index: usize) -> bool {
        byte_bit(self, index)
    }

    fn contrast(&self, other: &Self) -> Option<usize> {
        contrast_bytes(self, N * 8, other, N * 8)
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl BitKey for str {
    #[inline]
    fn bit_len(&self) -> usize {
        self.len() * 8
    }

    #[inline]
    fn bit(&self, index: usize) -> bool {
        byte_bit(self.as_bytes(), index)
    }

    fn contrast(&self, other: &Self) -> Option<usize> {
        self.as_bytes().contrast(other.as_bytes())
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl BitKey for [bool] {
    #[inline]
    fn bit_len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn bit(&self, index: usize) -> bool {
        self[index]
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

/// Owned containers delegate to their borrowed form so that a trie keyed by
/// `Vec<u8>` can be queried with `&[u8]`, and one keyed by `String` with `&str`.
macro_rules! delegate_bit_key {
    ($owned:ty => $borrowed:ty) => {
        impl BitKey for $owned {
            #[inline]
            fn bit_len(&self) -> usize {
                <$borrowed as BitKey>::bit_len(self)
            }

            #[inline]
            fn bit(&self, index: usize) -> bool {
                <$borrowed as BitKey>::bit(self, index)
            }

            fn contrast(&self, other: &Self) -> Option<usize> {
                <$borrowed as BitKey>::contrast(self, other)
            }

            fn compare(&self, other: &Self) -> Ordering {
                <$borrowed as BitKey>::compare(self, other)
            }
        }
    };
}

delegate_bit_key!(Vec<u8> => [u8]);
delegate_bit_key!(String => str);
delegate_bit_key!(Vec<bool> => [bool]);

impl<T: BitKey + ?Sized> BitKey for &T {
    #[inline]
    fn bit_len(&self) -> usize {
        (**self).bit_len()
    }

    #[inline]
    fn bit(&self, index: usize) -> bool {
        (**self).bit(index)
    }

    fn contrast(&self, other: &Self) -> Option<usize> {
        (**self).contrast(*other)
    }

    fn compare(&self, other: &Self) -> Ordering {
        (**self).compare(*other)
    }
}

// =============================================================================
// Integers
// =============================================================================

macro_rules! unsigned_bit_key {
    ($($t:ty),*) => {$(
        impl BitKey for $t {
            #[inline]
            fn bit_len(&self) -> usize {
                <$t>::BITS as usize
            }

            #[inline]
            fn bit(&self, index: usize) -> bool {
                (*self >> (<$t>::BITS as usize - 1 - index)) & 1 != 0
            }

            #[inline]
            fn contrast(&self, other: &Self) -> Option<usize> {
                let diff = *self ^ *other;
                (diff != 0).then(|| diff.leading_zeros() as usize)
            }

            #[inline]
            fn compare(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }
        }
    )*};
}

unsigned_bit_key!(u8, u16, u32, u64, u128, usize);

// Signed values flip the sign bit so that bit order matches numeric order.
macro_rules! signed_bit_key {
    ($($t:ty => $u:ty),*) => {$(
        impl BitKey for $t {
            #[inline]
            fn bit_len(&self) -> usize {
                <$u>::BITS as usize
            }

            #[inline]
            fn bit(&self, index: usize) -> bool {
                let flipped = (*self as $u) ^ (1 << (<$u>::BITS - 1));
                flipped.bit(index)
            }

            #[inline]
            fn contrast(&self, other: &Self) -> Option<usize> {
                (*self as $u).contrast(&(*other as $u))
            }

            #[inline]
            fn compare(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }
        }
    )*};
}

signed_bit_key!(i8 => u8, i16 => u16, i32 => u32, i64 => u64, i128 => u128, isize => usize);

// Floats order like `total_cmp`: negative values invert every bit, others
// only set the sign bit. Raw bits already differ where the ordered ones do.
macro_rules! float_bit_key {
    (@ordered $v:expr, $u:ty) => {{
        let bits = $v.to_bits();
        let sign: $u = 1 << (<$u>::BITS - 1);
        if bits & sign != 0 {
            !bits
        } else {
            bits | sign
        }
    }};
    ($($t:ty => $u:ty),*) => {$(
        impl BitKey for $t {
            #[inline]
            fn bit_len(&self) -> usize {
                <$u>::BITS as usize
            }

            #[inline]
            fn bit(&self, index: usize) -> bool {
                float_bit_key!(@ordered self, $u).bit(index)
            }

            #[inline]
            fn contrast(&self, other: &Self) -> Option<usize> {
                self.to_bits().contrast(&other.to_bits())
            }

            #[inline]
            fn compare(&self, other: &Self) -> Ordering {
                self.total_cmp(other)
            }
        }
    )*};
}

float_bit_key!(f32 => u32, f64 => u64);

impl BitKey for char {
    #[inline]
    fn bit_len(&self) -> usize {
        32
    }

    #[inline]
    fn bit(&self, index: usize) -> bool {
        (*self as u32).bit(index)
    }

    fn contrast(&self, other: &Self) -> Option<usize> {
        (*self as u32).contrast(&(*other as u32))
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

// =============================================================================
// BitString
// =============================================================================

/// An owned, bit-exact key of arbitrary length.
///
/// Unused trailing bits of the last byte are always zero, so derived
/// equality and hashing agree with the bit content.
///
/// ```rust
/// use patricia_map::{BitKey, BitString};
///
/// let a: BitString = "0110".parse().unwrap();
/// let b = BitString::from_bytes(&[0b0110_0000], 4);
/// assert_eq!(a, b);
/// assert_eq!(a.bit_len(), 4);
/// assert_eq!(a.to_string(), "0110");
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBitString")]
pub struct BitString {
    bytes: SmallVec<[u8; 16]>,
    len: usize,
}

#[derive(Deserialize)]
struct RawBitString {
    bytes: SmallVec<[u8; 16]>,
    len: usize,
}

impl TryFrom<RawBitString> for BitString {
    type Error = String;

    fn try_from(raw: RawBitString) -> std::result::Result<Self, Self::Error> {
        if raw.bytes.len() != raw.len.div_ceil(8) {
            return Err(format!(
                "bit string of {} bits cannot have {} bytes",
                raw.len,
                raw.bytes.len()
            ));
        }
        Ok(BitString::from_bytes(&raw.bytes, raw.len))
    }
}

impl BitString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: SmallVec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    /// Takes the first `len` bits of `bytes`. `len` is clamped to the number
    /// of bits available.
    pub fn from_bytes(bytes: &[u8], len: usize) -> Self {
        let len = len.min(bytes.len() * 8);
        let mut out = Self {
            bytes: SmallVec::from_slice(&bytes[..len.div_ceil(8)]),
            len,
        };
        out.mask_tail();
        out
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.len).then(|| byte_bit(&self.bytes, index))
    }

    /// Backing bytes, MSB first, with zeroed trailing bits.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn push(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<bool> {
        let bit = self.get(self.len.checked_sub(1)?)?;
        self.truncate(self.len - 1);
        Some(bit)
    }

    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        self.len = len;
        self.bytes.truncate(len.div_ceil(8));
        self.mask_tail();
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| byte_bit(&self.bytes, i))
    }

    fn mask_tail(&mut self) {
        let rem = self.len % 8;
        if rem != 0 {
            if let Some(last) = self.bytes.last_mut() {
                *last &= 0xFFu8 << (8 - rem);
            }
        }
    }
}

impl BitKey for BitString {
    #[inline]
    fn bit_len(&self) -> usize {
        self.len
    }

    #[inline]
    fn bit(&self, index: usize) -> bool {
        byte_bit(&self.bytes, index)
    }

    fn contrast(&self, other: &Self) -> Option<usize> {
        contrast_bytes(&self.bytes, self.len, &other.bytes, other.len)
    }
}

impl Ord for BitString {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for BitString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for BitString {
    type Err = Error;

    /// Parses a string of `'0'` and `'1'` characters.
    fn from_str(s: &str) -> Result<Self> {
        let mut out = BitString::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '0' => out.push(false),
                '1' => out.push(true),
                _ => {
                    return Err(Error::KeyIncompatible(format!(
                        "invalid bit character {c:?} in {s:?}"
                    )))
                }
            }
        }
        Ok(out)
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut out = BitString::new();
        out.extend(iter);
        out
    }
}

impl Extend<bool> for BitString {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, iter: I) {
        for bit in iter {
            self.push(bit);
        }
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitString(\"{self}\")")
    }
}
