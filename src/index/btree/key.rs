//! Attribute descriptors and the key codec.
//!
//! Keys are stored in pages in their encoded form:
//! ```text
//! Int / Real : 4 bytes, little-endian i32 / f32
//! VarChar    : 4-byte little-endian length, then `length` bytes
//! ```
//! [`Key`] is the owned value callers pass in; [`KeyRef`] borrows straight
//! out of a page buffer so walking a node never allocates.

use std::cmp::Ordering;
use std::fmt;

use crate::common::config::MAX_KEY_SIZE;
use crate::common::{Error, Result};

/// Column type of an indexed attribute.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrType {
    Int = 0,
    Real = 1,
    VarChar = 2,
}

impl AttrType {
    /// Human-readable type name.
    pub fn name(&self) -> &'static str {
        match self {
            AttrType::Int => "Int",
            AttrType::Real => "Real",
            AttrType::VarChar => "VarChar",
        }
    }
}

/// The attribute an index is built on.
///
/// Supplied by the caller on every operation; the index file does not store it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub attr_type: AttrType,
    /// Declared length in bytes. For VarChar this is the longest string allowed.
    pub length: u32,
}

impl Attribute {
    pub fn new(name: impl Into<String>, attr_type: AttrType, length: u32) -> Self {
        Self {
            name: name.into(),
            attr_type,
            length,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, AttrType::Int, 4)
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, AttrType::Real, 4)
    }

    pub fn varchar(name: impl Into<String>, length: u32) -> Self {
        Self::new(name, AttrType::VarChar, length)
    }
}

/// An owned attribute value used as an index key.
///
/// Keys are never null. Unbounded scan ends are expressed with `Option<&Key>`.
///
/// # Example
/// ```
/// use secidx::Key;
///
/// let key = Key::varchar("abc");
/// assert_eq!(key.to_bytes(), vec![3, 0, 0, 0, b'a', b'b', b'c']);
/// assert!(Key::Int(-1) < Key::Int(0));
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    Int(i32),
    Real(f32),
    VarChar(Vec<u8>),
}

impl Key {
    /// Build a VarChar key from string or byte data.
    pub fn varchar(value: impl AsRef<[u8]>) -> Self {
        Key::VarChar(value.as_ref().to_vec())
    }

    /// The attribute type this key belongs to.
    pub fn attr_type(&self) -> AttrType {
        self.as_key_ref().attr_type()
    }

    /// Borrow this key as a [`KeyRef`].
    #[inline]
    pub fn as_key_ref(&self) -> KeyRef<'_> {
        match self {
            Key::Int(v) => KeyRef::Int(*v),
            Key::Real(v) => KeyRef::Real(*v),
            Key::VarChar(bytes) => KeyRef::VarChar(bytes),
        }
    }

    /// Size of the on-disk encoding.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        self.as_key_ref().encoded_len()
    }

    /// The on-disk encoding as a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let key = self.as_key_ref();
        let mut buf = vec![0u8; key.encoded_len()];
        key.encode_into(&mut buf);
        buf
    }

    /// Check this key against the attribute it is being used with.
    ///
    /// # Errors
    /// - `Error::KeyTypeMismatch` if the types differ
    /// - `Error::KeyTooLarge` if a VarChar exceeds the declared length, or the
    ///   encoding exceeds [`MAX_KEY_SIZE`]
    pub fn validate(&self, attribute: &Attribute) -> Result<()> {
        if self.attr_type() != attribute.attr_type {
            return Err(Error::KeyTypeMismatch {
                expected: attribute.attr_type.name(),
                actual: self.attr_type().name(),
            });
        }
        if let Key::VarChar(bytes) = self {
            if bytes.len() > attribute.length as usize {
                return Err(Error::KeyTooLarge {
                    size: bytes.len(),
                    max: attribute.length as usize,
                });
            }
        }
        if self.encoded_len() > MAX_KEY_SIZE {
            return Err(Error::KeyTooLarge {
                size: self.encoded_len(),
                max: MAX_KEY_SIZE,
            });
        }
        Ok(())
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_key_ref().cmp(&other.as_key_ref())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_key_ref(), f)
    }
}

/// A key borrowed from an encoded buffer.
#[derive(Debug, Clone, Copy)]
pub enum KeyRef<'a> {
    Int(i32),
    Real(f32),
    VarChar(&'a [u8]),
}

impl<'a> KeyRef<'a> {
    /// Decode the key at the start of `bytes`.
    ///
    /// Returns `None` if `bytes` is too short to hold the whole key.
    pub fn decode(attr_type: AttrType, bytes: &'a [u8]) -> Option<KeyRef<'a>> {
        let prefix: [u8; 4] = bytes.get(0..4)?.try_into().ok()?;
        match attr_type {
            AttrType::Int => Some(KeyRef::Int(i32::from_le_bytes(prefix))),
            AttrType::Real => Some(KeyRef::Real(f32::from_le_bytes(prefix))),
            AttrType::VarChar => {
                let len = u32::from_le_bytes(prefix) as usize;
                let end = 4usize.checked_add(len)?;
                bytes.get(4..end).map(KeyRef::VarChar)
            }
        }
    }

    pub fn attr_type(&self) -> AttrType {
        match self {
            KeyRef::Int(_) => AttrType::Int,
            KeyRef::Real(_) => AttrType::Real,
            KeyRef::VarChar(_) => AttrType::VarChar,
        }
    }

    /// Size of the on-disk encoding: 4 for Int/Real, `4 + length` for VarChar.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        match self {
            KeyRef::Int(_) | KeyRef::Real(_) => 4,
            KeyRef::VarChar(bytes) => 4 + bytes.len(),
        }
    }

    /// Write the encoding into the start of `buf`.
    ///
    /// # Panics
    /// Panics if `buf.len() < self.encoded_len()`.
    pub fn encode_into(&self, buf: &mut [u8]) {
        match self {
            KeyRef::Int(v) => buf[..4].copy_from_slice(&v.to_le_bytes()),
            KeyRef::Real(v) => buf[..4].copy_from_slice(&v.to_le_bytes()),
            KeyRef::VarChar(bytes) => {
                buf[..4].copy_from_slice(&(bytes.len() as u32).to_le_bytes());
                buf[4..4 + bytes.len()].copy_from_slice(bytes);
            }
        }
    }

    /// Copy into an owned [`Key`].
    pub fn to_key(&self) -> Key {
        match self {
            KeyRef::Int(v) => Key::Int(*v),
            KeyRef::Real(v) => Key::Real(*v),
            KeyRef::VarChar(bytes) => Key::VarChar(bytes.to_vec()),
        }
    }

    fn type_rank(&self) -> u8 {
        self.attr_type() as u8
    }
}

impl PartialEq for KeyRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyRef<'_> {}

impl PartialOrd for KeyRef<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Numeric for Int and Real, byte-lexicographic for VarChar.
///
/// Real keys compare numerically, so `-0.0 == 0.0`. NaN has no numeric
/// position and falls back to IEEE total order, which sorts it last.
/// Keys of different types order by type; an index only ever holds one type.
impl Ord for KeyRef<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyRef::Int(a), KeyRef::Int(b)) => a.cmp(b),
            (KeyRef::Real(a), KeyRef::Real(b)) if a == b => Ordering::Equal,
            (KeyRef::Real(a), KeyRef::Real(b)) => a.total_cmp(b),
            (KeyRef::VarChar(a), KeyRef::VarChar(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl fmt::Display for KeyRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRef::Int(v) => write!(f, "{}", v),
            KeyRef::Real(v) => write!(f, "{}", v),
            KeyRef::VarChar(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
        }
    }
}

/// Compare two possibly-unbounded keys.
///
/// A `None` on the left is negative infinity and a `None` on the right is
/// positive infinity, so any comparison involving a `None` is `Less`.
pub fn compare_bounded(left: Option<KeyRef<'_>>, right: Option<KeyRef<'_>>) -> Ordering {
    match (left, right) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => Ordering::Less,
    }
}
