//! Record identifier type.

use std::fmt;

use super::config::RID_SIZE;

/// Locates a record in an external heap file.
///
/// The index only copies and compares RIDs; it never follows them. The derived
/// ordering compares `page_num` first and `slot_num` second, which is the
/// tie-break used for equal keys inside a leaf.
///
/// # Example
/// ```
/// use secidx::Rid;
///
/// let rid = Rid::new(7, 3);
/// assert!(rid < Rid::new(7, 4));
/// assert!(rid < Rid::new(8, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rid {
    pub page_num: u32,
    pub slot_num: u32,
}

impl Rid {
    /// Create a new Rid.
    #[inline]
    pub fn new(page_num: u32, slot_num: u32) -> Self {
        Self { page_num, slot_num }
    }

    /// Decode from `RID_SIZE` bytes: page number then slot number, little-endian.
    ///
    /// # Panics
    /// Panics if `bytes.len() < RID_SIZE`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= RID_SIZE, "buffer too small for Rid");
        Self {
            page_num: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            slot_num: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// Encode into the first `RID_SIZE` bytes of `bytes`.
    ///
    /// # Panics
    /// Panics if `bytes.len() < RID_SIZE`.
    pub fn write_to(&self, bytes: &mut [u8]) {
        assert!(bytes.len() >= RID_SIZE, "buffer too small for Rid");
        bytes[0..4].copy_from_slice(&self.page_num.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.slot_num.to_le_bytes());
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.page_num, self.slot_num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rid_byte_layout() {
        let rid = Rid::new(0x04030201, 0x08070605);
        let mut buf = [0u8; RID_SIZE];
        rid.write_to(&mut buf);

        assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(Rid::from_bytes(&buf), rid);
    }

    #[test]
    fn test_rid_ordering() {
        assert!(Rid::new(1, 9) < Rid::new(2, 0));
        assert!(Rid::new(2, 0) < Rid::new(2, 1));
        assert_eq!(Rid::new(5, 5), Rid::new(5, 5));
    }

    #[test]
    fn test_rid_display() {
        assert_eq!(format!("{}", Rid::new(12, 13)), "(12,13)");
    }
}
