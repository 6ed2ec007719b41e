//! # Role Bitmask
//!
//! Capability checks expressed as bit overlap.
//!
//! ## Encoding
//! ```text
//! Roles are 1-based positions in a list of `width` roles.
//! Bits are written left to right, position 1 first:
//!
//!   role list:  [customer, admin, staff]      width = 3
//!
//!   "100"  = customer
//!   "010"  = admin
//!   "011"  = admin + staff
//!
//! has_access(caller, required) = ∃ i : caller[i] ∧ required[i]
//!
//!   caller "010"  required "011"  →  granted  (bit 2 shared)
//!   caller "010"  required "100"  →  denied
//! ```
//!
//! The width is configuration, passed in by the caller. There is no
//! process-wide role table.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Most roles a single mask can describe.
pub const MAX_ROLES: u32 = 64;

/// A set of roles out of a role list of fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleBits {
    mask: u64,
    width: u32,
}

impl RoleBits {
    /// The empty set for a role list of `width` roles.
    pub fn empty(width: u32) -> Result<Self, ValidationError> {
        check_width(width)?;
        Ok(RoleBits { mask: 0, width })
    }

    /// A mask with only `role_id` set.
    ///
    /// ## Example
    /// ```rust
    /// use gunpla_core::auth::RoleBits;
    ///
    /// assert_eq!(RoleBits::for_role(2, 3).unwrap().to_string(), "010");
    /// assert!(RoleBits::for_role(4, 3).is_err());
    /// ```
    pub fn for_role(role_id: u32, width: u32) -> Result<Self, ValidationError> {
        Self::for_roles(&[role_id], width)
    }

    /// A mask with every id in `role_ids` set.
    pub fn for_roles(role_ids: &[u32], width: u32) -> Result<Self, ValidationError> {
        let mut bits = Self::empty(width)?;
        for &id in role_ids {
            if id == 0 || id > width {
                return Err(ValidationError::OutOfRange {
                    field: "role_id".to_string(),
                    min: 1,
                    max: width as i64,
                });
            }
            bits.mask |= 1u64 << (id - 1);
        }
        Ok(bits)
    }

    /// Number of roles in the list this mask is defined over.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// True when `role_id` is in the set.
    #[inline]
    pub fn contains(&self, role_id: u32) -> bool {
        role_id >= 1 && role_id <= self.width && self.mask & (1u64 << (role_id - 1)) != 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }
}

fn check_width(width: u32) -> Result<(), ValidationError> {
    if width == 0 || width > MAX_ROLES {
        return Err(ValidationError::OutOfRange {
            field: "role_count".to_string(),
            min: 1,
            max: MAX_ROLES as i64,
        });
    }
    Ok(())
}

/// True when the caller holds at least one of the required roles.
///
/// Masks over different role lists never grant access.
pub fn has_access(caller: &RoleBits, required: &RoleBits) -> bool {
    caller.width == required.width && caller.mask & required.mask != 0
}

impl fmt::Display for RoleBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in 1..=self.width {
            f.write_str(if self.contains(id) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for RoleBits {
    type Err = ValidationError;

    /// Parses a left-to-right bit string; its length is the width.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let width = u32::try_from(s.len()).map_err(|_| ValidationError::TooLong {
            field: "role_bits".to_string(),
            max: MAX_ROLES as usize,
        })?;
        let mut bits = Self::empty(width)?;

        for (i, c) in s.chars().enumerate() {
            match c {
                '1' => bits.mask |= 1u64 << i,
                '0' => {}
                _ => {
                    return Err(ValidationError::InvalidFormat {
                        field: "role_bits".to_string(),
                        reason: "only '0' and '1' are allowed".to_string(),
                    })
                }
            }
        }
        Ok(bits)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(s: &str) -> RoleBits {
        s.parse().unwrap()
    }

    #[test]
    fn test_overlap_grants_access() {
        assert!(has_access(&bits("010"), &bits("011")));
        assert!(!has_access(&bits("010"), &bits("100")));
    }

    #[test]
    fn test_width_mismatch_denies() {
        assert!(!has_access(&bits("010"), &bits("0100")));
    }

    #[test]
    fn test_empty_mask_never_grants() {
        let none = RoleBits::empty(3).unwrap();
        assert!(!has_access(&none, &bits("111")));
        assert!(none.is_empty());
    }

    #[test]
    fn test_for_role_matches_bit_string() {
        assert_eq!(RoleBits::for_role(2, 3).unwrap(), bits("010"));
        assert_eq!(RoleBits::for_roles(&[2, 3], 3).unwrap(), bits("011"));
        assert_eq!(RoleBits::for_role(1, 3).unwrap().to_string(), "100");
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(RoleBits::for_role(0, 3).is_err());
        assert!(RoleBits::for_role(4, 3).is_err());
        assert!(RoleBits::empty(0).is_err());
        assert!(RoleBits::empty(65).is_err());
        assert!("01x".parse::<RoleBits>().is_err());
    }

    #[test]
    fn test_contains() {
        let b = bits("011");
        assert!(!b.contains(1));
        assert!(b.contains(2));
        assert!(b.contains(3));
        assert!(!b.contains(4));
        assert_eq!(b.width(), 3);
    }
}
