//! Who is calling, and what their role allows.
//!
//! Token parsing happens upstream; use-cases only see an [`Actor`].

use gunpla_core::{has_access, RoleBits, ValidationError};

use crate::config::ShopConfig;

/// The authenticated caller of a use-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    /// 1-based position in the role list.
    pub role_id: u32,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role_id: u32) -> Self {
        Actor {
            user_id: user_id.into(),
            role_id,
        }
    }
}

/// Role policy for one role list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    role_count: u32,
    admin: RoleBits,
}

impl AccessPolicy {
    pub fn new(role_count: u32, admin_role_id: u32) -> Result<Self, ValidationError> {
        Ok(AccessPolicy {
            role_count,
            admin: RoleBits::for_role(admin_role_id, role_count)?,
        })
    }

    pub fn from_config(config: &ShopConfig) -> Result<Self, ValidationError> {
        Self::new(config.role_count, config.admin_role_id)
    }

    /// The caller's role as a mask over this role list.
    pub fn bits_for(&self, actor: &Actor) -> Result<RoleBits, ValidationError> {
        RoleBits::for_role(actor.role_id, self.role_count)
    }

    /// True when the actor holds the admin role. Unknown role ids never do.
    pub fn is_privileged(&self, actor: &Actor) -> bool {
        self.bits_for(actor)
            .map(|bits| has_access(&bits, &self.admin))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_admin_is_privileged() {
        let policy = AccessPolicy::new(2, 2).unwrap();
        assert!(policy.is_privileged(&Actor::new("admin", 2)));
        assert!(!policy.is_privileged(&Actor::new("customer", 1)));
    }

    #[test]
    fn test_unknown_role_is_not_privileged() {
        let policy = AccessPolicy::new(3, 3).unwrap();
        assert!(!policy.is_privileged(&Actor::new("ghost", 0)));
        assert!(!policy.is_privileged(&Actor::new("ghost", 9)));
        assert!(policy.bits_for(&Actor::new("ghost", 9)).is_err());
    }

    #[test]
    fn test_admin_role_outside_list_rejected() {
        assert!(AccessPolicy::new(2, 3).is_err());
    }
}
