//! Capability-gated authorization shared by every order-facing operation.
//!
//! Each handler runs the same pipeline: resolve the caller's role from the
//! user store, then check one capability against the target order. Ownership
//! grants read access only; mutation always requires an elevated role.

use crate::errors::ServiceError;
use uuid::Uuid;

/// Role classification read from the user store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleClass {
    Admin,
    Staff,
    Customer,
}

impl RoleClass {
    /// Classifies a stored role value. Comparison is case-insensitive and
    /// only the literal values `staff` and `admin` grant elevated access;
    /// anything else (including empty or missing) is an ordinary customer.
    pub fn from_role(role: Option<&str>) -> Self {
        match role.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("admin") => RoleClass::Admin,
            Some("staff") => RoleClass::Staff,
            _ => RoleClass::Customer,
        }
    }

    pub fn is_elevated(self) -> bool {
        matches!(self, RoleClass::Admin | RoleClass::Staff)
    }
}

/// Read access to an order: the owner or an elevated role.
pub fn ensure_can_view(
    role: RoleClass,
    caller_id: Uuid,
    owner_id: Uuid,
) -> Result<(), ServiceError> {
    if role.is_elevated() || caller_id == owner_id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "You do not have access to this order".to_string(),
        ))
    }
}

/// Mutation of an order (status change, deletion): elevated roles only.
/// Ownership is never sufficient.
pub fn ensure_can_mutate(role: RoleClass) -> Result<(), ServiceError> {
    if role.is_elevated() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Staff or admin role required".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_classification_is_case_insensitive() {
        assert_eq!(RoleClass::from_role(Some("Staff")), RoleClass::Staff);
        assert_eq!(RoleClass::from_role(Some("ADMIN")), RoleClass::Admin);
        assert_eq!(RoleClass::from_role(Some("aDmIn")), RoleClass::Admin);
    }

    #[test]
    fn unknown_roles_are_customers() {
        assert_eq!(RoleClass::from_role(None), RoleClass::Customer);
        assert_eq!(RoleClass::from_role(Some("")), RoleClass::Customer);
        assert_eq!(RoleClass::from_role(Some("manager")), RoleClass::Customer);
        assert_eq!(RoleClass::from_role(Some("  ")), RoleClass::Customer);
    }

    #[test]
    fn owner_may_view_but_not_mutate() {
        let caller = Uuid::new_v4();

        assert!(ensure_can_view(RoleClass::Customer, caller, caller).is_ok());
        assert!(ensure_can_mutate(RoleClass::Customer).is_err());
    }

    #[test]
    fn stranger_may_not_view() {
        let caller = Uuid::new_v4();
        let owner = Uuid::new_v4();

        assert!(ensure_can_view(RoleClass::Customer, caller, owner).is_err());
    }

    #[test]
    fn staff_and_admin_may_do_everything() {
        let caller = Uuid::new_v4();
        let owner = Uuid::new_v4();

        for role in [RoleClass::Staff, RoleClass::Admin] {
            assert!(ensure_can_view(role, caller, owner).is_ok());
            assert!(ensure_can_mutate(role).is_ok());
        }
    }
}
