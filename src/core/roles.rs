use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{AppError, Result};

/// Closed set of user roles. All authorization decisions go through the
/// check methods below rather than ad-hoc string comparisons in handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Staff,
    BranchManager,
    Admin,
}

impl Role {
    /// Staff and above act on behalf of the salon
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Staff | Role::BranchManager | Role::Admin)
    }

    /// A booking may be cancelled by its owning customer or by salon staff.
    pub fn can_cancel_booking(&self, is_owner: bool) -> bool {
        is_owner || self.is_staff()
    }

    /// Completing a booking (and confirming cash payment) is staff-only.
    pub fn can_complete_booking(&self) -> bool {
        self.is_staff()
    }

    pub fn can_confirm_cash_payment(&self) -> bool {
        self.is_staff()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::Staff => write!(f, "staff"),
            Role::BranchManager => write!(f, "branch_manager"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "customer" => Ok(Role::Customer),
            "staff" => Ok(Role::Staff),
            "branch_manager" => Ok(Role::BranchManager),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::Unauthorized(format!("Unknown role: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_cancel_authorization() {
        // Owner may always cancel their own booking
        assert!(Role::Customer.can_cancel_booking(true));
        // A different customer may not
        assert!(!Role::Customer.can_cancel_booking(false));
        // Staff roles may cancel any booking
        assert!(Role::Staff.can_cancel_booking(false));
        assert!(Role::BranchManager.can_cancel_booking(false));
        assert!(Role::Admin.can_cancel_booking(false));
    }

    #[test]
    fn test_complete_is_privileged() {
        assert!(!Role::Customer.can_complete_booking());
        assert!(Role::Staff.can_complete_booking());
        assert!(Role::Admin.can_confirm_cash_payment());
        assert!(!Role::Customer.can_confirm_cash_payment());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Customer, Role::Staff, Role::BranchManager, Role::Admin] {
            assert_eq!(Role::from_str(&role.to_string()).unwrap(), role);
        }
        assert!(Role::from_str("superuser").is_err());
    }
}
