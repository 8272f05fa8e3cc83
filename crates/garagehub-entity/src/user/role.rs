//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Staff roles in the GarageHub system.
///
/// Roles are ordered by privilege level: Admin > Manager > Advisor > Mechanic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full system administrator.
    Admin,
    /// Shop manager: staff, schedules, reports.
    Manager,
    /// Service advisor: bookings, estimates, customer contact.
    Advisor,
    /// Mechanic: assigned jobs and work logs.
    Mechanic,
}

impl UserRole {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Admin => 4,
            Self::Manager => 3,
            Self::Advisor => 2,
            Self::Mechanic => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &UserRole) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Advisor => "advisor",
            Self::Mechanic => "mechanic",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = garagehub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "advisor" => Ok(Self::Advisor),
            "mechanic" => Ok(Self::Mechanic),
            _ => Err(garagehub_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: admin, manager, advisor, mechanic"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_ordering() {
        assert!(UserRole::Admin.has_at_least(&UserRole::Mechanic));
        assert!(UserRole::Admin.has_at_least(&UserRole::Admin));
        assert!(UserRole::Manager.has_at_least(&UserRole::Advisor));
        assert!(!UserRole::Mechanic.has_at_least(&UserRole::Advisor));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("MECHANIC".parse::<UserRole>().unwrap(), UserRole::Mechanic);
        assert!("invalid".parse::<UserRole>().is_err());
    }
}
