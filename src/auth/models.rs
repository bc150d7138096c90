use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Staff roles, ordered from least to most privileged.
///
/// Each role carries an explicit capability set; business services never
/// inspect role names directly, they ask for a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Cashier,
    Manager,
    Admin,
    SuperAdmin,
}

/// Discrete capabilities granted to roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Create and mutate draft orders, take payments.
    SellOrders,
    /// Create VOID reversal orders for same-day paid sales.
    VoidOrders,
    /// Process refunds against successful payments.
    RefundPayments,
}

/// How much of the data set a role is allowed to see in list/read operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only records the actor created (cashier).
    Own,
    /// All records of the actor's store (manager).
    Store,
    /// All records of the actor's company (admin).
    Company,
    /// Everything (super admin).
    All,
}

impl Role {
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Cashier => &[Permission::SellOrders],
            Role::Manager | Role::Admin | Role::SuperAdmin => &[
                Permission::SellOrders,
                Permission::VoidOrders,
                Permission::RefundPayments,
            ],
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Role::Cashier => Visibility::Own,
            Role::Manager => Visibility::Store,
            Role::Admin => Visibility::Company,
            Role::SuperAdmin => Visibility::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Cashier => "CASHIER",
            Role::Manager => "MANAGER",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JWT claims issued by the identity service (token issuance is external).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub company_id: Uuid,
    pub store_id: Option<Uuid>,
    pub role: Role,
    pub exp: usize,
}

/// Pre-authorized actor context handed to the business services.
///
/// Built once at the HTTP boundary from validated claims; services trust it
/// and only consult the role's capability set.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub email: String,
    pub company_id: Uuid,
    pub store_id: Option<Uuid>,
    pub role: Role,
}

impl ActorContext {
    pub fn can(&self, permission: Permission) -> bool {
        self.role.can(permission)
    }

    pub fn visibility(&self) -> Visibility {
        self.role.visibility()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cashier_cannot_void() {
        assert!(!Role::Cashier.can(Permission::VoidOrders));
        assert!(Role::Cashier.can(Permission::SellOrders));
    }

    #[test]
    fn test_manager_and_above_can_void() {
        assert!(Role::Manager.can(Permission::VoidOrders));
        assert!(Role::Admin.can(Permission::VoidOrders));
        assert!(Role::SuperAdmin.can(Permission::VoidOrders));
    }

    #[test]
    fn test_visibility_widens_with_role() {
        assert_eq!(Role::Cashier.visibility(), Visibility::Own);
        assert_eq!(Role::Manager.visibility(), Visibility::Store);
        assert_eq!(Role::Admin.visibility(), Visibility::Company);
        assert_eq!(Role::SuperAdmin.visibility(), Visibility::All);
    }

    #[test]
    fn test_role_serde_matches_token_format() {
        let role: Role = serde_json::from_str("\"SUPER_ADMIN\"").unwrap();
        assert_eq!(role, Role::SuperAdmin);
        assert_eq!(serde_json::to_string(&Role::Cashier).unwrap(), "\"CASHIER\"");
    }
}
