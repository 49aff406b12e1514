use serde::{Deserialize, Serialize};

/// User roles. Fixed at registration (STUDENT by default), mutable only by
/// admin tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Student,
    Security,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Security => "security",
            Role::Admin => "admin",
        }
    }

    /// Static permission set for this role. Permissions are `action:scope`
    /// strings; `*` after the colon is a category wildcard.
    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            Role::Student => &["read:own_devices", "write:own_devices", "read:own_access"],
            Role::Security => &[
                "read:own_devices",
                "write:own_devices",
                "read:own_access",
                "read:all_access",
                "scan:qr_codes",
            ],
            Role::Admin => &[
                "read:*",
                "write:*",
                "delete:*",
                "manage:users",
                "manage:webhooks",
            ],
        }
    }
}

/// Pure permission check. Admin satisfies every permission regardless of its
/// explicit set. Succeeds on an exact match, a `category:*` wildcard, or `*`.
pub fn has_permission(role: Role, permission: &str) -> bool {
    if role == Role::Admin {
        return true;
    }

    let permissions = role.permissions();

    if permissions.contains(&permission) {
        return true;
    }

    let category = permission.split(':').next().unwrap_or(permission);
    let category_wildcard = format!("{}:*", category);
    if permissions.iter().any(|p| *p == category_wildcard) {
        return true;
    }

    permissions.contains(&"*")
}

/// Security and admin see every access record; students only their own.
pub fn can_view_all_access(role: Role) -> bool {
    matches!(role, Role::Security | Role::Admin)
}
