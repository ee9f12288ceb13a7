//! Navigation menu filtered by role.

use serde::Serialize;

use crate::models::{ResolverState, Role};

/// Lowest role that may see a menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MinimumRole {
    Any,
    Admin,
}

impl MinimumRole {
    fn admits(self, role: Role) -> bool {
        match self {
            Self::Any => true,
            Self::Admin => role.is_admin(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub icon: &'static str,
    pub label: &'static str,
    pub path: &'static str,
    pub minimum_role: MinimumRole,
}

const fn item(
    icon: &'static str,
    label: &'static str,
    path: &'static str,
    minimum_role: MinimumRole,
) -> MenuItem {
    MenuItem {
        icon,
        label,
        path,
        minimum_role,
    }
}

/// Items every resolved role sees.
pub const BASE_ITEMS: &[MenuItem] = &[
    item("layout-dashboard", "Dashboard", "/dashboard", MinimumRole::Any),
    item("building", "Properties", "/properties", MinimumRole::Any),
    item("users", "Clients", "/clients", MinimumRole::Any),
    item("receipt", "Sales", "/sales", MinimumRole::Any),
    item("message-square", "Messages", "/messages", MinimumRole::Any),
];

/// Items appended for admins only.
pub const ADMIN_ITEMS: &[MenuItem] = &[
    item("wallet", "Expenses", "/expenses", MinimumRole::Admin),
    item("id-card", "Employees", "/employees", MinimumRole::Admin),
    item("settings", "Settings", "/settings", MinimumRole::Admin),
];

/// Builds the visible menu from static items and the resolver state.
#[derive(Debug, Clone)]
pub struct MenuBuilder {
    items: Vec<MenuItem>,
}

impl Default for MenuBuilder {
    fn default() -> Self {
        Self::new(BASE_ITEMS.iter().chain(ADMIN_ITEMS).cloned().collect())
    }
}

impl MenuBuilder {
    #[must_use]
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self { items }
    }

    /// Visible items: the base set in configured order, then the admin set
    /// when the resolved role is admin. While loading or on error only the
    /// base set is returned.
    #[must_use]
    pub fn build(&self, state: &ResolverState) -> Vec<MenuItem> {
        let base = self
            .items
            .iter()
            .filter(|i| i.minimum_role == MinimumRole::Any);

        match state.role() {
            Some(role) if role.is_admin() => base
                .chain(
                    self.items
                        .iter()
                        .filter(|i| i.minimum_role != MinimumRole::Any && i.minimum_role.admits(role)),
                )
                .cloned()
                .collect(),
            Some(_) | None => base.cloned().collect(),
        }
    }
}
