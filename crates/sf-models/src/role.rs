//! Roles and the permissions they grant
//!
//! Roles are fixed; each one maps to a static permission set. Contracts check
//! permissions, never role names, with the one exception of the discount
//! decision which only the CEO role grants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;

/// Permission names checked by contracts
pub mod permissions {
    pub const VIEW_PIPELINE: &str = "view_pipeline";
    pub const ADD_PROJECTS: &str = "add_projects";
    pub const EDIT_PROJECTS: &str = "edit_projects";
    pub const MOVE_PROJECTS: &str = "move_projects";
    pub const DELETE_PROJECTS: &str = "delete_projects";
    pub const MARK_LOST: &str = "mark_lost";

    pub const REQUEST_ESTIMATIONS: &str = "request_estimations";
    pub const EDIT_ESTIMATIONS: &str = "edit_estimations";

    pub const REQUEST_DISCOUNTS: &str = "request_discounts";
    pub const DECIDE_DISCOUNTS: &str = "decide_discounts";
    pub const MANAGE_POLICIES: &str = "manage_policies";

    pub const GENERATE_QUOTATIONS: &str = "generate_quotations";
    pub const CREATE_SALES_ORDERS: &str = "create_sales_orders";
    pub const VIEW_SALES_ORDERS: &str = "view_sales_orders";

    pub const MANAGE_USERS: &str = "manage_users";
}

use permissions::*;

const SALES_PERMISSIONS: &[&str] = &[
    VIEW_PIPELINE,
    ADD_PROJECTS,
    EDIT_PROJECTS,
    MOVE_PROJECTS,
    MARK_LOST,
    REQUEST_ESTIMATIONS,
    REQUEST_DISCOUNTS,
    GENERATE_QUOTATIONS,
    CREATE_SALES_ORDERS,
    VIEW_SALES_ORDERS,
];

const SALES_MANAGER_PERMISSIONS: &[&str] = &[
    VIEW_PIPELINE,
    ADD_PROJECTS,
    EDIT_PROJECTS,
    MOVE_PROJECTS,
    DELETE_PROJECTS,
    MARK_LOST,
    REQUEST_ESTIMATIONS,
    REQUEST_DISCOUNTS,
    GENERATE_QUOTATIONS,
    CREATE_SALES_ORDERS,
    VIEW_SALES_ORDERS,
];

const ENGINEERING_PERMISSIONS: &[&str] = &[VIEW_PIPELINE, EDIT_ESTIMATIONS];

const CEO_PERMISSIONS: &[&str] = &[
    VIEW_PIPELINE,
    DECIDE_DISCOUNTS,
    MANAGE_POLICIES,
    VIEW_SALES_ORDERS,
];

const FINANCE_PERMISSIONS: &[&str] = &[VIEW_PIPELINE, VIEW_SALES_ORDERS];

// Administration does not include deciding discounts.
const ADMIN_PERMISSIONS: &[&str] = &[
    VIEW_PIPELINE,
    ADD_PROJECTS,
    EDIT_PROJECTS,
    MOVE_PROJECTS,
    DELETE_PROJECTS,
    MARK_LOST,
    REQUEST_ESTIMATIONS,
    EDIT_ESTIMATIONS,
    REQUEST_DISCOUNTS,
    MANAGE_POLICIES,
    GENERATE_QUOTATIONS,
    CREATE_SALES_ORDERS,
    VIEW_SALES_ORDERS,
    MANAGE_USERS,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Sales,
    SalesManager,
    Engineering,
    Ceo,
    Finance,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Sales,
        Role::SalesManager,
        Role::Engineering,
        Role::Ceo,
        Role::Finance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Sales => "SALES",
            Role::SalesManager => "SALES_MANAGER",
            Role::Engineering => "ENGINEERING",
            Role::Ceo => "CEO",
            Role::Finance => "FINANCE",
        }
    }

    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            Role::Admin => ADMIN_PERMISSIONS,
            Role::Sales => SALES_PERMISSIONS,
            Role::SalesManager => SALES_MANAGER_PERMISSIONS,
            Role::Engineering => ENGINEERING_PERMISSIONS,
            Role::Ceo => CEO_PERMISSIONS,
            Role::Finance => FINANCE_PERMISSIONS,
        }
    }

    pub fn grants(&self, permission: &str) -> bool {
        self.permissions().contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "role",
                value: s.to_string(),
            })
    }
}
