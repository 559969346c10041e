//! Role hierarchy, assignment scopes and ledger entries.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use emociograma_core::{AppError, AppResult, NonEmptyString, OrganizationId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a role definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Built-in roles ordered by hierarchy level (lower is more privileged).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    /// Platform operator with unrestricted access.
    SuperAdmin,
    /// Organization administrator.
    Admin,
    /// Team or department manager.
    Manager,
    /// Ordinary member submitting check-ins.
    Contributor,
}

impl SystemRole {
    /// Returns the stable role name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Contributor => "contributor",
        }
    }

    /// Returns the hierarchy level of the role.
    #[must_use]
    pub fn hierarchy_level(&self) -> i32 {
        match self {
            Self::SuperAdmin => 0,
            Self::Admin => 100,
            Self::Manager => 200,
            Self::Contributor => 300,
        }
    }

    /// Returns all built-in roles, most privileged first.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[SystemRole] = &[
            SystemRole::SuperAdmin,
            SystemRole::Admin,
            SystemRole::Manager,
            SystemRole::Contributor,
        ];

        ALL
    }

    /// Roles entitled to receive alert notifications for their organization.
    #[must_use]
    pub fn manager_tier() -> &'static [Self] {
        const MANAGER_TIER: &[SystemRole] = &[SystemRole::Admin, SystemRole::Manager];

        MANAGER_TIER
    }
}

impl FromStr for SystemRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "contributor" => Ok(Self::Contributor),
            _ => Err(AppError::Validation(format!("unknown system role '{value}'"))),
        }
    }
}

/// Scope qualifying a role or an assignment.
///
/// `Global` is a real, comparable value: the same role may be held once
/// globally and once per organization without the scopes overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "organization_id", rename_all = "snake_case")]
pub enum Scope {
    /// Not bound to any organization.
    Global,
    /// Bound to one organization.
    Organization(OrganizationId),
}

impl Scope {
    /// Returns the bound organization, if any.
    #[must_use]
    pub fn organization_id(&self) -> Option<OrganizationId> {
        match self {
            Self::Global => None,
            Self::Organization(organization_id) => Some(*organization_id),
        }
    }

    /// Returns whether the scope is global.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

impl From<Option<OrganizationId>> for Scope {
    fn from(value: Option<OrganizationId>) -> Self {
        value.map_or(Self::Global, Self::Organization)
    }
}

impl Display for Scope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(formatter, "global"),
            Self::Organization(organization_id) => {
                write!(formatter, "organization:{organization_id}")
            }
        }
    }
}

/// Role definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    id: RoleId,
    name: NonEmptyString,
    description: Option<String>,
    scope: Scope,
    hierarchy_level: i32,
    is_system_role: bool,
}

impl Role {
    /// Creates a validated role definition.
    pub fn new(
        id: RoleId,
        name: impl Into<String>,
        description: Option<String>,
        scope: Scope,
        hierarchy_level: i32,
        is_system_role: bool,
    ) -> AppResult<Self> {
        if hierarchy_level < 0 {
            return Err(AppError::Validation(format!(
                "role hierarchy level must not be negative, got {hierarchy_level}"
            )));
        }

        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            description,
            scope,
            hierarchy_level,
            is_system_role,
        })
    }

    /// Builds the global definition of a built-in role.
    pub fn system(id: RoleId, role: SystemRole) -> AppResult<Self> {
        Self::new(
            id,
            role.as_str(),
            None,
            Scope::Global,
            role.hierarchy_level(),
            true,
        )
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the role scope.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the hierarchy level.
    #[must_use]
    pub fn hierarchy_level(&self) -> i32 {
        self.hierarchy_level
    }

    /// Returns whether the role is system managed.
    #[must_use]
    pub fn is_system_role(&self) -> bool {
        self.is_system_role
    }

    /// A role is global when it is system managed and unbound to an organization.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.is_system_role && self.scope.is_global()
    }

    /// Strict comparison of hierarchy levels.
    #[must_use]
    pub fn has_higher_privilege_than(&self, other: &Self) -> bool {
        self.hierarchy_level < other.hierarchy_level
    }

    /// Returns whether this role is at least as privileged as a built-in role.
    #[must_use]
    pub fn satisfies(&self, minimum: SystemRole) -> bool {
        self.hierarchy_level <= minimum.hierarchy_level()
    }

    /// Returns the built-in role this definition corresponds to, if any.
    #[must_use]
    pub fn system_role(&self) -> Option<SystemRole> {
        if !self.is_system_role {
            return None;
        }

        SystemRole::from_str(self.name.as_str()).ok()
    }
}

/// Ledger entry recording that a user holds a role in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Assigned user.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: RoleId,
    /// Assignment scope.
    pub scope: Scope,
    /// User that performed the assignment.
    pub assigned_by: Option<UserId>,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
}
