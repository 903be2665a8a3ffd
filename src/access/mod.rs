//! Access control
//!
//! Authorization is a static table from (entity, operation) to a policy,
//! evaluated against the authenticated identity. The predicates are pure
//! and total: an absent identity always denies, nothing panics.
//!
//! A policy can resolve to a filter rather than a flat yes/no:
//! `AccessDecision::OwnedBy(id)` means "only records owned by user `id`".
//! List queries scope themselves with it, item operations compare the
//! record's owner against it. Admin status is evaluated first and
//! short-circuits, so ownership is never consulted for admins.

use crate::schema::{Ownership, SchemaRegistry};
use serde::Serialize;
use std::fmt;

/// The authenticated caller, as authorization sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub is_admin: bool,
}

impl Identity {
    pub fn new(id: i64, is_admin: bool) -> Self {
        Self { id, is_admin }
    }
}

impl From<&crate::models::User> for Identity {
    fn from(user: &crate::models::User) -> Self {
        Self {
            id: user.id,
            is_admin: user.is_admin,
        }
    }
}

/// True iff an identity is present and flagged admin.
pub fn is_admin(identity: Option<&Identity>) -> bool {
    identity.map(|i| i.is_admin).unwrap_or(false)
}

/// True iff an identity is present and owns the record.
///
/// `record_owner` is the owning user ID under the entity's ownership rule,
/// or `None` when the entity has no owner (the predicate then never holds).
pub fn owns_record(identity: Option<&Identity>, record_owner: Option<i64>) -> bool {
    match (identity, record_owner) {
        (Some(i), Some(owner)) => i.id == owner,
        _ => false,
    }
}

/// Admin first, then ownership.
pub fn is_admin_or_owner(identity: Option<&Identity>, record_owner: Option<i64>) -> bool {
    is_admin(identity) || owns_record(identity, record_owner)
}

/// Resolve an entity's ownership rule for one record.
///
/// For `SelfRecord` the record id itself is the owner; for `Field` the
/// caller passes the record's author; for `None` there is no owner.
pub fn record_owner(ownership: Ownership, record_id: i64, author_id: Option<i64>) -> Option<i64> {
    match ownership {
        Ownership::SelfRecord => Some(record_id),
        Ownership::Field(_) => author_id,
        Ownership::None => None,
    }
}

/// The operations the policy table covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Anyone, authenticated or not
    Public,
    /// Admins only
    AdminOnly,
    /// Admins, or the owner of the record in question
    AdminOrOwner,
}

impl Policy {
    /// Evaluate the policy for an identity.
    pub fn evaluate(&self, identity: Option<&Identity>) -> AccessDecision {
        match self {
            Policy::Public => AccessDecision::Allow,
            Policy::AdminOnly => {
                if is_admin(identity) {
                    AccessDecision::Allow
                } else {
                    AccessDecision::Deny
                }
            }
            Policy::AdminOrOwner => {
                if is_admin(identity) {
                    AccessDecision::Allow
                } else {
                    match identity {
                        Some(i) => AccessDecision::OwnedBy(i.id),
                        None => AccessDecision::Deny,
                    }
                }
            }
        }
    }
}

/// The outcome of evaluating a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Proceed on any record
    Allow,
    /// Do not proceed
    Deny,
    /// Proceed only on records owned by this user
    OwnedBy(i64),
}

impl AccessDecision {
    pub fn allows_all(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, AccessDecision::Deny)
    }

    /// Does the decision permit acting on a record with this owner?
    pub fn permits(&self, record_owner: Option<i64>) -> bool {
        match self {
            AccessDecision::Allow => true,
            AccessDecision::Deny => false,
            AccessDecision::OwnedBy(uid) => record_owner == Some(*uid),
        }
    }

    /// The owner filter to apply to a list query, if any.
    pub fn owner_filter(&self) -> Option<i64> {
        match self {
            AccessDecision::OwnedBy(uid) => Some(*uid),
            _ => None,
        }
    }
}

/// Policies of one entity across the four operations.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyRow {
    pub entity: &'static str,
    pub read: Policy,
    pub create: Policy,
    pub update: Policy,
    pub delete: Policy,
}

impl PolicyRow {
    fn policy(&self, operation: Operation) -> Policy {
        match operation {
            Operation::Read => self.read,
            Operation::Create => self.create,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

/// The static (entity, operation) -> policy mapping.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyTable {
    rows: Vec<PolicyRow>,
}

impl PolicyTable {
    pub fn new(rows: Vec<PolicyRow>) -> Self {
        Self { rows }
    }

    /// The content schema's policies: content entities are publicly
    /// readable, mutations are for admins (updates also for owners), and
    /// user records are visible only to admins and the user themselves.
    pub fn cms() -> Self {
        let content = |entity: &'static str| PolicyRow {
            entity,
            read: Policy::Public,
            create: Policy::AdminOnly,
            update: Policy::AdminOrOwner,
            delete: Policy::AdminOnly,
        };
        Self::new(vec![
            PolicyRow {
                entity: "user",
                read: Policy::AdminOrOwner,
                create: Policy::AdminOnly,
                update: Policy::AdminOrOwner,
                delete: Policy::AdminOnly,
            },
            content("post"),
            content("category"),
            content("page"),
            content("menu"),
        ])
    }

    pub fn rows(&self) -> &[PolicyRow] {
        &self.rows
    }

    /// Look up the declared policy. `None` for unknown entities.
    pub fn policy(&self, entity: &str, operation: Operation) -> Option<Policy> {
        self.rows
            .iter()
            .find(|r| r.entity == entity)
            .map(|r| r.policy(operation))
    }

    /// Evaluate the table for a caller. Unknown entities deny, admin or
    /// not: the table is the only source of permission.
    pub fn decide(
        &self,
        entity: &str,
        operation: Operation,
        identity: Option<&Identity>,
    ) -> AccessDecision {
        match self.policy(entity, operation) {
            Some(policy) => policy.evaluate(identity),
            None => AccessDecision::Deny,
        }
    }

    /// Every registry entity must have a policy row, and every row must
    /// name a registry entity. Checked once at startup.
    pub fn verify_covers(&self, registry: &SchemaRegistry) -> anyhow::Result<()> {
        for entity in registry.entities() {
            if !self.rows.iter().any(|r| r.entity == entity.name) {
                anyhow::bail!("No access policy declared for entity '{}'", entity.name);
            }
        }
        for row in &self.rows {
            if registry.entity(row.entity).is_none() {
                anyhow::bail!("Access policy declared for unknown entity '{}'", row.entity);
            }
        }
        Ok(())
    }
}
