//! Access policy for competitive dialogue tenders
//!
//! Everything here is a pure function of the entity snapshot it is handed:
//! role resolution, field projection, ACL derivation and validation hold no
//! state of their own and are recomputed on every request.

pub mod accept;
pub mod acl;
pub mod projection;
pub mod resolve;
pub mod rules;
pub mod tables;
pub mod validation;
pub mod variant;

pub use acl::{derive_acl, AclEntry, Permission, Principal};
pub use projection::{
    lot_fields, privileged_view_fields, project_fields, tender_fields, to_fields, view_fields,
    Fields, RESTRICTED_VIEW,
};
pub use resolve::{resolve_role, view_role_key, ActorType};
pub use rules::{Direction, EntityKind, Rule, RoleTable};
pub use validation::ValidationError;
pub use variant::{MinimalStepPolicy, Variant, VariantPolicy};

use thiserror::Error;

/// Configuration defects in the policy tables.
///
/// These are never the caller's fault and are not recoverable per request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("role '{role}' is not declared in the {table} role table")]
    UnknownRole { table: EntityKind, role: String },

    #[error("status '{status}' is not declared for {variant}")]
    UndeclaredStatus { variant: Variant, status: String },

    #[error("{variant} {table} table is missing roles: {missing:?}")]
    MissingRoleEntries {
        variant: Variant,
        table: EntityKind,
        missing: Vec<String>,
    },

    #[error("{table} role table has no '{role}' entry to restrict")]
    UndeclaredRestriction { table: EntityKind, role: String },

    #[error("entity does not serialize to a field map: {0}")]
    Unserializable(String),
}

/// Check every variant's tables are complete for its declared statuses.
pub fn check_all() -> Result<(), PolicyError> {
    for variant in Variant::ALL {
        variant.policy().check()?;
    }
    tracing::info!(variants = Variant::ALL.len(), "Policy tables checked");
    Ok(())
}
