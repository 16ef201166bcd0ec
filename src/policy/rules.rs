//! Field-visibility rules and role tables
//!
//! A [`Rule`] decides whether a field name passes. Rules compose by
//! conjunction, so stacked deny-sets behave as one deny-set over the union
//! and a deny-set after an allow-set narrows what the allow-set let through.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::PolicyError;

/// Field filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Only listed fields pass
    Allow(BTreeSet<String>),
    /// Every field except the listed ones passes
    Deny(BTreeSet<String>),
    /// Both rules must let the field pass
    Compose(Box<Rule>, Box<Rule>),
}

impl Rule {
    pub fn allow<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Allow(fields.into_iter().map(Into::into).collect())
    }

    pub fn deny<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Deny(fields.into_iter().map(Into::into).collect())
    }

    /// An allow-set with nothing in it
    pub fn nothing() -> Self {
        Self::Allow(BTreeSet::new())
    }

    /// Stack `other` on top of `self`
    pub fn and(self, other: Rule) -> Self {
        Self::Compose(Box::new(self), Box::new(other))
    }

    /// Whether `field` passes this rule
    pub fn permits(&self, field: &str) -> bool {
        match self {
            Self::Allow(fields) => fields.contains(field),
            Self::Deny(fields) => !fields.contains(field),
            Self::Compose(first, second) => first.permits(field) && second.permits(field),
        }
    }

    /// Collapse the rule into a single allow- or deny-set.
    ///
    /// Two rules with equal normal forms filter every field set identically.
    pub fn normalize(&self) -> Rule {
        match self.flatten() {
            (true, fields) => Self::Allow(fields),
            (false, fields) => Self::Deny(fields),
        }
    }

    // (is_allow, fields)
    fn flatten(&self) -> (bool, BTreeSet<String>) {
        match self {
            Self::Allow(fields) => (true, fields.clone()),
            Self::Deny(fields) => (false, fields.clone()),
            Self::Compose(first, second) => match (first.flatten(), second.flatten()) {
                ((true, a), (true, b)) => (true, a.intersection(&b).cloned().collect()),
                ((false, a), (false, b)) => (false, a.union(&b).cloned().collect()),
                ((true, a), (false, d)) | ((false, d), (true, a)) => {
                    (true, a.difference(&d).cloned().collect())
                }
            },
        }
    }
}

/// Direction of a projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Serialize for a response
    Output,
    /// Accept from a request body
    Input,
}

/// Which entity a role table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Tender,
    Bid,
    Lot,
    Document,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Tender => write!(f, "tender"),
            EntityKind::Bid => write!(f, "bid"),
            EntityKind::Lot => write!(f, "lot"),
            EntityKind::Document => write!(f, "document"),
        }
    }
}

/// Role key → rule mapping for one entity kind
#[derive(Debug, Clone)]
pub struct RoleTable {
    kind: EntityKind,
    fallback: &'static str,
    rules: BTreeMap<String, Rule>,
}

impl RoleTable {
    /// Empty table. `fallback` names the entry used by [`RoleTable::get_or_fallback`].
    pub fn new(kind: EntityKind, fallback: &'static str) -> Self {
        Self {
            kind,
            fallback,
            rules: BTreeMap::new(),
        }
    }

    pub fn with(mut self, role: impl Into<String>, rule: Rule) -> Self {
        self.rules.insert(role.into(), rule);
        self
    }

    /// Inherit every entry of `base`, then apply `overrides` in order.
    pub fn inherit<I, S>(base: &RoleTable, overrides: I) -> Self
    where
        I: IntoIterator<Item = (S, Rule)>,
        S: Into<String>,
    {
        let mut table = base.clone();
        for (role, rule) in overrides {
            table.rules.insert(role.into(), rule);
        }
        table
    }

    /// Narrow an existing entry with a further rule. The entry must exist.
    pub fn restrict(mut self, role: &str, rule: Rule) -> Result<Self, PolicyError> {
        let existing = self
            .rules
            .remove(role)
            .ok_or_else(|| PolicyError::UndeclaredRestriction {
                table: self.kind,
                role: role.to_string(),
            })?;
        self.rules.insert(role.to_string(), existing.and(rule));
        Ok(self)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn contains(&self, role: &str) -> bool {
        self.rules.contains_key(role)
    }

    /// `role` itself when declared, otherwise the fallback key
    pub fn declared_or_fallback<'a>(&self, role: &'a str) -> &'a str {
        if self.contains(role) {
            role
        } else {
            self.fallback
        }
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Exact lookup; an unknown key is a configuration error.
    pub fn get(&self, role: &str) -> Result<&Rule, PolicyError> {
        self.rules.get(role).ok_or_else(|| PolicyError::UnknownRole {
            table: self.kind,
            role: role.to_string(),
        })
    }

    /// Lookup falling back to the table's fallback entry
    pub fn get_or_fallback(&self, role: &str) -> Result<&Rule, PolicyError> {
        match self.rules.get(role) {
            Some(rule) => Ok(rule),
            None => self.get(self.fallback),
        }
    }
}
