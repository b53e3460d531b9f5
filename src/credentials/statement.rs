//! Statements supplied by the control plane

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Statement lists attached to a role.
///
/// Only the first creation statement is interpreted; the others are accepted
/// for interface compatibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statements {
    /// Creation statements
    pub creation: Vec<String>,
    /// Revocation statements
    pub revocation: Vec<String>,
    /// Rollback statements
    pub rollback: Vec<String>,
    /// Renewal statements
    pub renewal: Vec<String>,

    /// Single-string creation statement from older control planes
    #[serde(skip_serializing_if = "String::is_empty")]
    pub creation_statements: String,
    /// Single-string revocation statement from older control planes
    #[serde(skip_serializing_if = "String::is_empty")]
    pub revocation_statements: String,
    /// Single-string rollback statement from older control planes
    #[serde(skip_serializing_if = "String::is_empty")]
    pub rollback_statements: String,
    /// Single-string renewal statement from older control planes
    #[serde(skip_serializing_if = "String::is_empty")]
    pub renew_statements: String,
}

impl Statements {
    /// Create statements with just a creation list
    pub fn with_creation(creation: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            creation: creation.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Fold the legacy single-string fields into the lists.
    ///
    /// A non-empty legacy field replaces the corresponding list.
    pub fn normalized(mut self) -> Self {
        fn fold(legacy: &mut String, list: &mut Vec<String>) {
            if !legacy.is_empty() {
                *list = vec![std::mem::take(legacy)];
            }
        }

        fold(&mut self.creation_statements, &mut self.creation);
        fold(&mut self.revocation_statements, &mut self.revocation);
        fold(&mut self.rollback_statements, &mut self.rollback);
        fold(&mut self.renew_statements, &mut self.renewal);
        self
    }
}

/// Parsed creation statement: `{"roles": ["read", "user-admin"]}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreationStatement {
    /// Roles granted to the new user
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

impl CreationStatement {
    /// Parse the first creation statement.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyCreationStatement`] when there is no creation statement
    /// - [`Error::MalformedStatement`] when it is not valid JSON of the expected shape
    /// - [`Error::RolesRequired`] when it grants no roles
    pub fn parse(statements: &Statements) -> Result<Vec<String>> {
        let first = statements
            .creation
            .first()
            .ok_or(Error::EmptyCreationStatement)?;

        let statement: CreationStatement =
            serde_json::from_str(first).map_err(Error::MalformedStatement)?;

        match statement.roles {
            Some(roles) if !roles.is_empty() => Ok(roles),
            _ => Err(Error::RolesRequired),
        }
    }
}
