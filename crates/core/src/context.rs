//! Caller context
//!
//! The identity token every operation receives first. The conductor never
//! inspects it beyond forwarding it to the store; the store may use it for
//! row-level scoping (project ownership, visibility of deleted rows).

use serde::{Deserialize, Serialize};

/// Whether lookups see soft-deleted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadDeleted {
    /// Only live rows
    #[default]
    No,
    /// Live and deleted rows
    Yes,
    /// Only deleted rows
    Only,
}

/// Resolved caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Calling user
    pub user_id: String,
    /// Project the user is acting in; scopes instance visibility
    pub project_id: String,
    /// Administrative privilege; lifts project scoping
    #[serde(default)]
    pub is_admin: bool,
    /// Deleted-row visibility
    #[serde(default)]
    pub read_deleted: ReadDeleted,
    /// Correlation id of the originating request
    #[serde(default)]
    pub request_id: String,
}

impl RequestContext {
    /// Create a non-admin context for a user in a project.
    pub fn new(user_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            project_id: project_id.into(),
            is_admin: false,
            read_deleted: ReadDeleted::No,
            request_id: String::new(),
        }
    }

    /// An administrative context, as used by internal services.
    pub fn admin() -> Self {
        Self {
            is_admin: true,
            ..Self::new("admin", "admin")
        }
    }

    /// Attach a request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// A copy of this context with administrative privilege.
    ///
    /// The original is left untouched.
    pub fn elevated(&self) -> Self {
        Self {
            is_admin: true,
            ..self.clone()
        }
    }
}
