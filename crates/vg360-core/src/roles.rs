use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "lider")]
    Leader,
    #[serde(rename = "administrativo")]
    Administrator,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Leader => "lider",
            Role::Administrator => "administrativo",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lider" => Ok(Role::Leader),
            "administrativo" => Ok(Role::Administrator),
            other => Err(CoreError::InvalidRole(other.to_string())),
        }
    }
}

/// The authenticated caller, resolved once per request.
///
/// Superusers are always administrators, whatever their stored role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Viewer {
    Leader { user_id: i64, cedula: String },
    Administrator { user_id: i64, cedula: String },
}

impl Viewer {
    #[must_use]
    pub fn new(user_id: i64, cedula: String, role: Role, is_superuser: bool) -> Self {
        if is_superuser || role == Role::Administrator {
            Viewer::Administrator { user_id, cedula }
        } else {
            Viewer::Leader { user_id, cedula }
        }
    }

    #[must_use]
    pub fn user_id(&self) -> i64 {
        match self {
            Viewer::Leader { user_id, .. } | Viewer::Administrator { user_id, .. } => *user_id,
        }
    }

    #[must_use]
    pub fn cedula(&self) -> &str {
        match self {
            Viewer::Leader { cedula, .. } | Viewer::Administrator { cedula, .. } => cedula,
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Viewer::Leader { .. } => Role::Leader,
            Viewer::Administrator { .. } => Role::Administrator,
        }
    }

    /// Landing path for this viewer; role-mismatched requests are sent here.
    #[must_use]
    pub fn default_view(&self) -> &'static str {
        match self {
            Viewer::Leader { .. } => "/api/v1/leader/dashboard",
            Viewer::Administrator { .. } => "/api/v1/admin/leaders",
        }
    }
}
