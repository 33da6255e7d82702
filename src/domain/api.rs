//! Operations attached to entities: searches, custom endpoints, security.

use serde::Serialize;

use super::{Field, FieldKind, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Accepts `POST`, `post` and qualified constants like `RequestMethod.POST`.
    pub fn from_str(s: &str) -> Option<Self> {
        match crate::source::simple_name(s).to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameterized query on an entity collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Search {
    pub name: String,
    pub parameters: Vec<Field>,
    pub list: bool,
    pub paging: bool,
    pub return_type: TypeId,
    pub in_repo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_roles: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEndpoint {
    pub base_uri: String,
    pub name: String,
    pub url: String,
    pub parent_type: TypeId,
    pub method: HttpMethod,
    pub path_variables: Vec<Field>,
    pub request_params: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Field>,
    pub list: bool,
    pub paging: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<FieldKind>,
    pub can_receive_projection: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_roles: Option<Vec<String>>,
}

/// Roles required for one operation on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySecurity {
    pub operation: String,
    pub roles: Vec<String>,
}

impl EntitySecurity {
    pub fn new(operation: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            operation: operation.into(),
            roles,
        }
    }
}

/// Roles named by a `PreAuthorize` expression such as `hasAnyRole('A', "B")`.
pub fn parse_roles(expression: &str) -> Vec<String> {
    let Some((_, rest)) = expression.split_once('(') else {
        return Vec::new();
    };
    let inner = rest.split(')').next().unwrap_or(rest);
    inner
        .split(',')
        .map(|role| role.trim().trim_matches(|c| c == '\'' || c == '"').trim())
        .filter(|role| !role.is_empty())
        .map(str::to_string)
        .collect()
}
