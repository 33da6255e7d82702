use crate::domain::TypeCategory;
use crate::source::ParseError;

/// Problems that make the domain model unusable. Collected, fatal to the run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("Duplicate {category} type name: {name}")]
    DuplicateType { category: TypeCategory, name: String },
    #[error("Type {ty} of {class}::{member} cannot be mapped")]
    UnmappableType {
        class: String,
        member: String,
        ty: String,
    },
    #[error("{class}::{member} is a list of lists, which is not supported")]
    NestedList { class: String, member: String },
    #[error("Projection {projection} does not project a known entity ({parent})")]
    ProjectionWithoutParent { projection: String, parent: String },
    #[error("Repository {repository} does not manage a known entity")]
    UnknownRepositoryEntity { repository: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid diagnostics level: {0} (expected allow, warn or error)")]
    InvalidLevel(String),
}

/// Failures while extracting access rules. Fatal only to security extraction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SecurityError {
    #[error("No class extending {0} was found")]
    NoConfiguration(String),
    #[error("Several classes extend {superclass}: {}", classes.join(", "))]
    MultipleConfigurations {
        superclass: String,
        classes: Vec<String>,
    },
    #[error("{0} has no zero-argument constructor")]
    NoDefaultConstructor(String),
    #[error("{0} declares no configure(HttpSecurity) routine")]
    MissingConfigure(String),
    #[error("Call to {receiver}.{method} has no modeled behavior")]
    UnmodeledCall { receiver: String, method: String },
    #[error("Invalid argument {arg} for {method}")]
    InvalidArgument { method: String, arg: String },
    #[error("Unknown variable {0}")]
    UnknownReceiver(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Manifest error: {0}")]
    Parse(#[from] ParseError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Generation failed with {count} error(s)")]
    Failed { count: usize },
}
