//! Maps recorded URL patterns onto entity operations.

use crate::domain::HttpMethod;
use crate::domain::naming::property_operation;

use super::builder::Endpoint;

/// Shape of a pattern relative to an entity collection root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathShape {
    /// `/api/widgets` or `/api/widgets/`
    Collection,
    /// `/api/widgets/*`
    Item,
    /// `/api/widgets/**`
    Subtree,
    /// `/api/widgets/*/owner`
    Property(String),
}

/// Classify `pattern` against `<base_path>/<name_rest>`.
pub fn classify(
    pattern: &str,
    base_path: &str,
    name_rest: &str,
    entity_fields: &[&str],
) -> Option<PathShape> {
    let root = format!("{}/{}", base_path.trim_end_matches('/'), name_rest);
    let pattern = if pattern.starts_with('/') {
        pattern.to_string()
    } else {
        format!("/{}", pattern)
    };

    match pattern.strip_prefix(&root)? {
        "" | "/" => Some(PathShape::Collection),
        "/*" => Some(PathShape::Item),
        "/**" => Some(PathShape::Subtree),
        rest => {
            let field = rest.strip_prefix("/*/")?.trim_end_matches('/');
            entity_fields
                .contains(&field)
                .then(|| PathShape::Property(field.to_string()))
        }
    }
}

/// Operations an endpoint of the given shape protects, deduplicated in order.
pub fn operations(shape: &PathShape, method: Option<HttpMethod>) -> Vec<String> {
    let mut ops: Vec<String> = Vec::new();
    let mut push = |op: String| {
        if !ops.contains(&op) {
            ops.push(op);
        }
    };

    match shape {
        PathShape::Collection => collection_ops(method).into_iter().for_each(|op| push(op.into())),
        PathShape::Item => item_ops(method).into_iter().for_each(|op| push(op.into())),
        PathShape::Subtree => collection_ops(method)
            .into_iter()
            .chain(item_ops(method))
            .for_each(|op| push(op.into())),
        PathShape::Property(field) => {
            let prefixes: &[&str] = match method {
                None => &["read", "set", "delete"],
                Some(HttpMethod::Get) => &["read"],
                Some(HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch) => &["set"],
                Some(HttpMethod::Delete) => &["delete"],
            };
            for prefix in prefixes {
                push(property_operation(prefix, field));
            }
        }
    }
    ops
}

fn collection_ops(method: Option<HttpMethod>) -> Vec<&'static str> {
    match method {
        None => vec!["create", "readAll"],
        Some(HttpMethod::Get) => vec!["readAll"],
        Some(verb) => vec![verb_op(verb)],
    }
}

fn item_ops(method: Option<HttpMethod>) -> Vec<&'static str> {
    match method {
        None => vec!["readOne", "update", "delete"],
        Some(HttpMethod::Get) => vec!["readOne"],
        Some(verb) => vec![verb_op(verb)],
    }
}

fn verb_op(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "readAll",
        HttpMethod::Post => "create",
        HttpMethod::Put | HttpMethod::Patch => "update",
        HttpMethod::Delete => "delete",
    }
}

/// Classify and map in one step.
pub fn endpoint_operations(
    endpoint: &Endpoint,
    base_path: &str,
    name_rest: &str,
    entity_fields: &[&str],
) -> Option<Vec<String>> {
    let shape = classify(&endpoint.url_pattern, base_path, name_rest, entity_fields)?;
    Some(operations(&shape, endpoint.method))
}
