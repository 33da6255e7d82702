//! REST naming conventions.

use heck::{ToLowerCamelCase, ToUpperCamelCase};

/// Collection path segment of a type: `WidgetItem` -> `widgetItems`.
pub fn name_rest(type_name: &str) -> String {
    pluralize(&type_name.to_lower_camel_case())
}

/// Irregular nouns, matched against the last word of a camel-case name.
const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("half", "halves"),
    ("knife", "knives"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("louse", "lice"),
    ("man", "men"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("person", "people"),
    ("shelf", "shelves"),
    ("thief", "thieves"),
    ("tooth", "teeth"),
    ("wife", "wives"),
    ("wolf", "wolves"),
    ("woman", "women"),
];

const UNCOUNTABLE: &[&str] = &[
    "deer",
    "equipment",
    "fish",
    "information",
    "money",
    "news",
    "rice",
    "series",
    "sheep",
    "species",
];

pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let split = word
        .char_indices()
        .filter(|(_, c)| c.is_uppercase())
        .map(|(i, _)| i)
        .last()
        .unwrap_or(0);
    let (head, last) = word.split_at(split);
    let lower = last.to_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
        let capitalized = last.starts_with(|c: char| c.is_uppercase());
        let plural = if capitalized { capitalize(plural) } else { plural.to_string() };
        return format!("{}{}", head, plural);
    }

    if let Some(stem) = word.strip_suffix('y') {
        let before = stem.chars().last();
        if before.is_some_and(|c| !"aeiou".contains(c.to_ascii_lowercase())) {
            return format!("{}ies", stem);
        }
    }
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("sh")
        || lower.ends_with("ch")
    {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

/// `widgets` -> `Widgets`, as used when a path segment names an entity.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Operation name for an entity-valued property: `read` + `owner` -> `readOwnerProperty`.
pub fn property_operation(prefix: &str, field: &str) -> String {
    format!("{}{}Property", prefix, field.to_upper_camel_case())
}
