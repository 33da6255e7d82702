//! Class sources: where annotated classes come from.

pub mod lexer;
pub mod markers;
pub mod model;
pub mod parser;

use std::collections::HashMap;

pub use model::*;
pub use parser::{Manifest, ParseError, Parser};

/// Introspection contract the resolvers work against.
pub trait ClassSource {
    /// Every class this source knows about.
    fn all_classes(&self) -> Vec<&ClassInfo>;

    /// Load a class by qualified name, or by simple name when it is unique.
    fn load(&self, name: &str) -> Option<&ClassInfo>;

    /// Classes under `scope` carrying `marker`, sorted by qualified name.
    fn classes_with_marker(&self, scope: &str, marker: &str) -> Vec<&ClassInfo> {
        let mut classes: Vec<&ClassInfo> = self
            .all_classes()
            .into_iter()
            .filter(|c| in_scope(&c.name, scope) && c.has(marker))
            .collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        classes
    }

    /// Classes whose declared superclass is `superclass`, sorted by qualified name.
    fn subclasses_of(&self, superclass: &str) -> Vec<&ClassInfo> {
        let wanted = simple_name(superclass);
        let mut classes: Vec<&ClassInfo> = self
            .all_classes()
            .into_iter()
            .filter(|c| c.superclass().is_some_and(|s| s.simple_name() == wanted))
            .collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        classes
    }
}

/// A qualified name is inside a scope when the scope is empty, equal, or a package prefix.
pub fn in_scope(name: &str, scope: &str) -> bool {
    scope.is_empty()
        || name == scope
        || name
            .strip_prefix(scope)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Class source backed by a parsed class manifest.
#[derive(Debug, Clone, Default)]
pub struct ClassManifest {
    classes: Vec<ClassInfo>,
    by_name: HashMap<String, usize>,
    by_simple_name: HashMap<String, Vec<usize>>,
}

impl ClassManifest {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let manifest = Parser::new(input)?.parse()?;
        Ok(Self::from_classes(manifest.classes))
    }

    pub fn from_classes(classes: Vec<ClassInfo>) -> Self {
        let mut by_name = HashMap::new();
        let mut by_simple_name: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, class) in classes.iter().enumerate() {
            by_name.entry(class.name.clone()).or_insert(idx);
            by_simple_name
                .entry(class.simple_name.clone())
                .or_default()
                .push(idx);
        }

        Self {
            classes,
            by_name,
            by_simple_name,
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassSource for ClassManifest {
    fn all_classes(&self) -> Vec<&ClassInfo> {
        self.classes.iter().collect()
    }

    fn load(&self, name: &str) -> Option<&ClassInfo> {
        if let Some(&idx) = self.by_name.get(name) {
            return self.classes.get(idx);
        }
        match self.by_simple_name.get(simple_name(name)).map(Vec::as_slice) {
            Some([idx]) => self.classes.get(*idx),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
        package com.example

        @Entity class Widget { @Id id: long }
        @Entity class Gadget { @Id id: long }
        class Helper { }
        class SecurityConfig : WebSecurityConfigurerAdapter { }
    "#;

    #[test]
    fn test_in_scope() {
        assert!(in_scope("com.example.Widget", ""));
        assert!(in_scope("com.example.Widget", "com.example"));
        assert!(!in_scope("com.examples.Widget", "com.example"));
        assert!(!in_scope("org.other.Widget", "com.example"));
    }

    #[test]
    fn test_classes_with_marker_sorted() {
        let manifest = ClassManifest::parse(MANIFEST).unwrap();
        let names: Vec<&str> = manifest
            .classes_with_marker("com.example", "Entity")
            .iter()
            .map(|c| c.simple_name.as_str())
            .collect();
        assert_eq!(names, vec!["Gadget", "Widget"]);
        assert!(manifest.classes_with_marker("org", "Entity").is_empty());
    }

    #[test]
    fn test_load_by_qualified_and_simple_name() {
        let manifest = ClassManifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.load("com.example.Helper").unwrap().simple_name, "Helper");
        assert_eq!(manifest.load("Helper").unwrap().name, "com.example.Helper");
        assert!(manifest.load("Missing").is_none());
    }

    #[test]
    fn test_ambiguous_simple_name() {
        let mut classes = ClassManifest::parse("package a\nclass Dup { }").unwrap().classes;
        classes.extend(ClassManifest::parse("package b\nclass Dup { }").unwrap().classes);
        let manifest = ClassManifest::from_classes(classes);
        assert!(manifest.load("Dup").is_none());
        assert!(manifest.load("b.Dup").is_some());
    }

    #[test]
    fn test_subclasses_of() {
        let manifest = ClassManifest::parse(MANIFEST).unwrap();
        let found = manifest.subclasses_of("org.springframework.WebSecurityConfigurerAdapter");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].simple_name, "SecurityConfig");
    }
}
