//! The resolved domain: an arena of type nodes referenced by handle.

pub mod api;
pub mod field;
pub mod naming;

use std::collections::HashMap;

use serde::Serialize;

pub use api::{CustomEndpoint, EntitySecurity, HttpMethod, Search};
pub use field::{Field, FieldKind, SimpleTypeKind};

use crate::error::ResolveError;

/// Handle of a node in the [`DomainTypeGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TypeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCategory {
    Entity,
    Projection,
    Embeddable,
    Enum,
    Pojo,
}

impl std::fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Entity => "entity",
            Self::Projection => "projection",
            Self::Embeddable => "embeddable",
            Self::Enum => "enum",
            Self::Pojo => "pojo",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainType {
    pub id: TypeId,
    pub name: String,
    /// Qualified name of the class this node was resolved from.
    pub class_name: String,
    pub name_rest: String,
    #[serde(flatten)]
    pub details: TypeDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum TypeDetails {
    Entity(EntityType),
    Projection(ProjectionType),
    Embeddable { fields: Vec<Field> },
    Enum { constants: Vec<String> },
    Pojo { fields: Vec<Field> },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityType {
    pub fields: Vec<Field>,
    pub searches: Vec<Search>,
    pub custom_endpoints: Vec<CustomEndpoint>,
    pub security: Vec<EntitySecurity>,
    pub exported: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionType {
    pub parent: TypeId,
    pub base_projection: bool,
    pub projection_name: String,
    pub full_projection_name: String,
    pub fields: Vec<Field>,
}

impl DomainType {
    pub fn category(&self) -> TypeCategory {
        match self.details {
            TypeDetails::Entity(_) => TypeCategory::Entity,
            TypeDetails::Projection(_) => TypeCategory::Projection,
            TypeDetails::Embeddable { .. } => TypeCategory::Embeddable,
            TypeDetails::Enum { .. } => TypeCategory::Enum,
            TypeDetails::Pojo { .. } => TypeCategory::Pojo,
        }
    }

    pub fn fields(&self) -> &[Field] {
        match &self.details {
            TypeDetails::Entity(e) => &e.fields,
            TypeDetails::Projection(p) => &p.fields,
            TypeDetails::Embeddable { fields } | TypeDetails::Pojo { fields } => fields,
            TypeDetails::Enum { .. } => &[],
        }
    }

    fn fields_mut(&mut self) -> Option<&mut Vec<Field>> {
        match &mut self.details {
            TypeDetails::Entity(e) => Some(&mut e.fields),
            TypeDetails::Projection(p) => Some(&mut p.fields),
            TypeDetails::Embeddable { fields } | TypeDetails::Pojo { fields } => Some(fields),
            TypeDetails::Enum { .. } => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Entity-typed fields: the property paths of an entity resource.
    pub fn entity_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields()
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Entity(_)))
    }

    pub fn as_entity(&self) -> Option<&EntityType> {
        match &self.details {
            TypeDetails::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_projection(&self) -> Option<&ProjectionType> {
        match &self.details {
            TypeDetails::Projection(p) => Some(p),
            _ => None,
        }
    }
}

/// Owned collection of all resolved type nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DomainTypeGraph {
    types: Vec<DomainType>,
    #[serde(skip)]
    by_class: HashMap<String, TypeId>,
}

impl DomainTypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty stub. Names are unique within a category.
    pub fn insert(
        &mut self,
        class_name: &str,
        name: &str,
        details: TypeDetails,
    ) -> Result<TypeId, ResolveError> {
        let id = TypeId(self.types.len());
        let node = DomainType {
            id,
            name: name.to_string(),
            class_name: class_name.to_string(),
            name_rest: naming::name_rest(name),
            details,
        };

        let category = node.category();
        if self
            .types
            .iter()
            .any(|t| t.category() == category && t.name == node.name)
        {
            return Err(ResolveError::DuplicateType {
                category,
                name: node.name,
            });
        }

        self.by_class.insert(class_name.to_string(), id);
        self.types.push(node);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, id: TypeId) -> Option<&DomainType> {
        self.types.get(id.0)
    }

    pub fn get_mut(&mut self, id: TypeId) -> Option<&mut DomainType> {
        self.types.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DomainType> {
        self.types.iter()
    }

    /// Node resolved from the class with this qualified name.
    pub fn lookup(&self, class_name: &str) -> Option<TypeId> {
        self.by_class.get(class_name).copied()
    }

    pub fn ids(&self, category: TypeCategory) -> Vec<TypeId> {
        self.types
            .iter()
            .filter(|t| t.category() == category)
            .map(|t| t.id)
            .collect()
    }

    pub fn entities(&self) -> impl Iterator<Item = (&DomainType, &EntityType)> {
        self.types
            .iter()
            .filter_map(|t| t.as_entity().map(|e| (t, e)))
    }

    pub fn entity_by_name(&self, name: &str) -> Option<TypeId> {
        self.entities().find(|(t, _)| t.name == name).map(|(t, _)| t.id)
    }

    pub fn entity_mut(&mut self, id: TypeId) -> Option<&mut EntityType> {
        match &mut self.types.get_mut(id.0)?.details {
            TypeDetails::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn name(&self, id: TypeId) -> &str {
        self.get(id).map(|t| t.name.as_str()).unwrap_or("<unknown>")
    }

    /// Drop every node from `len` on, with its class key.
    pub fn truncate(&mut self, len: usize) {
        self.types.truncate(len);
        self.by_class.retain(|_, id| id.0 < len);
    }

    pub fn set_fields(&mut self, id: TypeId, fields: Vec<Field>) {
        if let Some(slot) = self.get_mut(id).and_then(DomainType::fields_mut) {
            *slot = fields;
        }
    }

    /// Replace the derived REST name, as a repository path does.
    pub fn override_name_rest(&mut self, id: TypeId, name_rest: &str) {
        if let Some(node) = self.get_mut(id) {
            node.name_rest = name_rest.to_string();
        }
    }
}

/// Options that emitters read from the model rather than from global state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOptions {
    pub dates_as_string: bool,
    pub rest_base_path: String,
}

/// The product of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DomainModel {
    pub options: ModelOptions,
    #[serde(flatten)]
    pub graph: DomainTypeGraph,
}

impl DomainModel {
    pub fn entity(&self, name: &str) -> Option<&EntityType> {
        let id = self.graph.entity_by_name(name)?;
        self.graph.get(id)?.as_entity()
    }

    pub fn type_named(&self, category: TypeCategory, name: &str) -> Option<&DomainType> {
        self.graph
            .iter()
            .find(|t| t.category() == category && t.name == name)
    }
}
