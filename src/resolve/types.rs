//! Entity, projection and embeddable nodes: stubs first, then their fields.

use super::field::is_required;
use super::{EMBEDDABLE_CONTEXT, ENTITY_CONTEXT, PROJECTION_CONTEXT, Resolver};
use crate::diagnostics::check_implicit_nullable;
use crate::domain::{EntityType, ProjectionType, TypeCategory, TypeDetails, TypeId};
use crate::error::ResolveError;
use crate::source::{ClassInfo, MemberInfo, markers};

const BASE_PROJECTION: &str = "BaseProjection";

impl<'a> Resolver<'a> {
    pub(super) fn create_entity_stubs(&mut self) -> Vec<(TypeId, &'a ClassInfo)> {
        let classes = self
            .source
            .classes_with_marker(&self.config.entity_scope, markers::ENTITY);

        let mut stubs = Vec::new();
        for class in classes {
            let details = TypeDetails::Entity(EntityType::default());
            match self.graph.insert(&class.name, &class.simple_name, details) {
                Ok(id) => stubs.push((id, class)),
                Err(e) => self.fail(ENTITY_CONTEXT, e),
            }
        }
        stubs
    }

    pub(super) fn create_projection_stubs(&mut self) -> Vec<(TypeId, &'a ClassInfo)> {
        let classes = self
            .source
            .classes_with_marker(&self.config.entity_scope, markers::PROJECTION);

        let mut stubs = Vec::new();
        for class in classes {
            match self.projection_stub(class) {
                Ok(id) => stubs.push((id, class)),
                Err(e) => self.fail(PROJECTION_CONTEXT, e),
            }
        }
        stubs
    }

    fn projection_stub(&mut self, class: &ClassInfo) -> Result<TypeId, ResolveError> {
        let marker = class.annotation(markers::PROJECTION);
        let declared = marker
            .and_then(|a| a.ident_value("types"))
            .unwrap_or("<none>");

        let parent = self
            .load(declared)
            .and_then(|c| self.graph.lookup(&c.name))
            .filter(|id| self.graph.get(*id).is_some_and(|t| t.as_entity().is_some()))
            .ok_or_else(|| ResolveError::ProjectionWithoutParent {
                projection: class.name.clone(),
                parent: declared.to_string(),
            })?;

        let base_projection = class.simple_name == BASE_PROJECTION;
        let full_projection_name = if base_projection {
            format!("{}{}", self.graph.name(parent), class.simple_name)
        } else {
            class.simple_name.clone()
        };
        let projection_name = marker
            .and_then(|a| a.str_value("name"))
            .map(str::to_string)
            .unwrap_or_else(|| class.simple_name.clone());

        // Projections of different entities share simple names like `BaseProjection`.
        let details = TypeDetails::Projection(ProjectionType {
            parent,
            base_projection,
            projection_name,
            full_projection_name: full_projection_name.clone(),
            fields: Vec::new(),
        });
        let id = self.graph.insert(&class.name, &full_projection_name, details)?;
        Ok(id)
    }

    pub(super) fn create_embeddable_stubs(&mut self) -> Vec<(TypeId, &'a ClassInfo)> {
        let classes = self
            .source
            .classes_with_marker(&self.config.entity_scope, markers::EMBEDDABLE);

        let mut stubs = Vec::new();
        for class in classes {
            let details = TypeDetails::Embeddable { fields: Vec::new() };
            match self.graph.insert(&class.name, &class.simple_name, details) {
                Ok(id) => stubs.push((id, class)),
                Err(e) => self.fail(EMBEDDABLE_CONTEXT, e),
            }
        }
        stubs
    }

    /// Populate the fields of an entity, projection or embeddable stub.
    pub(super) fn populate_fields(&mut self, id: TypeId, class: &'a ClassInfo) {
        let Some(category) = self.graph.get(id).map(|t| t.category()) else {
            return;
        };
        let context = match category {
            TypeCategory::Projection => PROJECTION_CONTEXT,
            TypeCategory::Embeddable => EMBEDDABLE_CONTEXT,
            _ => ENTITY_CONTEXT,
        };
        let parent = self
            .graph
            .get(id)
            .and_then(|t| t.as_projection())
            .map(|p| p.parent);

        let mut candidates: Vec<(&MemberInfo, bool)> = class
            .members
            .iter()
            .filter_map(|m| candidate(m).map(|just_settable| (m, just_settable)))
            .filter(|(m, _)| !is_version(m) && !is_byte_array(m))
            .filter(|(m, _)| !parent.is_some_and(|p| self.omit_for_projection(p, &m.name)))
            .collect();
        candidates.sort_by(|(a, _), (b, _)| id_first(&a.name).cmp(id_first(&b.name)));

        let mut fields = Vec::with_capacity(candidates.len());
        for (member, just_settable) in candidates {
            let optional = match parent {
                Some(parent) => {
                    self.check_projection_member(class, member);
                    self.projection_optional(parent, member)
                }
                None => {
                    self.check_nullable(context, class, member);
                    !is_required(member)
                }
            };

            match self.field_from_type(&class.name, &member.name, &member.ty, optional, just_settable) {
                Ok(field) => fields.push(field),
                Err(e) => self.fail(context, e),
            }
        }

        self.graph.set_fields(id, fields);
    }

    /// A parent field that is not complex is already part of every projection.
    fn omit_for_projection(&self, parent: TypeId, name: &str) -> bool {
        self.graph
            .get(parent)
            .and_then(|p| p.field(name))
            .is_some_and(|f| !f.is_complex())
    }

    fn projection_optional(&self, parent: TypeId, member: &MemberInfo) -> bool {
        if member.has(markers::NULLABLE) {
            return true;
        }
        self.graph
            .get(parent)
            .and_then(|p| p.field(&member.name))
            .filter(|f| f.is_complex())
            .is_some_and(|f| f.optional)
    }

    fn check_projection_member(&mut self, class: &ClassInfo, member: &MemberInfo) {
        let entity = self
            .load(&member.ty.name)
            .filter(|c| c.has(markers::ENTITY));
        if let Some(entity) = entity {
            self.reporter.error(
                PROJECTION_CONTEXT,
                format!(
                    "Field \"{}\" in projection \"{}\" has an entity type. Use a projection of \"{}\" instead",
                    member.name, class.name, entity.simple_name
                ),
            );
        }
    }

    fn check_nullable(&mut self, context: &str, class: &ClassInfo, member: &MemberInfo) {
        let embeddable_typed = self
            .load(&member.ty.name)
            .is_some_and(|c| c.has(markers::EMBEDDABLE));
        let implicitly_nullable =
            !is_required(member) && !member.has(markers::NULLABLE) && !embeddable_typed;

        let diagnostics = check_implicit_nullable(
            self.config.implicit_nullable,
            implicitly_nullable,
            context,
            &class.name,
            &member.name,
        );
        self.reporter.extend(diagnostics);
    }

    pub(super) fn warn_if_empty(&mut self, entities: usize, projections: usize) {
        if entities == 0 {
            self.reporter.warn(
                ENTITY_CONTEXT,
                format!(
                    "No entity classes found in \"{}\"; entities must be annotated with Entity",
                    self.config.entity_scope
                ),
            );
        } else {
            self.reporter
                .info(ENTITY_CONTEXT, format!("Entity classes found: {}", entities));
        }

        if projections == 0 {
            self.reporter.info(
                PROJECTION_CONTEXT,
                "No projections found; projections must be annotated with Projection",
            );
        } else {
            self.reporter
                .info(PROJECTION_CONTEXT, format!("Projections found: {}", projections));
        }
    }

    pub(super) fn warn_missing_base_projections(&mut self) {
        let with_base: Vec<TypeId> = self
            .graph
            .iter()
            .filter_map(|t| t.as_projection())
            .filter(|p| p.base_projection)
            .map(|p| p.parent)
            .collect();

        let missing: Vec<&str> = self
            .graph
            .entities()
            .filter(|(t, _)| !with_base.contains(&t.id))
            .map(|(t, _)| t.name.as_str())
            .collect();

        if !missing.is_empty() {
            let message = format!(
                "The following entities do not have a base projection: {}",
                missing.join(", ")
            );
            self.reporter.warn(PROJECTION_CONTEXT, message);
        }
    }
}

/// Whether a member is part of the serialized view, and if so whether only its setter is.
fn candidate(member: &MemberInfo) -> Option<bool> {
    if !member.is_accessible() {
        return None;
    }
    if !member.has(markers::JSON_IGNORE) {
        return Some(false);
    }
    let writable = member
        .setter
        .as_ref()
        .is_some_and(|s| s.annotations.iter().any(|a| a.simple_name() == markers::JSON_PROPERTY));
    writable.then_some(true)
}

fn is_version(member: &MemberInfo) -> bool {
    member.name == markers::VERSION_MEMBER || member.has(markers::VERSION)
}

fn is_byte_array(member: &MemberInfo) -> bool {
    member.ty.array && member.ty.name == "byte"
}

fn id_first(name: &str) -> &str {
    if name == "id" { "" } else { name }
}

#[cfg(test)]
mod tests {
    use crate::config::GeneratorConfig;
    use crate::diagnostics::{DiagnosticsLevel, Reporter, Severity};
    use crate::domain::{FieldKind, TypeCategory};
    use crate::error::ResolveError;
    use crate::resolve::{Resolution, Resolver};
    use crate::source::{ClassManifest, ClassSource};

    fn resolve(input: &str, config: &GeneratorConfig) -> (Resolution, Reporter) {
        let manifest = ClassManifest::parse(input).unwrap();
        let mut reporter = Reporter::new();
        let resolution = Resolver::new(&manifest, config, &mut reporter).resolve();
        (resolution, reporter)
    }

    fn names(resolution: &Resolution, category: TypeCategory, name: &str) -> Vec<String> {
        let node = resolution
            .graph
            .iter()
            .find(|t| t.category() == category && t.name == name)
            .unwrap();
        node.fields().iter().map(|f| f.name.clone()).collect()
    }

    const SHOP: &str = r#"
        package shop

        @Entity
        class Widget {
            @NotNull name: String
            @Id id: long
            @Nullable description: String
            version: long
            data: byte[]
            @ManyToOne(optional = false) owner: User
            @JsonIgnore secret: String set @JsonProperty
            @JsonIgnore internal: String
            private hidden: String
            @Nullable address: Address
        }

        @Entity
        class User {
            @Id id: long
            @NotNull name: String
            @OneToMany widgets: List<Widget>
        }

        @Embeddable
        class Address {
            @NotNull street: String
        }

        @Projection(name = "base", types = Widget)
        interface BaseProjection {
            id: long
            name: String
            owner: User
        }
    "#;

    #[test]
    fn test_entity_fields_id_first_and_filtered() {
        let (resolution, _) = resolve(SHOP, &GeneratorConfig::default());
        assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);
        assert_eq!(
            names(&resolution, TypeCategory::Entity, "Widget"),
            vec!["id", "address", "description", "name", "owner", "secret"]
        );
    }

    #[test]
    fn test_just_settable_and_optional() {
        let (resolution, _) = resolve(SHOP, &GeneratorConfig::default());
        let widget = resolution
            .graph
            .get(resolution.graph.entity_by_name("Widget").unwrap())
            .unwrap();

        let secret = widget.field("secret").unwrap();
        assert!(secret.just_settable);
        assert!(!widget.field("name").unwrap().just_settable);

        assert!(!widget.field("owner").unwrap().optional);
        assert!(widget.field("description").unwrap().optional);

        let address = widget.field("address").unwrap();
        assert!(matches!(address.kind, FieldKind::Embeddable(_)));
        assert!(address.optional && !address.list);
    }

    #[test]
    fn test_cycle_between_entities() {
        let (resolution, _) = resolve(SHOP, &GeneratorConfig::default());
        let widget_id = resolution.graph.entity_by_name("Widget").unwrap();
        let user_id = resolution.graph.entity_by_name("User").unwrap();

        let user = resolution.graph.get(user_id).unwrap();
        let widgets = user.field("widgets").unwrap();
        assert_eq!(widgets.kind, FieldKind::Entity(widget_id));
        assert!(widgets.list);

        let widget = resolution.graph.get(widget_id).unwrap();
        assert_eq!(widget.field("owner").unwrap().kind, FieldKind::Entity(user_id));
    }

    #[test]
    fn test_projection_narrowing() {
        let (resolution, reporter) = resolve(SHOP, &GeneratorConfig::default());
        assert_eq!(
            names(&resolution, TypeCategory::Projection, "WidgetBaseProjection"),
            vec!["owner"]
        );

        let projection = resolution
            .graph
            .iter()
            .find_map(|t| t.as_projection())
            .unwrap();
        assert!(projection.base_projection);
        assert_eq!(projection.projection_name, "base");
        assert!(!projection.fields[0].optional);

        // Entity-typed projection member is reported.
        assert!(reporter.diagnostics().iter().any(|d| d.severity == Severity::Error
            && d.message.contains("has an entity type")));
    }

    #[test]
    fn test_missing_base_projection_warning() {
        let (_, reporter) = resolve(SHOP, &GeneratorConfig::default());
        assert!(reporter
            .diagnostics()
            .iter()
            .any(|d| d.message == "The following entities do not have a base projection: User"));
    }

    #[test]
    fn test_projection_without_parent() {
        let input = r#"
            @Entity class Widget { @Id id: long }
            @Projection(name = "x", types = Gadget) interface Orphan { id: long }
        "#;
        let (resolution, reporter) = resolve(input, &GeneratorConfig::default());
        assert_eq!(resolution.errors.len(), 1);
        assert!(reporter.errors_encountered());
        assert!(resolution.graph.ids(TypeCategory::Projection).is_empty());
    }

    #[test]
    fn test_implicit_nullable_levels() {
        let input = r#"
            @Entity class Widget { @Id id: long  label: String  note: String }
        "#;

        let config = GeneratorConfig {
            implicit_nullable: DiagnosticsLevel::Error,
            ..Default::default()
        };
        let (resolution, reporter) = resolve(input, &config);
        assert!(reporter.errors_encountered());
        assert_eq!(reporter.error_count(), 2);
        // Traversal continued and produced all fields.
        assert_eq!(names(&resolution, TypeCategory::Entity, "Widget").len(), 3);

        let config = GeneratorConfig {
            implicit_nullable: DiagnosticsLevel::Allow,
            ..Default::default()
        };
        let (_, reporter) = resolve(input, &config);
        assert!(!reporter.errors_encountered());
    }

    #[test]
    fn test_unmappable_member_drops_field() {
        let input = r#"
            @Entity class Widget { @Id id: long  @NotNull lookup: Map<String, String> }
        "#;
        let (resolution, reporter) = resolve(input, &GeneratorConfig::default());
        assert!(reporter.errors_encountered());
        assert_eq!(resolution.errors.len(), 1);
        assert_eq!(names(&resolution, TypeCategory::Entity, "Widget"), vec!["id"]);
    }

    #[test]
    fn test_duplicate_entity_name() {
        let input = "package a\n@Entity class Widget { @Id id: long }";
        let a = ClassManifest::parse(input).unwrap();
        let b = ClassManifest::parse(&input.replace("package a", "package b")).unwrap();
        let all = a.all_classes().into_iter().chain(b.all_classes()).cloned().collect();
        let manifest = ClassManifest::from_classes(all);

        let (resolution, reporter) = {
            let config = GeneratorConfig::default();
            let mut reporter = Reporter::new();
            let resolution = Resolver::new(&manifest, &config, &mut reporter).resolve();
            (resolution, reporter)
        };
        assert!(reporter.errors_encountered());
        assert!(matches!(
            resolution.errors[0],
            ResolveError::DuplicateType { category: TypeCategory::Entity, .. }
        ));
        assert_eq!(resolution.graph.ids(TypeCategory::Entity).len(), 1);
    }
}
