use restgen::domain::{FieldKind, SimpleTypeKind, TypeCategory};
use restgen::{DiagnosticsLevel, GenerateError, GeneratorConfig, Severity, generate_from_manifest};
use tracing_test::traced_test;

const SHOP: &str = r#"
    package shop

    enum Status { ACTIVE, RETIRED }

    @Entity
    class Widget {
        @NotNull name: String
        @Id id: long
        @NotNull status: Status
        @ManyToOne(optional = false) owner: User
        @Nullable address: Address
        @NotNull created: OffsetDateTime
        @NotNull spec: WidgetSpec
        version: long
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
        @NotNull city: String
    }

    class WidgetSpec {
        @NotNull label: String
        @NotNull parts: List<WidgetPart>
    }

    class WidgetPart {
        @NotNull spec: WidgetSpec
    }

    @Projection(name = "base", types = Widget)
    interface BaseProjection {
        id: long
        name: String
        owner: UserSummary
        @Nullable nickname: String
    }

    @Projection(name = "summary", types = User)
    interface UserSummary {
        id: long
    }

    @RepositoryRestResource
    interface WidgetRepository : JpaRepository<Widget, Long> {
        fun findByName(name: String): List<Widget>
        fun findByOwner(owner: User): List<Widget>
        fun findByStatus(status: Status, pageable: Pageable): Page<Widget>
    }
"#;

fn config(level: DiagnosticsLevel) -> GeneratorConfig {
    GeneratorConfig {
        implicit_nullable: level,
        ..GeneratorConfig::default()
    }
}

#[test]
fn test_generation_is_idempotent() {
    let config = GeneratorConfig::default();
    let first = generate_from_manifest(SHOP, &config).unwrap();
    let second = generate_from_manifest(SHOP, &config).unwrap();
    assert_eq!(first.model, second.model);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn test_declaration_order_does_not_matter() {
    let mut blocks: Vec<&str> = SHOP.split("\n\n").collect();
    let package = blocks.remove(0);
    blocks.reverse();
    let reordered = format!("{}\n\n{}", package, blocks.join("\n\n"));

    let config = GeneratorConfig::default();
    let original = generate_from_manifest(SHOP, &config).unwrap();
    let shuffled = generate_from_manifest(&reordered, &config).unwrap();
    assert_eq!(
        serde_json::to_value(&original.model).unwrap(),
        serde_json::to_value(&shuffled.model).unwrap()
    );
}

#[test]
fn test_entity_fields() {
    let generation = generate_from_manifest(SHOP, &GeneratorConfig::default()).unwrap();
    let widget = generation.model.type_named(TypeCategory::Entity, "Widget").unwrap();

    let names: Vec<&str> = widget.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["id", "address", "created", "name", "owner", "spec", "status"]);

    let owner = widget.field("owner").unwrap();
    assert!(!owner.optional && !owner.list);
    assert!(matches!(owner.kind, FieldKind::Entity(_)));

    let address = widget.field("address").unwrap();
    assert!(address.optional);
    assert!(matches!(address.kind, FieldKind::Embeddable(_)));

    assert_eq!(
        widget.field("created").unwrap().kind,
        FieldKind::Simple(SimpleTypeKind::OffsetDateTime)
    );
    assert!(matches!(widget.field("status").unwrap().kind, FieldKind::Enum(_)));

    let user = generation.model.type_named(TypeCategory::Entity, "User").unwrap();
    let widgets = user.field("widgets").unwrap();
    assert!(widgets.list && !widgets.optional);
}

#[test]
fn test_pojo_cycle_terminates() {
    let generation = generate_from_manifest(SHOP, &GeneratorConfig::default()).unwrap();
    let model = &generation.model;

    let spec = model.type_named(TypeCategory::Pojo, "WidgetSpec").unwrap();
    let part = model.type_named(TypeCategory::Pojo, "WidgetPart").unwrap();
    assert_eq!(spec.field("parts").unwrap().kind, FieldKind::Pojo(part.id));
    assert_eq!(part.field("spec").unwrap().kind, FieldKind::Pojo(spec.id));
    assert_eq!(model.graph.ids(TypeCategory::Pojo).len(), 2);
}

#[test]
fn test_projection_narrowing() {
    let generation = generate_from_manifest(SHOP, &GeneratorConfig::default()).unwrap();
    let widget = generation.model.type_named(TypeCategory::Entity, "Widget").unwrap();
    let base = generation
        .model
        .graph
        .iter()
        .find(|t| t.as_projection().is_some_and(|p| p.parent == widget.id))
        .unwrap();

    let projection = base.as_projection().unwrap();
    assert!(projection.base_projection);
    assert_eq!(projection.projection_name, "base");
    assert_eq!(base.name, "WidgetBaseProjection");

    let names: Vec<&str> = base.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["nickname", "owner"]);
    assert!(base.field("nickname").unwrap().optional);
    let summary = generation
        .model
        .type_named(TypeCategory::Projection, "UserSummary")
        .unwrap();
    let owner = base.field("owner").unwrap();
    assert!(!owner.optional);
    assert_eq!(owner.kind, FieldKind::Projection(summary.id));
}

#[test]
#[traced_test]
fn test_entity_typed_projection_member_fails_run() {
    let manifest = SHOP.replace("owner: UserSummary", "owner: User");
    let err = generate_from_manifest(&manifest, &GeneratorConfig::default()).unwrap_err();
    assert!(matches!(err, GenerateError::Failed { count: 1 }));
    assert!(logs_contain("Field \"owner\" in projection \"shop.BaseProjection\" has an entity type"));
}

#[test]
fn test_search_filtering() {
    let generation = generate_from_manifest(SHOP, &GeneratorConfig::default()).unwrap();
    let widget = generation.model.entity("Widget").unwrap();

    let names: Vec<&str> = widget.searches.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["findByName", "findByStatus"]);
    assert!(widget.searches[1].paging);

    let dropped: Vec<_> = generation
        .diagnostics
        .iter()
        .filter(|d| d.message.contains("findByOwner"))
        .collect();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].severity, Severity::Warn);
    assert!(dropped[0].message.contains("parameter(s) owner"));
}

const LOOSE: &str = r#"
    @Entity
    class Note {
        @Id id: long
        title: String
        body: String
        @Nullable tag: String
    }
"#;

#[test]
#[traced_test]
fn test_implicit_nullable_error_fails_run() {
    let err = generate_from_manifest(LOOSE, &config(DiagnosticsLevel::Error)).unwrap_err();
    assert!(matches!(err, GenerateError::Failed { count: 2 }));
    assert!(logs_contain("Field \"title\" in \"Note\" is implicitly nullable"));
    assert!(logs_contain("Field \"body\" in \"Note\" is implicitly nullable"));
    assert!(!logs_contain("Field \"tag\""));
}

#[test]
fn test_implicit_nullable_warn_and_allow() {
    let warned = generate_from_manifest(LOOSE, &config(DiagnosticsLevel::Warn)).unwrap();
    let implicit = |d: &&restgen::Diagnostic| d.message.contains("implicitly nullable");
    assert_eq!(warned.diagnostics.iter().filter(implicit).count(), 2);

    let allowed = generate_from_manifest(LOOSE, &config(DiagnosticsLevel::Allow)).unwrap();
    assert_eq!(allowed.diagnostics.iter().filter(implicit).count(), 0);
    assert_eq!(warned.model, allowed.model);
}

#[test]
fn test_allow_with_no_members() {
    let generation =
        generate_from_manifest("@Entity class Empty { }", &config(DiagnosticsLevel::Error)).unwrap();
    assert!(generation.model.entity("Empty").unwrap().fields.is_empty());
}

#[test]
fn test_options_carried_into_model() {
    let config = GeneratorConfig {
        dates_as_string: true,
        rest_base_path: "/rest/".to_string(),
        ..GeneratorConfig::default()
    };
    let generation = generate_from_manifest(LOOSE, &config).unwrap();
    assert!(generation.model.options.dates_as_string);
    assert_eq!(generation.model.options.rest_base_path, "/rest");
}

#[test]
fn test_unmappable_member_fails_run() {
    let err = generate_from_manifest(
        "@Entity class Odd { @Id id: long  @NotNull lookup: Map<String, String> }",
        &GeneratorConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, GenerateError::Failed { .. }));
}
