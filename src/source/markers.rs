//! Well-known marker and type names recognized during resolution.

use crate::domain::SimpleTypeKind;

// Type categories
pub const ENTITY: &str = "Entity";
pub const PROJECTION: &str = "Projection";
pub const EMBEDDABLE: &str = "Embeddable";

// Members
pub const ID: &str = "Id";
pub const VERSION: &str = "Version";
pub const NOT_NULL: &str = "NotNull";
pub const NULLABLE: &str = "Nullable";
pub const COLUMN: &str = "Column";
pub const ONE_TO_MANY: &str = "OneToMany";
pub const MANY_TO_MANY: &str = "ManyToMany";
pub const MANY_TO_ONE: &str = "ManyToOne";
pub const ONE_TO_ONE: &str = "OneToOne";
pub const JSON_IGNORE: &str = "JsonIgnore";
pub const JSON_PROPERTY: &str = "JsonProperty";

// Repositories and controllers
pub const IGNORE: &str = "FegenIgnore";
pub const REPOSITORY_REST_RESOURCE: &str = "RepositoryRestResource";
pub const REST_RESOURCE: &str = "RestResource";
pub const BASE_PATH_AWARE_CONTROLLER: &str = "BasePathAwareController";
pub const REST_CONTROLLER: &str = "RestController";
pub const REQUEST_MAPPING: &str = "RequestMapping";
pub const PATH_VARIABLE: &str = "PathVariable";
pub const REQUEST_PARAM: &str = "RequestParam";
pub const REQUEST_BODY: &str = "RequestBody";
pub const PARAM: &str = "Param";
pub const PAGEABLE_DEFAULT: &str = "PageableDefault";
pub const SORT_DEFAULT: &str = "SortDefault";
pub const PRE_AUTHORIZE: &str = "PreAuthorize";

/// Verb-specific shortcuts for `RequestMapping`.
pub const VERB_MAPPINGS: [(&str, &str); 5] = [
    ("GetMapping", "GET"),
    ("PostMapping", "POST"),
    ("PutMapping", "PUT"),
    ("PatchMapping", "PATCH"),
    ("DeleteMapping", "DELETE"),
];

// Wrapper types
pub const RESPONSE_ENTITY: &str = "ResponseEntity";
pub const PAGED_MODEL: &str = "PagedModel";
pub const COLLECTION_MODEL: &str = "CollectionModel";
pub const ENTITY_MODEL: &str = "EntityModel";
pub const PAGEABLE: &str = "Pageable";
pub const SORT: &str = "Sort";

/// Request parameter that selects a projection instead of carrying a value.
pub const PROJECTION_PARAM: &str = "projection";

/// Name of the optimistic-locking counter, excluded like a `Version` member.
pub const VERSION_MEMBER: &str = "version";

/// Map a declared type name to a simple value kind.
pub fn map_simple_type(name: &str) -> Option<SimpleTypeKind> {
    let kind = match crate::source::simple_name(name) {
        // Boolean
        "boolean" | "Boolean" | "BooleanNode" => SimpleTypeKind::Boolean,

        // Integer types
        "long" | "Long" => SimpleTypeKind::Long,
        "int" | "Integer" | "short" | "Short" => SimpleTypeKind::Integer,

        // Floating point
        "double" | "Double" | "float" | "Float" | "NumericNode" => SimpleTypeKind::Double,
        "BigDecimal" => SimpleTypeKind::BigDecimal,

        // Identifiers and text
        "UUID" => SimpleTypeKind::Uuid,
        "String" | "URI" | "TextNode" => SimpleTypeKind::String,

        // Date/time
        "LocalDate" => SimpleTypeKind::Date,
        "LocalDateTime" => SimpleTypeKind::DateTime,
        "ZonedDateTime" => SimpleTypeKind::ZonedDateTime,
        "OffsetDateTime" => SimpleTypeKind::OffsetDateTime,
        "Duration" => SimpleTypeKind::Duration,

        _ => return None,
    };
    Some(kind)
}

/// Primitive member types; these are required unless marked `Nullable`.
pub fn is_primitive(name: &str) -> bool {
    matches!(
        name,
        "boolean" | "byte" | "short" | "int" | "long" | "float" | "double" | "char"
    )
}

/// Container types that unwrap to their element with `list = true`.
pub fn is_iterable(name: &str) -> bool {
    matches!(
        crate::source::simple_name(name),
        "Iterable"
            | "Collection"
            | "List"
            | "ArrayList"
            | "LinkedList"
            | "Set"
            | "HashSet"
            | "LinkedHashSet"
            | "SortedSet"
            | "TreeSet"
            | "Page"
            | "Slice"
            | "Stream"
    )
}

/// Parameter types that carry paging or ordering instead of a value.
pub fn is_paging(name: &str) -> bool {
    matches!(crate::source::simple_name(name), PAGEABLE | SORT)
}
