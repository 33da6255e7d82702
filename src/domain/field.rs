use serde::Serialize;

use super::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SimpleTypeKind {
    #[serde(rename = "STRING")]
    String,
    #[serde(rename = "INTEGER")]
    Integer,
    #[serde(rename = "LONG")]
    Long,
    #[serde(rename = "DOUBLE")]
    Double,
    #[serde(rename = "UUID")]
    Uuid,
    #[serde(rename = "BIGDECIMAL")]
    BigDecimal,
    #[serde(rename = "BOOLEAN")]
    Boolean,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "DATETIME")]
    DateTime,
    #[serde(rename = "ZONED_DATETIME")]
    ZonedDateTime,
    #[serde(rename = "OFFSET_DATETIME")]
    OffsetDateTime,
    #[serde(rename = "DURATION")]
    Duration,
}

impl SimpleTypeKind {
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            Self::Date | Self::DateTime | Self::ZonedDateTime | Self::OffsetDateTime | Self::Duration
        )
    }
}

/// What a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Simple(SimpleTypeKind),
    Entity(TypeId),
    Projection(TypeId),
    Embeddable(TypeId),
    Enum(TypeId),
    Pojo(TypeId),
}

impl FieldKind {
    /// Entity, projection and embeddable payloads.
    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Entity(_) | Self::Projection(_) | Self::Embeddable(_))
    }

    /// Simple and enum payloads: what a query parameter may carry.
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Simple(_) | Self::Enum(_))
    }

    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Self::Simple(_) => None,
            Self::Entity(id)
            | Self::Projection(id)
            | Self::Embeddable(id)
            | Self::Enum(id)
            | Self::Pojo(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub list: bool,
    pub optional: bool,
    pub just_settable: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            list: false,
            optional: false,
            just_settable: false,
            kind,
        }
    }

    pub fn is_complex(&self) -> bool {
        self.kind.is_complex()
    }
}
