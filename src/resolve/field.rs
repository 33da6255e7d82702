//! Mapping of one declared type to a field descriptor.

use super::{POJO_CONTEXT, Resolver};
use crate::domain::{Field, FieldKind, TypeDetails, TypeId};
use crate::error::ResolveError;
use crate::source::{ClassInfo, ClassKind, MemberInfo, TypeRef, markers};

impl<'a> Resolver<'a> {
    /// Map `ty` to a field named `name`. `owner` names the declaring class in errors.
    pub(super) fn field_from_type(
        &mut self,
        owner: &str,
        name: &str,
        ty: &TypeRef,
        optional: bool,
        just_settable: bool,
    ) -> Result<Field, ResolveError> {
        let (element, list) = self.unwrap_list(owner, name, ty)?;

        let kind = self.field_kind(owner, name, &element)?;
        let mut field = Field::new(name, kind);
        field.just_settable = just_settable;

        match kind {
            FieldKind::Embeddable(_) => {
                field.list = false;
                field.optional = true;
            }
            _ if list => {
                field.list = true;
                field.optional = false;
            }
            _ => field.optional = optional,
        }
        Ok(field)
    }

    /// Strip one level of `Iterable<T>` or `T[]`; a second level is an error.
    pub(super) fn unwrap_list(
        &self,
        owner: &str,
        name: &str,
        ty: &TypeRef,
    ) -> Result<(TypeRef, bool), ResolveError> {
        let element = if is_list_type(ty) && ty.array {
            ty.element()
        } else if is_list_type(ty) {
            ty.args[0].clone()
        } else {
            return Ok((ty.clone(), false));
        };

        if is_list_type(&element) {
            return Err(ResolveError::NestedList {
                class: owner.to_string(),
                member: name.to_string(),
            });
        }
        Ok((element, true))
    }

    /// Kind of a non-list type. Arrays reaching here are handled as their element.
    fn field_kind(&mut self, owner: &str, name: &str, ty: &TypeRef) -> Result<FieldKind, ResolveError> {
        let unmappable = || ResolveError::UnmappableType {
            class: owner.to_string(),
            member: name.to_string(),
            ty: ty.to_string(),
        };

        if ty.is_generic() {
            return Err(unmappable());
        }
        if let Some(simple) = markers::map_simple_type(&ty.name) {
            return Ok(FieldKind::Simple(simple));
        }

        let class = self.load(&ty.name).ok_or_else(unmappable)?;

        if class.is_enum() {
            return self.resolve_enum(class).map(FieldKind::Enum);
        }

        let lookup = self.graph.lookup(&class.name);
        if class.has(markers::ENTITY) {
            lookup.map(FieldKind::Entity).ok_or_else(unmappable)
        } else if class.has(markers::PROJECTION) {
            lookup.map(FieldKind::Projection).ok_or_else(unmappable)
        } else if class.has(markers::EMBEDDABLE) {
            lookup.map(FieldKind::Embeddable).ok_or_else(unmappable)
        } else {
            self.resolve_pojo(class).map(FieldKind::Pojo)
        }
    }

    fn resolve_enum(&mut self, class: &ClassInfo) -> Result<TypeId, ResolveError> {
        if let Some(id) = self.graph.lookup(&class.name) {
            return Ok(id);
        }
        let constants = match &class.kind {
            ClassKind::Enum(constants) => constants.clone(),
            _ => Vec::new(),
        };
        self.graph
            .insert(&class.name, &class.simple_name, TypeDetails::Enum { constants })
    }

    /// Memoized before its fields are resolved, so self-references terminate.
    ///
    /// A class that fails once fails with the same error on every later
    /// lookup, and the nodes created while resolving it are discarded.
    pub(super) fn resolve_pojo(&mut self, class: &'a ClassInfo) -> Result<TypeId, ResolveError> {
        if let Some(err) = self.failed_pojos.get(&class.name) {
            return Err(err.clone());
        }
        if let Some(id) = self.graph.lookup(&class.name) {
            return Ok(id);
        }

        let mark = self.graph.len();
        let id = self.graph.insert(
            &class.name,
            &class.simple_name,
            TypeDetails::Pojo { fields: Vec::new() },
        )?;
        tracing::debug!(context = POJO_CONTEXT, class = %class.name, "resolving pojo");

        match self.pojo_fields(class) {
            Ok(fields) => {
                self.graph.set_fields(id, fields);
                Ok(id)
            }
            Err(err) => {
                self.graph.truncate(mark);
                self.failed_pojos.insert(class.name.clone(), err.clone());
                Err(err)
            }
        }
    }

    fn pojo_fields(&mut self, class: &'a ClassInfo) -> Result<Vec<Field>, ResolveError> {
        let mut members: Vec<&MemberInfo> = class
            .members
            .iter()
            .filter(|m| m.is_accessible() && !m.has(markers::JSON_IGNORE))
            .collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));

        members
            .into_iter()
            .map(|member| {
                let optional = !is_required(member);
                self.field_from_type(&class.name, &member.name, &member.ty, optional, false)
            })
            .collect()
    }
}

/// `T[]` other than `byte[]`, or an iterable generic.
pub(super) fn is_list_type(ty: &TypeRef) -> bool {
    (ty.array && ty.name != "byte") || (ty.is_generic() && markers::is_iterable(&ty.name))
}

/// Structural markers or a primitive type make a member required.
pub(super) fn is_required(member: &MemberInfo) -> bool {
    let optional_false = |marker: &str| {
        member
            .annotation(marker)
            .is_some_and(|a| a.bool_value("optional") == Some(false))
    };

    member.has(markers::ONE_TO_MANY)
        || member.has(markers::MANY_TO_MANY)
        || optional_false(markers::MANY_TO_ONE)
        || optional_false(markers::ONE_TO_ONE)
        || member
            .annotation(markers::COLUMN)
            .is_some_and(|a| a.bool_value("nullable") == Some(false))
        || member.has(markers::ID)
        || member.has(markers::NOT_NULL)
        || (markers::is_primitive(&member.ty.name)
            && !member.ty.array
            && !member.has(markers::NULLABLE))
}
