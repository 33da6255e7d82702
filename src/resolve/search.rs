//! Searches from repositories and from search controllers.

use super::field::is_list_type;
use super::{CUSTOM_SEARCH_CONTEXT, Resolver, SEARCH_CONTEXT, required_roles, sorted_methods};
use crate::domain::naming::capitalize;
use crate::domain::{Field, Search, TypeId};
use crate::error::ResolveError;
use crate::source::{Annotation, ClassInfo, MethodInfo, ParamInfo, TypeRef, markers};

impl<'a> Resolver<'a> {
    pub(super) fn add_repository_searches(&mut self) {
        let repositories = self.source.classes_with_marker(
            &self.config.repository_scope,
            markers::REPOSITORY_REST_RESOURCE,
        );

        let mut exported_repositories = 0;
        let mut found = 0;
        for repository in repositories {
            if repository.has(markers::IGNORE) {
                continue;
            }
            let Some(entity) = self.managed_entity(repository) else {
                let error = ResolveError::UnknownRepositoryEntity {
                    repository: repository.name.clone(),
                };
                self.fail(SEARCH_CONTEXT, error);
                continue;
            };

            let marker = repository.annotation(markers::REPOSITORY_REST_RESOURCE);
            if let Some(path) = marker.and_then(|a| a.str_value("path")) {
                let path = path.trim().trim_start_matches('/');
                if !path.is_empty() {
                    self.graph.override_name_rest(entity, path);
                }
            }

            if marker.and_then(|a| a.bool_value("exported")) == Some(false) {
                self.reporter.debug(
                    SEARCH_CONTEXT,
                    format!("Repository {} is not exported", repository.simple_name),
                );
                continue;
            }
            exported_repositories += 1;

            let mut searches = Vec::new();
            for method in sorted_methods(repository) {
                if !method.name.starts_with("find")
                    || method.has(markers::IGNORE)
                    || !is_method_exported(method)
                {
                    continue;
                }
                let params: Vec<&ParamInfo> = method.params.iter().collect();
                if !self.has_only_supported_parameters(SEARCH_CONTEXT, "Repository", repository, method, &params) {
                    continue;
                }
                match self.repository_search(repository, method, entity) {
                    Ok(search) => searches.push(search),
                    Err(e) => self.fail(SEARCH_CONTEXT, e),
                }
            }
            found += searches.len();

            if let Some(entity) = self.graph.entity_mut(entity) {
                entity.exported = true;
                entity.searches.extend(searches);
            }
        }

        if exported_repositories == 0 {
            self.reporter.info(
                SEARCH_CONTEXT,
                "No repository classes found; repositories must be annotated with RepositoryRestResource",
            );
        } else {
            self.reporter.info(
                SEARCH_CONTEXT,
                format!("Repository classes found: {}", exported_repositories),
            );
            if found == 0 {
                self.reporter.info(
                    SEARCH_CONTEXT,
                    "No repository search methods were found; their names must start with \"find\"",
                );
            } else {
                self.reporter
                    .info(SEARCH_CONTEXT, format!("Repository search methods found: {}", found));
            }
        }
    }

    /// First type argument of a supertype that names a known entity.
    fn managed_entity(&self, repository: &ClassInfo) -> Option<TypeId> {
        repository.supertypes.iter().find_map(|supertype| {
            let class = self.load(&supertype.args.first()?.name)?;
            let id = self.graph.lookup(&class.name)?;
            self.graph.get(id)?.as_entity().map(|_| id)
        })
    }

    fn repository_search(
        &mut self,
        repository: &ClassInfo,
        method: &MethodInfo,
        entity: TypeId,
    ) -> Result<Search, ResolveError> {
        let paging = method
            .params
            .iter()
            .any(|p| p.ty.simple_name() == markers::PAGEABLE);
        let list = paging || method.return_type.as_ref().is_some_and(is_list_type);

        let mut parameters = Vec::new();
        for param in method.params.iter().filter(|p| !markers::is_paging(&p.ty.name)) {
            let name = param_name(param);
            parameters.push(self.field_from_type(&repository.name, &name, &param.ty, false, false)?);
        }

        let name = method
            .annotation(markers::REST_RESOURCE)
            .and_then(|a| a.str_value("path"))
            .map(|p| p.trim_start_matches('/').to_string())
            .unwrap_or_else(|| method.name.clone());

        Ok(Search {
            name,
            parameters,
            list,
            paging,
            return_type: entity,
            in_repo: true,
            required_roles: required_roles(repository, method),
        })
    }

    pub(super) fn add_custom_searches(&mut self) {
        let controllers = self
            .source
            .classes_with_marker(&self.config.scan_scope, markers::BASE_PATH_AWARE_CONTROLLER);

        let mut found = 0;
        for controller in controllers {
            let Some(base) = search_controller_path(controller) else {
                continue;
            };
            found += 1;

            let methods: Vec<&MethodInfo> = sorted_methods(controller)
                .into_iter()
                .filter(|m| m.has(markers::REQUEST_MAPPING) && !m.has(markers::IGNORE))
                .collect();
            if methods.is_empty() {
                self.reporter.warn(
                    CUSTOM_SEARCH_CONTEXT,
                    format!(
                        "{} does not contain any custom search methods; they must be annotated with RequestMapping",
                        controller.simple_name
                    ),
                );
                continue;
            }

            for method in methods {
                let request_params: Vec<&ParamInfo> = method
                    .params
                    .iter()
                    .filter(|p| p.has(markers::REQUEST_PARAM) && param_name(p) != markers::PROJECTION_PARAM)
                    .collect();
                if !self.has_only_supported_parameters(
                    CUSTOM_SEARCH_CONTEXT,
                    "Custom search",
                    controller,
                    method,
                    &request_params,
                ) {
                    continue;
                }

                let Some(name) = method
                    .annotation(markers::REQUEST_MAPPING)
                    .and_then(Annotation::path)
                    .map(|p| p.trim_start_matches('/').to_string())
                else {
                    self.reporter.warn(
                        CUSTOM_SEARCH_CONTEXT,
                        format!(
                            "Custom search method {}::{} will be ignored because neither value nor path is specified for its RequestMapping",
                            controller.simple_name, method.name
                        ),
                    );
                    continue;
                };

                let Some(entity) = self.custom_search_entity(method, base) else {
                    self.reporter.warn(
                        CUSTOM_SEARCH_CONTEXT,
                        format!(
                            "Custom search method {}::{} will be ignored because its entity cannot be determined",
                            controller.simple_name, method.name
                        ),
                    );
                    continue;
                };

                match self.custom_search(controller, method, name, &request_params, entity) {
                    Ok(search) => {
                        if let Some(entity) = self.graph.entity_mut(entity) {
                            entity.searches.push(search);
                        }
                    }
                    Err(e) => self.fail(CUSTOM_SEARCH_CONTEXT, e),
                }
            }
        }

        if found == 0 {
            self.reporter.info(
                CUSTOM_SEARCH_CONTEXT,
                "Found no BasePathAwareController classes whose path ends with \"/search\"",
            );
        } else {
            self.reporter.info(
                CUSTOM_SEARCH_CONTEXT,
                format!("Custom search controller classes found: {}", found),
            );
        }
    }

    fn custom_search(
        &mut self,
        controller: &ClassInfo,
        method: &MethodInfo,
        name: String,
        request_params: &[&ParamInfo],
        entity: TypeId,
    ) -> Result<Search, ResolveError> {
        let paging = method
            .params
            .iter()
            .any(|p| p.has(markers::PAGEABLE_DEFAULT) || p.has(markers::SORT_DEFAULT));
        let list = paging
            || method
                .return_type
                .as_ref()
                .and_then(unwrap_response)
                .is_some_and(|t| matches!(t.simple_name(), markers::PAGED_MODEL | markers::COLLECTION_MODEL));

        let parameters = self.request_param_fields(&controller.name, request_params)?;

        Ok(Search {
            name,
            parameters,
            list,
            paging,
            return_type: entity,
            in_repo: false,
            required_roles: required_roles(controller, method),
        })
    }

    /// Entity of the returned resource, else the path segment before `/search`.
    fn custom_search_entity(&self, method: &MethodInfo, base: &str) -> Option<TypeId> {
        let from_return = method
            .return_type
            .as_ref()
            .and_then(unwrap_resource)
            .and_then(|t| self.load(&t.name))
            .and_then(|class| self.graph.lookup(&class.name))
            .and_then(|id| {
                let node = self.graph.get(id)?;
                match node.as_projection() {
                    Some(p) => Some(p.parent),
                    None => node.as_entity().map(|_| id),
                }
            });
        if from_return.is_some() {
            return from_return;
        }

        let segment = base
            .strip_suffix("/search")?
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())?;
        let capitalized = capitalize(segment);
        self.graph
            .entity_by_name(&capitalized)
            .or_else(|| {
                // `/widgets/search` names the entity by its REST collection.
                self.graph
                    .entities()
                    .find(|(t, _)| t.name_rest == segment)
                    .map(|(t, _)| t.id)
            })
    }

    pub(super) fn request_param_fields(
        &mut self,
        owner: &str,
        params: &[&ParamInfo],
    ) -> Result<Vec<Field>, ResolveError> {
        let mut fields = Vec::with_capacity(params.len());
        for param in params {
            let required = param
                .annotation(markers::REQUEST_PARAM)
                .and_then(|a| a.bool_value("required"))
                .unwrap_or(true);
            let name = param_name(param);
            fields.push(self.field_from_type(owner, &name, &param.ty, !required, false)?);
        }
        Ok(fields)
    }

    /// Warn once naming every parameter that is neither a value nor paging.
    pub(super) fn has_only_supported_parameters(
        &mut self,
        context: &str,
        kind: &str,
        class: &ClassInfo,
        method: &MethodInfo,
        params: &[&ParamInfo],
    ) -> bool {
        let unsupported: Vec<&str> = params
            .iter()
            .filter(|p| !self.is_supported_parameter(&p.ty))
            .map(|p| p.name.as_str())
            .collect();
        if unsupported.is_empty() {
            return true;
        }

        self.reporter.warn(
            context,
            format!(
                "{} search method {}::{} will be ignored because the type of parameter(s) {} cannot be handled",
                kind,
                class.simple_name,
                method.name,
                unsupported.join(", ")
            ),
        );
        false
    }

    /// Simple and enum values, lists of them, and paging machinery.
    pub(super) fn is_supported_parameter(&self, ty: &TypeRef) -> bool {
        if markers::is_paging(&ty.name) && !ty.array {
            return true;
        }
        let element = if ty.array {
            ty.element()
        } else if ty.is_generic() && markers::is_iterable(&ty.name) {
            ty.args[0].clone()
        } else if ty.is_generic() {
            return false;
        } else {
            ty.clone()
        };
        if is_list_type(&element) || element.is_generic() {
            return false;
        }
        markers::map_simple_type(&element.name).is_some()
            || self.load(&element.name).is_some_and(ClassInfo::is_enum)
    }
}

fn is_method_exported(method: &MethodInfo) -> bool {
    method
        .annotation(markers::REST_RESOURCE)
        .and_then(|a| a.bool_value("exported"))
        .unwrap_or(true)
}

/// Name a parameter has on the wire.
pub(super) fn param_name(param: &ParamInfo) -> String {
    for marker in [markers::PATH_VARIABLE, markers::REQUEST_PARAM] {
        if let Some(annotation) = param.annotation(marker) {
            let name = annotation
                .str_value("name")
                .or_else(|| annotation.str_value("value"))
                .filter(|n| !n.trim().is_empty());
            if let Some(name) = name {
                return name.to_string();
            }
        }
    }
    param
        .annotation(markers::PARAM)
        .and_then(|a| a.str_value("value"))
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| param.name.clone())
}

/// Request path of a search controller, if it ends with `/search`.
fn search_controller_path(controller: &ClassInfo) -> Option<&str> {
    if controller.has(markers::IGNORE) {
        return None;
    }
    controller
        .annotation(markers::REQUEST_MAPPING)?
        .path()
        .filter(|p| p.trim_end_matches('/').ends_with("/search"))
        .map(|p| p.trim_end_matches('/'))
}

/// `ResponseEntity<X>` -> `X`.
pub(super) fn unwrap_response(ty: &TypeRef) -> Option<&TypeRef> {
    if ty.simple_name() == markers::RESPONSE_ENTITY {
        ty.args.first()
    } else {
        Some(ty)
    }
}

/// Innermost resource type: strips `ResponseEntity` and the HAL model wrappers.
fn unwrap_resource(ty: &TypeRef) -> Option<&TypeRef> {
    let mut current = unwrap_response(ty)?;
    while matches!(
        current.simple_name(),
        markers::PAGED_MODEL | markers::COLLECTION_MODEL | markers::ENTITY_MODEL
    ) || (current.is_generic() && markers::is_iterable(&current.name))
    {
        current = current.args.first()?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::diagnostics::{Reporter, Severity};
    use crate::resolve::Resolution;
    use crate::source::{ClassManifest, ClassSource};

    fn resolve(input: &str) -> (Resolution, Reporter) {
        let manifest = ClassManifest::parse(input).unwrap();
        let config = GeneratorConfig::default();
        let mut reporter = Reporter::new();
        let resolution = Resolver::new(&manifest, &config, &mut reporter).resolve();
        (resolution, reporter)
    }

    const ENTITIES: &str = r#"
        package shop
        enum Status { ACTIVE, RETIRED }
        @Entity class Widget { @Id id: long  @NotNull name: String  @NotNull status: Status }
        @Entity class Gadget { @Id id: long }
        @Projection(name = "base", types = Widget) interface BaseProjection { id: long }
    "#;

    fn searches<'r>(resolution: &'r Resolution, entity: &str) -> &'r [Search] {
        let id = resolution.graph.entity_by_name(entity).unwrap();
        &resolution.graph.get(id).unwrap().as_entity().unwrap().searches
    }

    #[test]
    fn test_repository_searches() {
        let input = format!(
            "{}{}",
            ENTITIES,
            r#"
            @RepositoryRestResource(path = "/gizmos")
            interface WidgetRepository : JpaRepository<Widget, Long> {
                fun findByStatus(@Param("state") status: Status, pageable: Pageable): Page<Widget>
                @RestResource(path = "named")
                fun findByName(name: String): Widget
                @RestResource(exported = false)
                fun findSecret(name: String): Widget
                fun countByName(name: String): long
                @FegenIgnore
                fun findIgnored(name: String): Widget
            }
            "#
        );
        let (resolution, _) = resolve(&input);

        let widget_id = resolution.graph.entity_by_name("Widget").unwrap();
        let widget = resolution.graph.get(widget_id).unwrap();
        assert_eq!(widget.name_rest, "gizmos");
        assert!(widget.as_entity().unwrap().exported);

        let found = searches(&resolution, "Widget");
        let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["named", "findByStatus"]);

        let by_status = &found[1];
        assert!(by_status.paging && by_status.list && by_status.in_repo);
        assert_eq!(by_status.parameters.len(), 1);
        assert_eq!(by_status.parameters[0].name, "state");
        assert_eq!(by_status.return_type, widget_id);

        assert!(!found[0].list && !found[0].paging);
    }

    #[test]
    fn test_unsupported_parameter_drops_whole_search() {
        let input = format!(
            "{}{}",
            ENTITIES,
            r#"
            @RepositoryRestResource
            interface WidgetRepository : JpaRepository<Widget, Long> {
                fun findByGadget(gadget: Gadget, name: String): List<Widget>
            }
            "#
        );
        let (resolution, reporter) = resolve(&input);
        assert!(searches(&resolution, "Widget").is_empty());

        let warnings: Vec<&str> = reporter
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Warn && d.message.contains("findByGadget"))
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            warnings,
            vec!["Repository search method WidgetRepository::findByGadget will be ignored because the type of parameter(s) gadget cannot be handled"]
        );
    }

    #[test]
    fn test_unexported_repository() {
        let input = format!(
            "{}{}",
            ENTITIES,
            r#"
            @RepositoryRestResource(exported = false)
            interface WidgetRepository : JpaRepository<Widget, Long> {
                fun findByName(name: String): List<Widget>
            }
            "#
        );
        let (resolution, _) = resolve(&input);
        let id = resolution.graph.entity_by_name("Widget").unwrap();
        let widget = resolution.graph.get(id).unwrap().as_entity().unwrap();
        assert!(!widget.exported);
        assert!(widget.searches.is_empty());
    }

    #[test]
    fn test_repository_for_unknown_entity() {
        let input = format!(
            "{}{}",
            ENTITIES,
            r#"
            class Loose { }
            @RepositoryRestResource
            interface LooseRepository : JpaRepository<Loose, Long> { }
            "#
        );
        let (resolution, reporter) = resolve(&input);
        assert!(reporter.errors_encountered());
        assert!(matches!(
            resolution.errors[0],
            ResolveError::UnknownRepositoryEntity { .. }
        ));
    }

    #[test]
    fn test_custom_searches() {
        let input = format!(
            "{}{}",
            ENTITIES,
            r#"
            @BasePathAwareController
            @RequestMapping("/widgets/search")
            @PreAuthorize("hasRole('USER')")
            class WidgetSearchController {
                @RequestMapping("/byText")
                fun byText(@RequestParam(value = "text", required = false) text: String,
                           @RequestParam("projection") projection: String,
                           @PageableDefault pageable: Pageable,
                           assembler: PersistentEntityResourceAssembler): ResponseEntity<PagedModel<EntityModel<BaseProjection>>>

                @RequestMapping("/newest")
                @PreAuthorize("hasAnyRole('ADMIN', 'AUDITOR')")
                fun newest(): ResponseEntity<Void>

                fun helper(): String
            }
            "#
        );
        let (resolution, _) = resolve(&input);
        let found = searches(&resolution, "Widget");
        assert_eq!(found.len(), 2);

        let by_text = &found[0];
        assert_eq!(by_text.name, "byText");
        assert!(by_text.paging && by_text.list && !by_text.in_repo);
        assert_eq!(by_text.parameters.len(), 1);
        assert!(by_text.parameters[0].optional);
        assert_eq!(by_text.required_roles, Some(vec!["USER".to_string()]));

        // Entity taken from the path segment when the return type names none.
        let newest = &found[1];
        assert_eq!(newest.name, "newest");
        assert!(!newest.list);
        assert_eq!(
            newest.required_roles,
            Some(vec!["ADMIN".to_string(), "AUDITOR".to_string()])
        );
    }

    #[test]
    fn test_unwrap_resource() {
        let manifest = ClassManifest::parse(
            "class T { x: ResponseEntity<CollectionModel<EntityModel<Widget>>> }",
        )
        .unwrap();
        let ty = &manifest.load("T").unwrap().members[0].ty;
        assert_eq!(unwrap_resource(ty).unwrap().name, "Widget");
    }
}
