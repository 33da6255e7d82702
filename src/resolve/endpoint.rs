//! Custom endpoints declared by REST controllers mapped below an entity path.

use super::search::param_name;
use super::{ENDPOINT_CONTEXT, Resolver, required_roles, sorted_methods};
use crate::domain::{CustomEndpoint, Field, FieldKind, HttpMethod, TypeId};
use crate::error::ResolveError;
use crate::source::{Annotation, ClassInfo, MethodInfo, ParamInfo, TypeRef, markers};

/// Why a controller method cannot become an endpoint. The method is skipped.
#[derive(Debug, thiserror::Error)]
enum EndpointError {
    #[error("HTTP method must be specified")]
    MissingMethod,
    #[error("HTTP method {0} is not supported")]
    UnsupportedMethod(String),
    #[error("request mapping must have a value or a path")]
    MissingPath,
    #[error("only void or ResponseEntity are allowed as return types of custom endpoints, {0} is invalid")]
    NoResponseEntity(String),
    #[error(
        "ResponseEntity may only hold EntityModel, CollectionModel, PagedModel, lists or plain types, {0} is invalid"
    )]
    UnknownResponseContent(String),
    #[error("{0}")]
    Field(#[from] ResolveError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Multiplicity {
    Single,
    List,
    Paged,
}

impl<'a> Resolver<'a> {
    pub(super) fn add_custom_endpoints(&mut self) {
        let controllers = self
            .source
            .classes_with_marker(&self.config.scan_scope, markers::REST_CONTROLLER);

        let mut found = 0;
        let mut endpoints_found = 0;
        for controller in controllers {
            if controller.has(markers::IGNORE) {
                continue;
            }
            let Some(base_uri) = controller
                .annotation(markers::REQUEST_MAPPING)
                .and_then(Annotation::path)
            else {
                continue;
            };
            let Some(entity) = self.entity_for_base_path(base_uri) else {
                self.reporter.debug(
                    ENDPOINT_CONTEXT,
                    format!(
                        "{} is not mapped below the path of an entity ({})",
                        controller.simple_name, base_uri
                    ),
                );
                continue;
            };
            found += 1;

            for method in sorted_methods(controller) {
                if method.has(markers::IGNORE) {
                    continue;
                }
                match self.custom_endpoint(controller, base_uri, method, entity) {
                    Ok(Some(endpoint)) => {
                        endpoints_found += 1;
                        if let Some(entity) = self.graph.entity_mut(entity) {
                            entity.custom_endpoints.push(endpoint);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => self.reporter.warn(
                        ENDPOINT_CONTEXT,
                        format!(
                            "Method {}::{} will be ignored: {}",
                            controller.name, method.name, e
                        ),
                    ),
                }
            }
        }

        if found == 0 {
            self.reporter.info(
                ENDPOINT_CONTEXT,
                "Found no custom endpoint classes; they must be annotated with RestController \
                 and mapped to a path ending with the REST name of an entity",
            );
        } else {
            self.reporter.info(
                ENDPOINT_CONTEXT,
                format!("Custom endpoint classes found: {}", found),
            );
            if endpoints_found == 0 {
                self.reporter.warn(
                    ENDPOINT_CONTEXT,
                    "No custom endpoints were found; they must be methods annotated with RequestMapping",
                );
            } else {
                self.reporter.info(
                    ENDPOINT_CONTEXT,
                    format!("Custom controller methods found: {}", endpoints_found),
                );
            }
        }
    }

    /// Entity whose REST name is the last segment of `base`.
    fn entity_for_base_path(&self, base: &str) -> Option<TypeId> {
        let base = base.trim_end_matches('/');
        self.graph
            .entities()
            .find(|(t, _)| {
                base.strip_suffix(t.name_rest.as_str())
                    .is_some_and(|prefix| prefix.ends_with('/'))
            })
            .map(|(t, _)| t.id)
    }

    fn custom_endpoint(
        &mut self,
        controller: &ClassInfo,
        base_uri: &str,
        method: &MethodInfo,
        entity: TypeId,
    ) -> Result<Option<CustomEndpoint>, EndpointError> {
        let Some((url, verb)) = request_mapping(method)? else {
            return Ok(None);
        };
        let (return_type, multiplicity) = match self.endpoint_return(&controller.name, method)? {
            Some((kind, multiplicity)) => (Some(kind), multiplicity),
            None => (None, Multiplicity::Single),
        };

        let mut path_variables = Vec::new();
        for param in method.params.iter().filter(|p| p.has(markers::PATH_VARIABLE)) {
            let name = param_name(param);
            path_variables.push(self.field_from_type(&controller.name, &name, &param.ty, false, false)?);
        }

        let request_params: Vec<&ParamInfo> = method
            .params
            .iter()
            .filter(|p| p.has(markers::REQUEST_PARAM) && param_name(p) != markers::PROJECTION_PARAM)
            .collect();
        let request_params = self.request_param_fields(&controller.name, &request_params)?;

        let body = match method.params.iter().find(|p| p.has(markers::REQUEST_BODY)) {
            Some(param) => Some(self.field_from_type(&controller.name, "body", &param.ty, false, false)?),
            None => None,
        };

        let can_receive_projection = method
            .params
            .iter()
            .any(|p| p.has(markers::REQUEST_PARAM) && param_name(p) == markers::PROJECTION_PARAM);

        Ok(Some(CustomEndpoint {
            base_uri: base_uri.to_string(),
            name: method.name.clone(),
            url,
            parent_type: entity,
            method: verb,
            path_variables,
            request_params,
            body,
            list: multiplicity != Multiplicity::Single,
            paging: multiplicity == Multiplicity::Paged,
            return_type,
            can_receive_projection,
            required_roles: required_roles(controller, method),
        }))
    }

    fn endpoint_return(
        &mut self,
        owner: &str,
        method: &MethodInfo,
    ) -> Result<Option<(FieldKind, Multiplicity)>, EndpointError> {
        let Some(ty) = &method.return_type else {
            return Ok(None);
        };
        if ty.simple_name() != markers::RESPONSE_ENTITY {
            return Err(EndpointError::NoResponseEntity(ty.to_string()));
        }
        let content = ty
            .args
            .first()
            .ok_or_else(|| EndpointError::NoResponseEntity(ty.to_string()))?;
        if content.simple_name() == "Void" {
            return Ok(None);
        }

        if !content.is_generic() && !content.array {
            let kind = self.return_kind(owner, &method.name, content)?;
            return Ok(Some((kind, Multiplicity::Single)));
        }

        let multiplicity = match content.simple_name() {
            markers::PAGED_MODEL => Multiplicity::Paged,
            markers::COLLECTION_MODEL => Multiplicity::List,
            markers::ENTITY_MODEL => Multiplicity::Single,
            name if content.is_generic() && markers::is_iterable(name) => Multiplicity::List,
            _ => return Err(EndpointError::UnknownResponseContent(content.to_string())),
        };

        let mut inner = content
            .args
            .first()
            .ok_or_else(|| EndpointError::UnknownResponseContent(content.to_string()))?;
        // `PagedModel<EntityModel<X>>` and `CollectionModel<EntityModel<X>>`
        if inner.simple_name() == markers::ENTITY_MODEL {
            inner = inner
                .args
                .first()
                .ok_or_else(|| EndpointError::UnknownResponseContent(content.to_string()))?;
        }
        if inner.is_generic() || inner.array {
            return Err(EndpointError::UnknownResponseContent(content.to_string()));
        }

        let kind = self.return_kind(owner, &method.name, inner)?;
        Ok(Some((kind, multiplicity)))
    }

    fn return_kind(&mut self, owner: &str, method: &str, ty: &TypeRef) -> Result<FieldKind, EndpointError> {
        let field: Field = self.field_from_type(owner, method, ty, false, false)?;
        Ok(field.kind)
    }
}

/// `(url, verb)` of a mapped method; `None` when the method is not mapped.
fn request_mapping(method: &MethodInfo) -> Result<Option<(String, HttpMethod)>, EndpointError> {
    if let Some(mapping) = method.annotation(markers::REQUEST_MAPPING) {
        let path = mapping.path().ok_or(EndpointError::MissingPath)?;
        let verb = mapping
            .ident_value("method")
            .or_else(|| mapping.str_value("method"))
            .ok_or(EndpointError::MissingMethod)?;
        let verb = HttpMethod::from_str(verb)
            .ok_or_else(|| EndpointError::UnsupportedMethod(verb.to_string()))?;
        return Ok(Some((path.to_string(), verb)));
    }

    for (marker, verb) in markers::VERB_MAPPINGS {
        if let Some(mapping) = method.annotation(marker) {
            let path = mapping.path().ok_or(EndpointError::MissingPath)?;
            let verb = HttpMethod::from_str(verb)
                .ok_or_else(|| EndpointError::UnsupportedMethod(verb.to_string()))?;
            return Ok(Some((path.to_string(), verb)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use crate::config::GeneratorConfig;
    use crate::diagnostics::{Reporter, Severity};
    use crate::domain::{CustomEndpoint, FieldKind, HttpMethod, SimpleTypeKind, TypeCategory};
    use crate::resolve::{Resolution, Resolver};
    use crate::source::ClassManifest;

    const INPUT: &str = r#"
        package shop

        @Entity class Widget { @Id id: long  @NotNull name: String }
        class WidgetStats { @NotNull count: long }
        class WidgetForm { @NotNull name: String }

        @RestController
        @RequestMapping("/api/widgets")
        @PreAuthorize("hasRole('USER')")
        class WidgetController {
            @GetMapping("/{id}/stats")
            fun stats(@PathVariable("id") id: long): ResponseEntity<WidgetStats>

            @RequestMapping(value = "/bulk", method = RequestMethod.POST)
            @PreAuthorize("hasRole('ADMIN')")
            fun bulk(@RequestBody form: WidgetForm, @RequestParam(value = "dryRun", required = false) dryRun: boolean): ResponseEntity<CollectionModel<EntityModel<Widget>>>

            @GetMapping("/page")
            fun page(@RequestParam("projection") projection: String): ResponseEntity<PagedModel<EntityModel<Widget>>>

            @DeleteMapping("/purge")
            fun purge()

            @RequestMapping("/nomethod")
            fun noMethod(): ResponseEntity<Widget>

            @PutMapping("/raw")
            fun raw(): WidgetStats

            fun helper(): String
        }

        @RestController
        @RequestMapping("/api/other")
        class UnrelatedController {
            @GetMapping("/x")
            fun x(): ResponseEntity<String>
        }
    "#;

    fn resolve() -> (Resolution, Reporter) {
        let manifest = ClassManifest::parse(INPUT).unwrap();
        let config = GeneratorConfig::default();
        let mut reporter = Reporter::new();
        let resolution = Resolver::new(&manifest, &config, &mut reporter).resolve();
        (resolution, reporter)
    }

    fn endpoints(resolution: &Resolution) -> &[CustomEndpoint] {
        let id = resolution.graph.entity_by_name("Widget").unwrap();
        &resolution.graph.get(id).unwrap().as_entity().unwrap().custom_endpoints
    }

    #[test]
    fn test_endpoints_sorted_and_filtered() {
        let (resolution, _) = resolve();
        let names: Vec<&str> = endpoints(&resolution).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["bulk", "page", "purge", "stats"]);
    }

    #[test]
    fn test_endpoint_shapes() {
        let (resolution, _) = resolve();
        let found = endpoints(&resolution);
        let widget = resolution.graph.entity_by_name("Widget").unwrap();

        let bulk = &found[0];
        assert_eq!(bulk.method, HttpMethod::Post);
        assert_eq!(bulk.url, "/bulk");
        assert_eq!(bulk.base_uri, "/api/widgets");
        assert!(bulk.list && !bulk.paging);
        assert_eq!(bulk.return_type, Some(FieldKind::Entity(widget)));
        assert_eq!(bulk.body.as_ref().unwrap().name, "body");
        assert!(matches!(bulk.body.as_ref().unwrap().kind, FieldKind::Pojo(_)));
        assert_eq!(bulk.request_params.len(), 1);
        assert!(bulk.request_params[0].optional);
        assert_eq!(bulk.required_roles, Some(vec!["ADMIN".to_string()]));

        let page = &found[1];
        assert!(page.list && page.paging);
        assert!(page.can_receive_projection);
        assert!(page.request_params.is_empty());

        let purge = &found[2];
        assert_eq!(purge.method, HttpMethod::Delete);
        assert_eq!(purge.return_type, None);

        let stats = &found[3];
        assert_eq!(stats.path_variables[0].name, "id");
        assert_eq!(
            stats.path_variables[0].kind,
            FieldKind::Simple(SimpleTypeKind::Long)
        );
        assert!(matches!(stats.return_type, Some(FieldKind::Pojo(_))));
        assert_eq!(stats.required_roles, Some(vec!["USER".to_string()]));
        assert_eq!(stats.parent_type, widget);
    }

    #[test]
    fn test_invalid_methods_warn() {
        let (resolution, reporter) = resolve();
        let warnings: Vec<&str> = reporter
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Warn && d.context.ends_with("CustomEndpointResolver"))
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("noMethod") && warnings[0].contains("HTTP method must be specified"));
        assert!(warnings[1].contains("raw") && warnings[1].contains("ResponseEntity"));

        // Pojos met along the way became graph nodes.
        assert_eq!(resolution.graph.ids(TypeCategory::Pojo).len(), 2);
    }

    #[test]
    fn test_shared_broken_body_drops_every_endpoint() {
        let input = r#"
            package shop
            @Entity class Widget { @Id id: long }
            class WidgetForm { lookup: Map<String, String>  @NotNull name: String }

            @RestController
            @RequestMapping("/api/widgets")
            class WidgetController {
                @PostMapping("/a")
                fun a(@RequestBody form: WidgetForm): ResponseEntity<Widget>
                @PostMapping("/b")
                fun b(@RequestBody form: WidgetForm): ResponseEntity<Widget>
            }
        "#;
        let manifest = ClassManifest::parse(input).unwrap();
        let config = GeneratorConfig::default();
        let mut reporter = Reporter::new();
        let resolution = Resolver::new(&manifest, &config, &mut reporter).resolve();

        assert!(endpoints(&resolution).is_empty());
        assert!(resolution.graph.ids(TypeCategory::Pojo).is_empty());
        let dropped = reporter
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Warn && d.message.contains("Map<String, String>"))
            .count();
        assert_eq!(dropped, 2);
    }
}
