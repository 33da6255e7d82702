//! Domain model resolution: classes in, typed graph out.

mod endpoint;
mod field;
mod search;
mod types;

use std::collections::HashMap;

use crate::config::GeneratorConfig;
use crate::diagnostics::Reporter;
use crate::domain::DomainTypeGraph;
use crate::error::ResolveError;
use crate::source::{ClassInfo, ClassSource, MethodInfo, markers};
use crate::domain::api::parse_roles;

const ENTITY_CONTEXT: &str = "Resolver/EntityResolver";
const PROJECTION_CONTEXT: &str = "Resolver/ProjectionResolver";
const EMBEDDABLE_CONTEXT: &str = "Resolver/EmbeddableResolver";
const POJO_CONTEXT: &str = "Resolver/PojoResolver";
const SEARCH_CONTEXT: &str = "Resolver/SearchResolver";
const CUSTOM_SEARCH_CONTEXT: &str = "Resolver/CustomSearchResolver";
const ENDPOINT_CONTEXT: &str = "Resolver/CustomEndpointResolver";

/// Outcome of a resolution pass.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub graph: DomainTypeGraph,
    /// Fatal problems; each one was also reported as an error diagnostic.
    pub errors: Vec<ResolveError>,
}

pub struct Resolver<'a> {
    source: &'a dyn ClassSource,
    config: &'a GeneratorConfig,
    reporter: &'a mut Reporter,
    graph: DomainTypeGraph,
    errors: Vec<ResolveError>,
    /// Pojo classes whose fields could not be mapped, by qualified name.
    failed_pojos: HashMap<String, ResolveError>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        source: &'a dyn ClassSource,
        config: &'a GeneratorConfig,
        reporter: &'a mut Reporter,
    ) -> Self {
        Self {
            source,
            config,
            reporter,
            graph: DomainTypeGraph::new(),
            errors: Vec::new(),
            failed_pojos: HashMap::new(),
        }
    }

    pub fn resolve(mut self) -> Resolution {
        let entities = self.create_entity_stubs();
        let projections = self.create_projection_stubs();
        let embeddables = self.create_embeddable_stubs();

        for (id, class) in &entities {
            self.populate_fields(*id, class);
        }
        for (id, class) in &projections {
            self.populate_fields(*id, class);
        }
        for (id, class) in &embeddables {
            self.populate_fields(*id, class);
        }

        self.warn_if_empty(entities.len(), projections.len());
        self.warn_missing_base_projections();

        self.add_repository_searches();
        self.add_custom_searches();
        self.add_custom_endpoints();

        Resolution {
            graph: self.graph,
            errors: self.errors,
        }
    }

    fn load(&self, name: &str) -> Option<&'a ClassInfo> {
        self.source.load(name)
    }

    fn fail(&mut self, context: &str, error: ResolveError) {
        self.reporter.error(context, error.to_string());
        self.errors.push(error);
    }
}

/// Roles of a `PreAuthorize` marker; the method level wins over the class level.
fn required_roles(class: &ClassInfo, method: &MethodInfo) -> Option<Vec<String>> {
    method
        .annotation(markers::PRE_AUTHORIZE)
        .or_else(|| class.annotation(markers::PRE_AUTHORIZE))
        .and_then(|a| a.str_value("value"))
        .filter(|expr| expr.contains("Role"))
        .map(parse_roles)
}

/// Methods sorted by name, for deterministic output.
fn sorted_methods(class: &ClassInfo) -> Vec<&MethodInfo> {
    let mut methods: Vec<&MethodInfo> = class.methods.iter().collect();
    methods.sort_by(|a, b| a.name.cmp(&b.name));
    methods
}
