//! Security rule extraction.
//!
//! The single configuration class is instantiated, its `configure` routine
//! runs once against a recording builder, and each recorded pattern is
//! mapped onto the operations of the entity it addresses. Roles declared
//! with `PreAuthorize` on searches and custom endpoints are folded in as
//! well. Failures before the mapping step only cost the security data.

pub mod builder;
pub mod matcher;
pub mod script;

use std::collections::HashMap;

pub use builder::{
    AnyRequest, AuthorizedUrl, Csrf, Endpoint, HttpBasic, HttpSecurity, Recorder, UrlRegistry,
};
pub use script::ScriptedConfigurer;

use crate::config::GeneratorConfig;
use crate::diagnostics::{Reporter, Scope};
use crate::domain::{DomainTypeGraph, EntitySecurity, TypeCategory};
use crate::error::SecurityError;
use crate::source::{ClassInfo, ClassSource};

const CONTEXT: &str = "SecurityExtractor";

/// A security configuration routine.
pub trait SecurityConfigurer {
    fn configure(&self, http: HttpSecurity<'_>) -> Result<(), SecurityError>;
}

/// Zero-argument constructor of a configurer.
pub type ConfigurerFactory = fn() -> Box<dyn SecurityConfigurer>;

/// Native configurers keyed by qualified or simple class name.
#[derive(Clone, Default)]
pub struct ConfigurerRegistry {
    factories: HashMap<String, ConfigurerFactory>,
}

impl ConfigurerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class_name: impl Into<String>, factory: ConfigurerFactory) {
        self.factories.insert(class_name.into(), factory);
    }

    fn get(&self, class: &ClassInfo) -> Option<ConfigurerFactory> {
        self.factories
            .get(&class.name)
            .or_else(|| self.factories.get(&class.simple_name))
            .copied()
    }
}

/// Run the configuration routine and return what it recorded.
pub fn record_rules(
    source: &dyn ClassSource,
    config: &GeneratorConfig,
    registry: &ConfigurerRegistry,
) -> Result<Recorder, SecurityError> {
    let superclass = &config.security.configurer_superclass;
    let candidates = source.subclasses_of(superclass);
    let class = match candidates.as_slice() {
        [] => return Err(SecurityError::NoConfiguration(superclass.clone())),
        [class] => *class,
        many => {
            return Err(SecurityError::MultipleConfigurations {
                superclass: superclass.clone(),
                classes: many.iter().map(|c| c.name.clone()).collect(),
            });
        }
    };

    if !class.has_default_constructor() {
        return Err(SecurityError::NoDefaultConstructor(class.name.clone()));
    }

    let configurer: Box<dyn SecurityConfigurer> = match registry.get(class) {
        Some(factory) => factory(),
        None => Box::new(
            ScriptedConfigurer::from_class(class)
                .ok_or_else(|| SecurityError::MissingConfigure(class.name.clone()))?,
        ),
    };

    let mut recorder = Recorder::default();
    configurer.configure(HttpSecurity::new(&mut recorder))?;
    Ok(recorder)
}

/// Attach security rules to the entities of `graph`.
pub fn extract_security(
    source: &dyn ClassSource,
    config: &GeneratorConfig,
    registry: &ConfigurerRegistry,
    graph: &mut DomainTypeGraph,
    reporter: &mut Reporter,
) {
    let mut scope = reporter.with_context(CONTEXT);
    if !config.security.enabled {
        scope.debug("Security extraction is disabled");
        return;
    }

    match record_rules(source, config, registry) {
        Ok(recorder) => apply_rules(&recorder, config.base_path(), graph, &mut scope),
        Err(e) => scope.warn(format!(
            "{:#}. Security features will not be available in the generated code",
            anyhow::Error::new(e)
        )),
    }

    fold_required_roles(graph);
}

fn apply_rules(recorder: &Recorder, base_path: &str, graph: &mut DomainTypeGraph, scope: &mut Scope<'_>) {
    let entities = graph.ids(TypeCategory::Entity);

    for (endpoint, roles) in recorder.rules() {
        let mut matched = false;
        for &id in &entities {
            let Some(node) = graph.get(id) else { continue };
            let fields: Vec<&str> = node.entity_fields().map(|f| f.name.as_str()).collect();
            let Some(ops) = matcher::endpoint_operations(endpoint, base_path, &node.name_rest, &fields)
            else {
                continue;
            };

            matched = true;
            if let Some(entity) = graph.entity_mut(id) {
                entity
                    .security
                    .extend(ops.into_iter().map(|op| EntitySecurity::new(op, roles.clone())));
            }
        }

        if !matched {
            scope.debug(format!("Pattern {} does not address any entity", endpoint));
        }
    }
}

/// Roles declared on searches and custom endpoints, keyed by their names.
fn fold_required_roles(graph: &mut DomainTypeGraph) {
    for id in graph.ids(TypeCategory::Entity) {
        let Some(entity) = graph.entity_mut(id) else { continue };
        let declared: Vec<EntitySecurity> = entity
            .searches
            .iter()
            .filter_map(|s| s.required_roles.as_ref().map(|r| (&s.name, r)))
            .chain(
                entity
                    .custom_endpoints
                    .iter()
                    .filter_map(|e| e.required_roles.as_ref().map(|r| (&e.name, r))),
            )
            .map(|(name, roles)| EntitySecurity::new(name.as_str(), roles.clone()))
            .collect();
        entity.security.extend(declared);
    }
}
