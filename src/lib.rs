pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod resolve;
pub mod security;
pub mod source;

use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use config::GeneratorConfig;
pub use diagnostics::{Diagnostic, DiagnosticsLevel, Reporter, Severity};
pub use domain::{DomainModel, ModelOptions};
pub use error::GenerateError;

use resolve::Resolver;
use security::ConfigurerRegistry;
use source::{ClassManifest, ClassSource};

/// A successful run: the model and everything that was reported on the way.
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub model: DomainModel,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve the domain model of `source` and attach its security rules.
///
/// Problems are reported as they are found; the run fails only at the end,
/// when at least one error was recorded.
pub fn generate(
    source: &dyn ClassSource,
    config: &GeneratorConfig,
    registry: &ConfigurerRegistry,
) -> Result<Generation, GenerateError> {
    let mut reporter = Reporter::new();

    let mut graph = Resolver::new(source, config, &mut reporter).resolve().graph;
    security::extract_security(source, config, registry, &mut graph, &mut reporter);

    if reporter.errors_encountered() {
        return Err(GenerateError::Failed {
            count: reporter.error_count(),
        });
    }

    tracing::info!(
        types = graph.len(),
        warnings = reporter.count(Severity::Warn),
        "Domain model resolved"
    );

    let model = DomainModel {
        options: ModelOptions {
            dates_as_string: config.dates_as_string,
            rest_base_path: config.base_path().to_string(),
        },
        graph,
    };
    Ok(Generation {
        model,
        diagnostics: reporter.into_diagnostics(),
    })
}

/// Parse a class manifest and run [`generate`] over it.
pub fn generate_from_manifest(
    manifest: &str,
    config: &GeneratorConfig,
) -> Result<Generation, GenerateError> {
    let source = ClassManifest::parse(manifest)?;
    generate(&source, config, &ConfigurerRegistry::new())
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Resolve a class manifest to the model as JSON
#[wasm_bindgen(js_name = "resolveModel")]
pub fn resolve_model(manifest: &str, config_json: Option<String>) -> Result<String, String> {
    let config = match config_json.as_deref() {
        Some(json) => GeneratorConfig::from_json(json).map_err(|e| e.to_string())?,
        None => GeneratorConfig::default(),
    };
    let generation = generate_from_manifest(manifest, &config).map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&generation.model).map_err(|e| e.to_string())
}
