//! Leveled diagnostics with component context and a run-wide error flag.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub context: String,
    pub message: String,
}

/// How loudly a questionable but legal construct is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticsLevel {
    Allow,
    #[default]
    Warn,
    Error,
}

impl DiagnosticsLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Some(Self::Allow),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Implicit-nullability check for one member.
///
/// Returns nothing when the member is fine or the level is `Allow`.
pub fn check_implicit_nullable(
    level: DiagnosticsLevel,
    implicitly_nullable: bool,
    context: &str,
    class: &str,
    member: &str,
) -> Vec<Diagnostic> {
    let severity = match level {
        DiagnosticsLevel::Allow => return Vec::new(),
        DiagnosticsLevel::Warn => Severity::Warn,
        DiagnosticsLevel::Error => Severity::Error,
    };
    if !implicitly_nullable {
        return Vec::new();
    }

    let hint = match level {
        DiagnosticsLevel::Warn => "set implicit_nullable to allow to hide this warning",
        _ => "set implicit_nullable to warn to continue despite missing annotations",
    };
    vec![Diagnostic {
        severity,
        context: context.to_string(),
        message: format!(
            "Field \"{}\" in \"{}\" is implicitly nullable. Add @Nullable if this is intentional or @NotNull otherwise ({})",
            member, class, hint
        ),
    }]
}

/// Collects diagnostics of one run and forwards them to `tracing`.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
    errors_encountered: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        let Diagnostic {
            severity,
            context,
            message,
        } = &diagnostic;
        match severity {
            Severity::Debug => tracing::debug!(context = %context, "{}", message),
            Severity::Info => tracing::info!(context = %context, "{}", message),
            Severity::Warn => tracing::warn!(context = %context, "{}", message),
            Severity::Error => tracing::error!(context = %context, "{}", message),
        }
        if *severity == Severity::Error {
            self.errors_encountered = true;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.record(diagnostic);
        }
    }

    fn log(&mut self, severity: Severity, context: &str, message: impl Into<String>) {
        self.record(Diagnostic {
            severity,
            context: context.to_string(),
            message: message.into(),
        });
    }

    pub fn debug(&mut self, context: &str, message: impl Into<String>) {
        self.log(Severity::Debug, context, message);
    }

    pub fn info(&mut self, context: &str, message: impl Into<String>) {
        self.log(Severity::Info, context, message);
    }

    pub fn warn(&mut self, context: &str, message: impl Into<String>) {
        self.log(Severity::Warn, context, message);
    }

    pub fn error(&mut self, context: &str, message: impl Into<String>) {
        self.log(Severity::Error, context, message);
    }

    pub fn with_context(&mut self, context: &str) -> Scope<'_> {
        Scope {
            reporter: self,
            context: context.to_string(),
        }
    }

    pub fn errors_encountered(&self) -> bool {
        self.errors_encountered
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// A reporter bound to a component context; nests as `Outer/Inner`.
pub struct Scope<'r> {
    reporter: &'r mut Reporter,
    context: String,
}

impl Scope<'_> {
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn with_context(&mut self, context: &str) -> Scope<'_> {
        Scope {
            context: format!("{}/{}", self.context, context),
            reporter: &mut *self.reporter,
        }
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.reporter.debug(&self.context, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.reporter.info(&self.context, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.reporter.warn(&self.context, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.reporter.error(&self.context, message);
    }
}
