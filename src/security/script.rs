//! Replays a recorded `configure(http)` body against the builder.

use crate::domain::HttpMethod;
use crate::error::SecurityError;
use crate::source::{Call, CallArg, CallChain, ClassInfo};

use super::SecurityConfigurer;
use super::builder::{AnyRequest, AuthorizedUrl, Csrf, HttpBasic, HttpSecurity, UrlRegistry};

const CONFIGURE: &str = "configure";
const HTTP_SECURITY: &str = "HttpSecurity";

/// Configurer whose routine is the call chains recorded in the class source.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedConfigurer {
    param: String,
    body: Vec<CallChain>,
}

impl ScriptedConfigurer {
    /// The class's `configure(http: HttpSecurity)` routine, if it has a body.
    pub fn from_class(class: &ClassInfo) -> Option<Self> {
        let method = class.methods.iter().find(|m| {
            m.name == CONFIGURE
                && m.params.len() == 1
                && m.params[0].ty.simple_name() == HTTP_SECURITY
        })?;
        Some(Self {
            param: method.params[0].name.clone(),
            body: method.body.clone()?,
        })
    }
}

impl SecurityConfigurer for ScriptedConfigurer {
    fn configure(&self, mut http: HttpSecurity<'_>) -> Result<(), SecurityError> {
        for chain in &self.body {
            if chain.receiver != self.param {
                return Err(SecurityError::UnknownReceiver(chain.receiver.clone()));
            }
            let mut stage = Stage::Http(http.reborrow());
            for call in &chain.calls {
                stage = stage.apply(call)?;
            }
        }
        Ok(())
    }
}

/// Position in the fluent chain.
enum Stage<'r> {
    Http(HttpSecurity<'r>),
    Registry(UrlRegistry<'r>),
    Authorized(AuthorizedUrl<'r>),
    AnyRequest(AnyRequest<'r>),
    Basic(HttpBasic<'r>),
    Csrf(Csrf<'r>),
}

impl<'r> Stage<'r> {
    fn receiver(&self) -> &'static str {
        match self {
            Stage::Http(_) => "HttpSecurity",
            Stage::Registry(_) => "UrlRegistry",
            Stage::Authorized(_) => "AuthorizedUrl",
            Stage::AnyRequest(_) => "AnyRequest",
            Stage::Basic(_) => "HttpBasic",
            Stage::Csrf(_) => "Csrf",
        }
    }

    fn apply(self, call: &Call) -> Result<Self, SecurityError> {
        let receiver = self.receiver();
        let next = match (self, call.method.as_str()) {
            (Stage::Http(h), "authorizeRequests") => Stage::Registry(h.authorize_requests()),
            (Stage::Http(h), "httpBasic") => Stage::Basic(h.http_basic()),
            (Stage::Http(h), "csrf") => Stage::Csrf(h.csrf()),

            (Stage::Registry(r), "antMatchers") => {
                let (method, patterns) = matcher_args(call)?;
                let patterns: Vec<&str> = patterns.iter().map(String::as_str).collect();
                Stage::Authorized(r.ant_matchers(method, &patterns))
            }
            (Stage::Registry(r), "anyRequest") => Stage::AnyRequest(r.any_request()),
            (Stage::Registry(r), "and") => Stage::Http(r.and()),

            (Stage::Authorized(a), "hasRole") => {
                let roles = string_args(call)?;
                match roles.as_slice() {
                    [role] => Stage::Registry(a.has_role(role)),
                    _ => return Err(invalid(call, roles.join(", "))),
                }
            }
            (Stage::Authorized(a), "hasAnyRole") => {
                let roles = string_args(call)?;
                let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
                Stage::Registry(a.has_any_role(&roles))
            }
            (Stage::Authorized(a), "authenticated") => Stage::Registry(a.authenticated()),
            (Stage::Authorized(a), "permitAll") => Stage::Registry(a.permit_all()),
            (Stage::Authorized(a), "anonymous") => Stage::Registry(a.anonymous()),

            (Stage::AnyRequest(a), "authenticated") => Stage::Registry(a.authenticated()),
            (Stage::AnyRequest(a), "permitAll") => Stage::Registry(a.permit_all()),
            (Stage::AnyRequest(a), "anonymous") => Stage::Registry(a.anonymous()),

            (Stage::Basic(b), "and") => Stage::Http(b.and()),
            (Stage::Basic(b), "disable") => Stage::Http(b.disable()),

            (Stage::Csrf(c), "disable") => Stage::Http(c.disable()),
            (Stage::Csrf(c), "and") => Stage::Http(c.and()),

            (_, method) => {
                return Err(SecurityError::UnmodeledCall {
                    receiver: receiver.to_string(),
                    method: method.to_string(),
                });
            }
        };
        Ok(next)
    }
}

/// `antMatchers([HttpMethod.X,] "pattern"...)`.
fn matcher_args(call: &Call) -> Result<(Option<HttpMethod>, Vec<String>), SecurityError> {
    let mut args = call.args.as_slice();
    let mut method = None;
    if let Some((CallArg::Ident(name), rest)) = args.split_first() {
        method = Some(HttpMethod::from_str(name).ok_or_else(|| invalid(call, name.clone()))?);
        args = rest;
    }
    let patterns = args
        .iter()
        .map(|arg| match arg {
            CallArg::Str(s) => Ok(s.clone()),
            other => Err(invalid(call, other.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((method, patterns))
}

fn string_args(call: &Call) -> Result<Vec<String>, SecurityError> {
    call.args
        .iter()
        .map(|arg| match arg {
            CallArg::Str(s) => Ok(s.clone()),
            other => Err(invalid(call, other.to_string())),
        })
        .collect()
}

fn invalid(call: &Call, arg: String) -> SecurityError {
    SecurityError::InvalidArgument {
        method: call.method.clone(),
        arg,
    }
}
