//! Call-recording stand-in for a fluent HTTP security builder.
//!
//! Every stage consumes itself and hands the shared [`Recorder`] to the next,
//! so a configuration routine reads like the chain it models:
//!
//! ```
//! use restgen::domain::HttpMethod;
//! use restgen::security::{HttpSecurity, Recorder};
//!
//! let mut recorder = Recorder::default();
//! HttpSecurity::new(&mut recorder)
//!     .authorize_requests()
//!     .ant_matchers(Some(HttpMethod::Post), &["/api/widgets/**"])
//!     .has_role("ADMIN")
//!     .and()
//!     .csrf()
//!     .disable();
//! assert_eq!(recorder.rules().len(), 1);
//! ```

use serde::Serialize;

use crate::domain::HttpMethod;

/// A protected endpoint: an optional verb and an ant-style URL pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoint {
    pub method: Option<HttpMethod>,
    pub url_pattern: String,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.method {
            Some(method) => write!(f, "{} {}", method, self.url_pattern),
            None => write!(f, "* {}", self.url_pattern),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recorder {
    rules: Vec<(Endpoint, Vec<String>)>,
}

impl Recorder {
    /// Recording an endpoint again replaces its roles.
    pub fn record(&mut self, endpoint: Endpoint, roles: Vec<String>) {
        match self.rules.iter_mut().find(|(e, _)| *e == endpoint) {
            Some((_, existing)) => *existing = roles,
            None => self.rules.push((endpoint, roles)),
        }
    }

    pub fn rules(&self) -> &[(Endpoint, Vec<String>)] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub struct HttpSecurity<'r> {
    recorder: &'r mut Recorder,
}

impl<'r> HttpSecurity<'r> {
    pub fn new(recorder: &'r mut Recorder) -> Self {
        Self { recorder }
    }

    /// A fresh chain start over the same recorder.
    pub fn reborrow(&mut self) -> HttpSecurity<'_> {
        HttpSecurity {
            recorder: &mut *self.recorder,
        }
    }

    pub fn authorize_requests(self) -> UrlRegistry<'r> {
        UrlRegistry {
            recorder: self.recorder,
        }
    }

    pub fn http_basic(self) -> HttpBasic<'r> {
        HttpBasic {
            recorder: self.recorder,
        }
    }

    pub fn csrf(self) -> Csrf<'r> {
        Csrf {
            recorder: self.recorder,
        }
    }
}

pub struct UrlRegistry<'r> {
    recorder: &'r mut Recorder,
}

impl<'r> UrlRegistry<'r> {
    /// Match `patterns`; a verb without patterns matches everything below the root.
    pub fn ant_matchers(self, method: Option<HttpMethod>, patterns: &[&str]) -> AuthorizedUrl<'r> {
        let patterns: Vec<&str> = if patterns.is_empty() {
            vec!["/**"]
        } else {
            patterns.to_vec()
        };
        let endpoints = patterns
            .into_iter()
            .map(|p| Endpoint {
                method,
                url_pattern: p.to_string(),
            })
            .collect();
        AuthorizedUrl {
            recorder: self.recorder,
            endpoints,
        }
    }

    /// Only role-free rules can follow: a role guard over every request has
    /// no entity operation to land on.
    pub fn any_request(self) -> AnyRequest<'r> {
        AnyRequest {
            recorder: self.recorder,
        }
    }

    pub fn and(self) -> HttpSecurity<'r> {
        HttpSecurity {
            recorder: self.recorder,
        }
    }
}

pub struct AuthorizedUrl<'r> {
    recorder: &'r mut Recorder,
    endpoints: Vec<Endpoint>,
}

impl<'r> AuthorizedUrl<'r> {
    pub fn has_role(self, role: &str) -> UrlRegistry<'r> {
        self.has_any_role(&[role])
    }

    pub fn has_any_role(self, roles: &[&str]) -> UrlRegistry<'r> {
        let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
        for endpoint in self.endpoints {
            self.recorder.record(endpoint, roles.clone());
        }
        UrlRegistry {
            recorder: self.recorder,
        }
    }

    pub fn authenticated(self) -> UrlRegistry<'r> {
        self.without_roles()
    }

    pub fn permit_all(self) -> UrlRegistry<'r> {
        self.without_roles()
    }

    pub fn anonymous(self) -> UrlRegistry<'r> {
        self.without_roles()
    }

    fn without_roles(self) -> UrlRegistry<'r> {
        UrlRegistry {
            recorder: self.recorder,
        }
    }
}

pub struct AnyRequest<'r> {
    recorder: &'r mut Recorder,
}

impl<'r> AnyRequest<'r> {
    pub fn authenticated(self) -> UrlRegistry<'r> {
        self.registry()
    }

    pub fn permit_all(self) -> UrlRegistry<'r> {
        self.registry()
    }

    pub fn anonymous(self) -> UrlRegistry<'r> {
        self.registry()
    }

    fn registry(self) -> UrlRegistry<'r> {
        UrlRegistry {
            recorder: self.recorder,
        }
    }
}

pub struct HttpBasic<'r> {
    recorder: &'r mut Recorder,
}

impl<'r> HttpBasic<'r> {
    pub fn and(self) -> HttpSecurity<'r> {
        HttpSecurity {
            recorder: self.recorder,
        }
    }

    pub fn disable(self) -> HttpSecurity<'r> {
        self.and()
    }
}

pub struct Csrf<'r> {
    recorder: &'r mut Recorder,
}

impl<'r> Csrf<'r> {
    pub fn disable(self) -> HttpSecurity<'r> {
        HttpSecurity {
            recorder: self.recorder,
        }
    }

    pub fn and(self) -> HttpSecurity<'r> {
        self.disable()
    }
}
