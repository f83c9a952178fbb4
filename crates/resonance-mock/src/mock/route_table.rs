//! Routing from incoming requests to collection endpoints.
//!
//! Templates are compiled once per rebuild. A template and a request path
//! match when they split into the same number of `/` segments and every
//! literal segment is equal as sent (case-sensitive, not decoded); `{name}`
//! and `:name` segments match any non-empty segment and capture it
//! percent-decoded.

use super::settings::endpoint_key;
use crate::collection::{Collection, Endpoint};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw.len() > 2 && raw.starts_with('{') && raw.ends_with('}') {
            Segment::Param(raw[1..raw.len() - 1].to_string())
        } else if raw.len() > 1 && raw.starts_with(':') {
            Segment::Param(raw[1..].to_string())
        } else {
            Segment::Literal(raw.to_string())
        }
    }
}

/// Compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn compile(template: &str) -> Self {
        Self {
            raw: template.to_string(),
            segments: template.split('/').map(Segment::parse).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a request path, returning captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), decode(part));
                }
            }
        }
        Some(params)
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// One routable endpoint of an enabled collection.
#[derive(Debug, Clone)]
pub struct Route {
    pub collection_id: String,
    pub collection_name: String,
    pub method: String,
    pub template: PathTemplate,
    pub endpoint: Endpoint,
}

impl Route {
    /// Settings key for this route's overrides.
    pub fn key(&self) -> String {
        endpoint_key(&self.collection_id, self.endpoint.id_or_empty())
    }
}

#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub path_params: BTreeMap<String, String>,
}

/// Ordered routes for every endpoint of the enabled collections.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from the collections whose ids are enabled. Order is
    /// collection order, then endpoint order within each collection.
    pub fn rebuild(collections: &[Collection], enabled: &BTreeSet<String>) -> Self {
        let routes = collections
            .iter()
            .filter(|c| enabled.contains(&c.id))
            .flat_map(|collection| {
                collection.all_endpoints().map(move |endpoint| Route {
                    collection_id: collection.id.clone(),
                    collection_name: collection.display_name().to_string(),
                    method: endpoint.method_upper(),
                    template: PathTemplate::compile(&endpoint.path),
                    endpoint: endpoint.clone(),
                })
            })
            .collect();
        Self { routes }
    }

    /// First route whose method (case-insensitive) and template match.
    pub fn match_route(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|route| route.method.eq_ignore_ascii_case(method))
            .find_map(|route| {
                route
                    .template
                    .matches(path)
                    .map(|path_params| RouteMatch { route, path_params })
            })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
