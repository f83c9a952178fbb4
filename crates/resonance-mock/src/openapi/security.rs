//! Security scheme mapping for exported operations.

use super::document::{ImplicitFlow, OAuthFlows, SecurityScheme};
use crate::collection::SecuritySpec;
use std::collections::BTreeMap;

/// Placeholder emitted for OAuth2 flows; collections do not carry a real URL.
pub const OAUTH2_AUTHORIZATION_URL: &str = "https://example.com/oauth/authorize";

/// Scheme name used when the endpoint does not name its scheme.
pub fn default_scheme_name(auth_type: &str) -> String {
    match auth_type {
        "bearer" => "bearerAuth".to_string(),
        "basic" => "basicAuth".to_string(),
        "api-key" => "apiKeyAuth".to_string(),
        "oauth2" => "oauth2".to_string(),
        other => format!("{other}Auth"),
    }
}

/// Scheme name referenced by the endpoint's security requirement, or `None`
/// when the endpoint is unauthenticated.
pub fn requirement_name(security: &SecuritySpec) -> Option<String> {
    if security.auth_type.is_empty() || security.auth_type == "none" {
        return None;
    }
    Some(
        security
            .scheme_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| default_scheme_name(&security.auth_type)),
    )
}

/// Component definition for a security type; unknown types yield `None`.
pub fn scheme_for(security: &SecuritySpec) -> Option<SecurityScheme> {
    match security.auth_type.as_str() {
        "bearer" => Some(SecurityScheme::Http {
            scheme: "bearer".to_string(),
            bearer_format: Some("JWT".to_string()),
        }),
        "basic" => Some(SecurityScheme::Http {
            scheme: "basic".to_string(),
            bearer_format: None,
        }),
        "api-key" => Some(SecurityScheme::ApiKey {
            name: security
                .config_str("keyName")
                .or_else(|| security.config_str("key"))
                .unwrap_or("X-API-Key")
                .to_string(),
            location: security
                .config_str("location")
                .unwrap_or("header")
                .to_string(),
        }),
        "oauth2" => Some(SecurityScheme::OAuth2 {
            flows: OAuthFlows {
                implicit: ImplicitFlow {
                    authorization_url: OAUTH2_AUTHORIZATION_URL.to_string(),
                    scopes: BTreeMap::new(),
                },
            },
        }),
        _ => None,
    }
}
