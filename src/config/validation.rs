//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every route pattern and interceptor rule up front
//! - Detect duplicate routes and interceptors that can never run
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before a manifest is applied to a router

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{GuardKind, RouterConfig};
use crate::routing::{PathPattern, PatternSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route #{index} has an empty path")]
    EmptyPath { index: usize },

    #[error("route `{path}` has an empty target")]
    EmptyTarget { path: String },

    #[error("route `{path}` is defined more than once")]
    DuplicateRoute { path: String },

    #[error("route `{path}` has an invalid pattern: {reason}")]
    InvalidRoutePattern { path: String, reason: String },

    #[error("interceptor #{index} has an empty name")]
    EmptyInterceptorName { index: usize },

    #[error("interceptor `{name}` has an invalid rule: {reason}")]
    InvalidRule { name: String, reason: String },

    #[error("interceptor `{name}` is not global and has no patterns, so it never runs")]
    UnreachableInterceptor { name: String },

    #[error("interceptor `{name}` requires parameters but lists no keys")]
    MissingKeys { name: String },

    #[error("invalid metrics address `{address}`")]
    InvalidMetricsAddress { address: String },
}

pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.path.is_empty() {
            errors.push(ValidationError::EmptyPath { index });
            continue;
        }
        if route.target.is_empty() {
            errors.push(ValidationError::EmptyTarget {
                path: route.path.clone(),
            });
        }
        if !seen.insert(route.path.as_str()) {
            errors.push(ValidationError::DuplicateRoute {
                path: route.path.clone(),
            });
        }
        if route.pattern {
            if let Err(e) = PathPattern::regex(&route.path) {
                errors.push(ValidationError::InvalidRoutePattern {
                    path: route.path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    for (index, interceptor) in config.interceptors.iter().enumerate() {
        if interceptor.name.trim().is_empty() {
            errors.push(ValidationError::EmptyInterceptorName { index });
            continue;
        }
        for rules in [&interceptor.patterns, &interceptor.excludes] {
            if let Err(e) = PatternSet::compile(rules) {
                errors.push(ValidationError::InvalidRule {
                    name: interceptor.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
        if !interceptor.global && interceptor.patterns.is_empty() {
            errors.push(ValidationError::UnreachableInterceptor {
                name: interceptor.name.clone(),
            });
        }
        if interceptor.kind == GuardKind::RequireParams && interceptor.keys.is_empty() {
            errors.push(ValidationError::MissingKeys {
                name: interceptor.name.clone(),
            });
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress {
            address: observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
