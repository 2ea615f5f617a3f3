//! Path matching rules.
//!
//! # Responsibilities
//! - Compile literal, regular-expression and glob path rules
//! - Evaluate a compiled rule against a concrete path
//! - Group interceptor rules into a set with OR semantics
//!
//! # Design Decisions
//! - Paths are case-sensitive
//! - Regex patterns are anchored: a route pattern must match the *whole* path
//! - Glob `*` crosses `/`, so `/profile/*` also covers `/profile/42/edit`
//! - Compilation happens once at registration, never on the lookup path

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;

use crate::error::{RouterError, RouterResult};

/// Trait for matching paths against a compiled rule.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path satisfies this rule.
    fn matches(&self, path: &str) -> bool;
}

/// A single compiled path rule.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Literal path, compared byte for byte.
    Exact(String),
    /// Regular expression that must match the full path.
    Regex { source: String, regex: Regex },
    /// Shell-style glob.
    Glob { source: String, glob: globset::GlobMatcher },
}

impl PathPattern {
    pub fn exact(path: impl Into<String>) -> Self {
        PathPattern::Exact(path.into())
    }

    /// Compile a regular expression route pattern.
    ///
    /// The expression is wrapped in `^(?:...)$`, so `/item/\d+` and
    /// `^/item/\d+$` compile to equivalent matchers.
    pub fn regex(pattern: &str) -> RouterResult<Self> {
        let anchored = format!("^(?:{})$", pattern);
        let regex = Regex::new(&anchored).map_err(|e| RouterError::invalid_pattern(pattern, e))?;
        Ok(PathPattern::Regex {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Compile a glob rule such as `/profile/*`.
    pub fn glob(pattern: &str) -> RouterResult<Self> {
        let glob = Glob::new(pattern).map_err(|e| RouterError::invalid_pattern(pattern, e))?;
        Ok(PathPattern::Glob {
            source: pattern.to_string(),
            glob: glob.compile_matcher(),
        })
    }

    /// Compile an interceptor rule: globs when the rule carries glob
    /// metacharacters, literal paths otherwise.
    pub fn rule(rule: &str) -> RouterResult<Self> {
        if is_glob(rule) {
            Self::glob(rule)
        } else {
            Ok(Self::exact(rule))
        }
    }

    /// The text this pattern was compiled from.
    pub fn source(&self) -> &str {
        match self {
            PathPattern::Exact(path) => path,
            PathPattern::Regex { source, .. } => source,
            PathPattern::Glob { source, .. } => source,
        }
    }
}

impl Matcher for PathPattern {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(expected) => expected == path,
            PathPattern::Regex { regex, .. } => regex.is_match(path),
            PathPattern::Glob { glob, .. } => glob.is_match(path),
        }
    }
}

fn is_glob(rule: &str) -> bool {
    rule.contains(['*', '?', '[', '{'])
}

/// A set of interceptor rules combined with OR semantics.
///
/// Literal rules are kept apart from globs so the common case of a handful of
/// exact paths never touches the glob engine.
#[derive(Debug, Clone)]
pub struct PatternSet {
    literals: Vec<String>,
    globs: GlobSet,
    sources: Vec<String>,
}

impl PatternSet {
    /// Compile every rule. Fails on the first rule that does not compile.
    pub fn compile<I, S>(rules: I) -> RouterResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut literals = Vec::new();
        let mut sources = Vec::new();
        let mut builder = GlobSetBuilder::new();

        for rule in rules {
            let rule = rule.as_ref();
            if is_glob(rule) {
                let glob = Glob::new(rule).map_err(|e| RouterError::invalid_pattern(rule, e))?;
                builder.add(glob);
            } else {
                literals.push(rule.to_string());
            }
            sources.push(rule.to_string());
        }

        let globs = builder
            .build()
            .map_err(|e| RouterError::invalid_pattern(&sources.join(","), e))?;

        Ok(Self {
            literals,
            globs,
            sources,
        })
    }

    pub fn empty() -> Self {
        Self {
            literals: Vec::new(),
            globs: GlobSet::empty(),
            sources: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The original rule strings, in declaration order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}

impl Matcher for PatternSet {
    fn matches(&self, path: &str) -> bool {
        self.literals.iter().any(|l| l == path) || self.globs.is_match(path)
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::empty()
    }
}
