//! `${NAME}` reference expansion.
//!
//! Expansion is a depth-first walk over the overlay snapshot. The names
//! currently being expanded are kept in an explicit [`ResolutionPath`], which
//! is what detects cycles and bounds nesting; nothing here touches a store.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{Result, SecretError};
use crate::overlay::{OverlayResolver, Precedence};
use crate::types::SecretRecord;

/// Matches `${IDENT}` where IDENT is `[A-Za-z0-9_]+`.
static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("invalid reference regex"));

/// Default maximum number of nested reference hops.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Names of every reference in `raw`, in order of appearance.
pub fn references(raw: &str) -> impl Iterator<Item = &str> {
    REFERENCE
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Stack of names being expanded, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionPath {
    names: Vec<String>,
}

impl ResolutionPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path seeded with the top-level secret.
    pub fn starting_at(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.names.pop()
    }

    /// Number of names on the path.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The current path followed by `next`, for cycle diagnostics.
    pub fn chain_with(&self, next: &str) -> Vec<String> {
        let mut chain = self.names.clone();
        chain.push(next.to_string());
        chain
    }
}

/// Expands references against an overlay snapshot.
#[derive(Debug)]
pub struct Interpolator<'a> {
    overlay: &'a OverlayResolver,
    max_depth: usize,
}

impl<'a> Interpolator<'a> {
    pub fn new(overlay: &'a OverlayResolver, max_depth: usize) -> Self {
        Self { overlay, max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Fully expand `record`'s value.
    ///
    /// The result never contains a reference that could have been expanded:
    /// any missing target, cycle, or over-deep chain fails the whole call.
    pub fn resolve(&self, record: &SecretRecord) -> Result<String> {
        let mut visiting = ResolutionPath::starting_at(&record.name);
        self.resolve_value(record, &mut visiting)
    }

    /// Expand `record`'s value given the names already being expanded.
    ///
    /// `visiting` must include `record.name` itself. It is restored to its
    /// incoming state on success.
    pub fn resolve_value(&self, record: &SecretRecord, visiting: &mut ResolutionPath) -> Result<String> {
        let raw = record.raw_value.as_str();
        let precedence = Precedence::for_references();
        let mut out = String::with_capacity(raw.len());
        let mut last = 0;

        for caps in REFERENCE.captures_iter(raw) {
            let (Some(token), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();

            if visiting.contains(name) {
                return Err(SecretError::CircularReference {
                    chain: visiting.chain_with(name),
                });
            }
            if visiting.len() > self.max_depth {
                return Err(SecretError::MaxDepthExceeded {
                    name: name.to_string(),
                    limit: self.max_depth,
                });
            }

            let target = self.overlay.resolve_single(name, precedence)?;
            debug!(
                from = %record.name,
                to = %name,
                depth = visiting.len(),
                "expanding reference"
            );

            visiting.push(name);
            let value = self.resolve_value(target, visiting)?;
            visiting.pop();

            out.push_str(&raw[last..token.start()]);
            out.push_str(&value);
            last = token.end();
        }

        out.push_str(&raw[last..]);
        Ok(out)
    }
}
