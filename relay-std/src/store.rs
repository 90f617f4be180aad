//! Per-contract descriptor snapshots.

use std::collections::BTreeMap;

use relay_core::{ConfigError, DiscoveryError, RelayError, ResolutionError};

use crate::registration::{ExtensionKind, ExtensionRegistration};

/// Everything the loader learned about one contract: named rows, the
/// default, the adaptive slot, decorators, activation rules, and every
/// recorded per-line failure.
///
/// Stores are immutable snapshots. Programmatic registration clones the
/// current snapshot, mutates the clone and swaps it in.
#[derive(Clone)]
pub(crate) struct DescriptorStore {
    point: &'static str,
    pub(crate) names: BTreeMap<String, &'static ExtensionRegistration>,
    pub(crate) default_name: Option<String>,
    pub(crate) adaptive: Option<&'static ExtensionRegistration>,
    pub(crate) decorators: Vec<&'static ExtensionRegistration>,
    pub(crate) activates: Vec<(String, &'static ExtensionRegistration)>,
    pub(crate) failures: BTreeMap<String, String>,
}

impl DescriptorStore {
    pub(crate) fn new(point: &'static str, default_name: Option<String>) -> Self {
        Self {
            point,
            names: BTreeMap::new(),
            default_name,
            adaptive: None,
            decorators: Vec::new(),
            activates: Vec::new(),
            failures: BTreeMap::new(),
        }
    }

    pub(crate) fn point(&self) -> &'static str {
        self.point
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&'static ExtensionRegistration> {
        self.names.get(name).copied()
    }

    /// Registers a named row. Same implementation again is a no-op; a
    /// different implementation is refused unless `overriding`.
    pub(crate) fn register_named(
        &mut self,
        name: &str,
        row: &'static ExtensionRegistration,
        overriding: bool,
    ) -> Result<(), DiscoveryError> {
        if let Some(existing) = self.names.get(name) {
            if existing.impl_id == row.impl_id {
                return Ok(());
            }
            if !overriding {
                return Err(DiscoveryError::DuplicateName {
                    name: name.to_string(),
                    existing: existing.type_key,
                    offered: row.type_key,
                });
            }
        }
        self.names.insert(name.to_string(), row);
        Ok(())
    }

    /// Records an activation rule under the row's first alias.
    pub(crate) fn register_activate(&mut self, name: &str, row: &'static ExtensionRegistration) {
        self.activates.retain(|(n, _)| n != name);
        self.activates.push((name.to_string(), row));
    }

    /// Adds a decorator row, de-duplicated by implementation identity.
    pub(crate) fn register_decorator(&mut self, row: &'static ExtensionRegistration) {
        if !self.decorators.iter().any(|d| d.impl_id == row.impl_id) {
            self.decorators.push(row);
        }
    }

    /// Fills the adaptive slot. A second, different implementation is a
    /// fatal conflict unless `overriding`.
    pub(crate) fn register_adaptive(
        &mut self,
        row: &'static ExtensionRegistration,
        overriding: bool,
    ) -> Result<(), ConfigError> {
        match self.adaptive {
            None => {
                self.adaptive = Some(row);
                Ok(())
            }
            Some(existing) if existing.impl_id == row.impl_id => Ok(()),
            Some(existing) => {
                if overriding {
                    self.adaptive = Some(row);
                    Ok(())
                } else {
                    Err(ConfigError::AdaptiveConflict {
                        point: self.point,
                        kept: existing.type_key,
                        offered: row.type_key,
                    })
                }
            }
        }
    }

    pub(crate) fn record_failure(&mut self, line: &str, cause: String) {
        // First recorded cause per line wins.
        self.failures.entry(line.to_string()).or_insert(cause);
    }

    /// Renders the not-found error for `name`, listing the recorded
    /// failures whose line mentions the name (else all recorded failures)
    /// as numbered possible causes.
    pub(crate) fn not_found(&self, name: &str) -> RelayError {
        let needle = name.to_ascii_lowercase();
        let mut matched: Vec<(&String, &String)> = self
            .failures
            .iter()
            .filter(|(line, _)| line.to_ascii_lowercase().contains(&needle))
            .collect();
        if matched.is_empty() {
            matched = self.failures.iter().collect();
        }
        let causes = if matched.is_empty() {
            String::new()
        } else {
            let rendered = matched
                .iter()
                .enumerate()
                .map(|(i, (line, cause))| format!("({}) {line}: {cause}", i + 1))
                .collect::<Vec<_>>()
                .join(", ");
            format!(", possible causes: {rendered}")
        };
        ResolutionError::NotFound {
            point: self.point,
            name: name.to_string(),
            causes,
        }
        .into()
    }

    /// Decorators applicable to `name`, sorted ascending by priority so a
    /// fold leaves the highest priority decorator outermost.
    pub(crate) fn decorators_for(&self, name: &str) -> Vec<&'static ExtensionRegistration> {
        let mut applicable: Vec<&'static ExtensionRegistration> = self
            .decorators
            .iter()
            .copied()
            .filter(|row| match &row.kind {
                ExtensionKind::Decorator { only, except, .. } => {
                    (only.is_empty() || only.contains(&name)) && !except.contains(&name)
                }
                _ => false,
            })
            .collect();
        applicable.sort_by_key(|row| row.priority);
        applicable
    }
}
