//! Declaration scanning: strategies -> sources -> lines -> classified rows.

use std::any::TypeId;
use std::collections::HashMap;

use relay_core::{ConfigError, DiscoveryError, ExtensionPoint, RelayError};

use crate::host::{ExtensionHost, ScanFlags};
use crate::registration::{DeclarationSource, ExtensionKind, ExtensionRegistration, StrategyRegistration};
use crate::store::DescriptorStore;
use crate::strategy::strategies;

/// Builds the descriptor store for `P` from every configured source.
pub(crate) fn load_store<P: ExtensionPoint + ?Sized>(
    host: &ExtensionHost,
) -> Result<DescriptorStore, RelayError> {
    let mut store = DescriptorStore::new(P::NAME, parse_default(P::NAME, P::DEFAULT_NAME)?);
    let rows = rows_for(TypeId::of::<P>());
    let flags = host.scan_flags();

    for strategy in strategies() {
        if flags.contains(ScanFlags::EMBEDDED) {
            let mut sources: Vec<&'static DeclarationSource> =
                inventory::iter::<DeclarationSource>
                    .into_iter()
                    .filter(|s| s.location == strategy.location && s.point_name == P::NAME)
                    .collect();
            sources.sort_by_key(|s| s.origin);
            for source in sources {
                consume(&mut store, &rows, strategy, source.origin, source.text)?;
            }
        }
        if flags.contains(ScanFlags::FILESYSTEM) {
            for root in host.roots() {
                let path = root.join(strategy.location).join(P::NAME);
                match std::fs::read_to_string(&path) {
                    Ok(text) => {
                        consume(&mut store, &rows, strategy, &path.display().to_string(), &text)?;
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => {
                        tracing::error!(
                            path = %path.display(),
                            error = %err,
                            "failed to read declaration file"
                        );
                    }
                }
            }
        }
    }
    Ok(store)
}

/// All registration rows, indexed by reference string, for one contract.
fn rows_for(point: TypeId) -> HashMap<&'static str, &'static ExtensionRegistration> {
    inventory::iter::<ExtensionRegistration>
        .into_iter()
        .filter(|row| row.point == point)
        .map(|row| (row.type_key, row))
        .collect()
}

/// Parses and classifies one declaration text. Per-line failures are
/// recorded and logged; adaptive conflicts abort the whole build.
fn consume(
    store: &mut DescriptorStore,
    rows: &HashMap<&'static str, &'static ExtensionRegistration>,
    strategy: &StrategyRegistration,
    origin: &str,
    text: &str,
) -> Result<(), RelayError> {
    for raw in text.lines() {
        let line = clean_line(raw);
        if line.is_empty() {
            continue;
        }
        if let Err(err) = consume_line(store, rows, strategy, line) {
            if matches!(err, RelayError::Config(_)) {
                return Err(err);
            }
            tracing::error!(
                point = store.point(),
                origin,
                line,
                error = %err,
                "failed to load extension declaration"
            );
            store.record_failure(line, err.to_string());
        }
    }
    Ok(())
}

fn consume_line(
    store: &mut DescriptorStore,
    rows: &HashMap<&'static str, &'static ExtensionRegistration>,
    strategy: &StrategyRegistration,
    line: &str,
) -> Result<(), RelayError> {
    let (name_part, key) = match line.find('=') {
        Some(at) => (line[..at].trim(), line[at + 1..].trim()),
        None => ("", line),
    };
    if key.is_empty() {
        return Err(DiscoveryError::MissingReference.into());
    }
    if strategy.excluded.iter().any(|prefix| key.starts_with(prefix)) {
        return Ok(());
    }

    let Some(row) = rows.get(key).copied() else {
        // Distinguish a typo from a reference that belongs elsewhere.
        let foreign = inventory::iter::<ExtensionRegistration>
            .into_iter()
            .find(|r| r.type_key == key);
        return Err(match foreign {
            Some(other) => DiscoveryError::ForeignReference {
                key: key.to_string(),
                other: other.point_name,
            }
            .into(),
            None => DiscoveryError::UnknownReference {
                key: key.to_string(),
            }
            .into(),
        });
    };

    match &row.kind {
        ExtensionKind::Adaptive { .. } => {
            store.register_adaptive(row, strategy.overridden)?;
        }
        ExtensionKind::Decorator { .. } => {
            // Decorator lines never register names.
            store.register_decorator(row);
        }
        ExtensionKind::Normal { .. } => {
            let names: Vec<&str> = if name_part.is_empty() {
                match row.fallback_name {
                    Some(name) => vec![name],
                    None => {
                        return Err(DiscoveryError::Underivable {
                            key: key.to_string(),
                        }
                        .into());
                    }
                }
            } else {
                split_names(name_part)
            };
            for (index, name) in names.iter().enumerate() {
                if index == 0 && row.activation.is_some() {
                    store.register_activate(name, row);
                }
                store.register_named(name, row, strategy.overridden)?;
            }
        }
    }
    Ok(())
}

/// Strips the `#` comment and surrounding whitespace.
pub(crate) fn clean_line(raw: &str) -> &str {
    let uncommented = match raw.find('#') {
        Some(at) => &raw[..at],
        None => raw,
    };
    uncommented.trim()
}

/// Splits an alias list on commas and whitespace.
pub(crate) fn split_names(part: &str) -> Vec<&str> {
    part.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Validates a contract's declared default name. Multiple tokens are a
/// fatal configuration error; the literal `true` counts as no default.
fn parse_default(
    point: &'static str,
    declared: Option<&'static str>,
) -> Result<Option<String>, RelayError> {
    let Some(declared) = declared else {
        return Ok(None);
    };
    let tokens = split_names(declared);
    match tokens.as_slice() {
        [] => Ok(None),
        [one] => {
            if *one == "true" {
                Ok(None)
            } else {
                Ok(Some((*one).to_string()))
            }
        }
        _ => Err(ConfigError::MultipleDefaultNames {
            point,
            declared: declared.to_string(),
        }
        .into()),
    }
}
