//! Error types shared across the Relay crates.
//!
//! [`RelayError`] is the top-level error. Each subsystem gets its own enum
//! so callers can match on the family they care about without pattern
//! matching through unrelated variants.

use thiserror::Error;

/// Boxed error type used at trait boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for all registry, synthesis and proxy operations.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Fatal configuration mistakes.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Per-line declaration failures (recorded, surfaced on lookup).
    #[error("discovery failure: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Name lookups that found nothing.
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Adaptive instance construction failures.
    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Per-call adaptive dispatch failures.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Proxy class synthesis failures.
    #[error("proxy error: {0}")]
    Proxy(#[from] ProxyError),

    /// Escape hatch for implementation-defined failures.
    #[error(transparent)]
    Custom(BoxError),
}

/// Fatal configuration errors. These abort the operation that hit them.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A lookup was handed an empty extension name.
    #[error("extension name is empty")]
    EmptyName,

    /// A contract declared more than one default name.
    #[error("contract `{point}` declares more than one default name: {declared}")]
    MultipleDefaultNames {
        /// Contract name.
        point: &'static str,
        /// The offending declaration, verbatim.
        declared: String,
    },

    /// Two different implementations claimed the adaptive slot.
    #[error("contract `{point}` already has adaptive implementation {kept}, refusing {offered}")]
    AdaptiveConflict {
        /// Contract name.
        point: &'static str,
        /// Implementation that holds the slot.
        kept: &'static str,
        /// Implementation that was refused.
        offered: &'static str,
    },

    /// Programmatic registration under a name that is already taken.
    #[error("extension name `{name}` already exists on contract `{point}`")]
    DuplicateName {
        /// Contract name.
        point: &'static str,
        /// The contested alias.
        name: String,
    },

    /// Programmatic replacement of a name that does not exist.
    #[error("extension name `{name}` does not exist on contract `{point}`, nothing to replace")]
    ReplaceMissing {
        /// Contract name.
        point: &'static str,
        /// The missing alias.
        name: String,
    },

    /// Programmatic replacement of an adaptive slot that was never filled.
    #[error("contract `{point}` has no adaptive implementation to replace")]
    AdaptiveMissing {
        /// Contract name.
        point: &'static str,
    },

    /// An implementation constructor or initializer failed.
    #[error("extension `{name}` ({type_key}) for contract `{point}` could not be built")]
    Instantiation {
        /// Contract name.
        point: &'static str,
        /// Resolution name being built.
        name: String,
        /// Implementation reference.
        type_key: &'static str,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },

    /// The owning host was dropped while a registry handle was still live.
    #[error("extension host was released")]
    HostReleased,

    /// Construction was requested after the host's shutdown sweep ran.
    #[error("extension host is shut down")]
    HostStopped,
}

/// Non-fatal failures recorded while parsing declaration lines.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A line with no implementation reference after the `=`.
    #[error("declaration line has no implementation reference")]
    MissingReference,

    /// A reference that matches no registered implementation.
    #[error("`{key}` is not a registered implementation")]
    UnknownReference {
        /// The unresolved reference.
        key: String,
    },

    /// A reference registered for some other contract.
    #[error("`{key}` is not a declared implementation of this contract (it belongs to `{other}`)")]
    ForeignReference {
        /// The reference.
        key: String,
        /// Contract the reference actually belongs to.
        other: &'static str,
    },

    /// A bare line whose implementation has no fallback name to derive.
    #[error("`{key}` declares no name and carries no fallback name")]
    Underivable {
        /// The reference.
        key: String,
    },

    /// The same alias mapped to two different implementations.
    #[error("name `{name}` is already bound to {existing}, refusing {offered}")]
    DuplicateName {
        /// The contested alias.
        name: String,
        /// Implementation that holds the alias.
        existing: &'static str,
        /// Implementation that was refused.
        offered: &'static str,
    },
}

/// Lookup failures.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// No implementation under the requested name. `causes` carries the
    /// rendered per-line discovery failures that may explain the miss.
    #[error("no extension named `{name}` on contract `{point}`{causes}")]
    NotFound {
        /// Contract name.
        point: &'static str,
        /// The requested alias.
        name: String,
        /// Pre-rendered ", possible causes: ..." suffix, or empty.
        causes: String,
    },

    /// The default was requested but the contract declares none.
    #[error("contract `{point}` declares no default extension")]
    NoDefault {
        /// Contract name.
        point: &'static str,
    },
}

/// Adaptive instance construction failures.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The contract has neither an adaptive implementation nor a dispatch
    /// profile with at least one method.
    #[error("no dispatchable method on contract `{point}`, refusing to build an adaptive instance")]
    NoDispatchableMethods {
        /// Contract name.
        point: &'static str,
    },

    /// A failed build, replayed identically on every later request.
    #[error("failed to build adaptive instance for contract `{point}`: {detail}")]
    Failed {
        /// Contract name.
        point: &'static str,
        /// Rendered cause of the original failure.
        detail: String,
    },
}

/// Per-call failures inside adaptive adapters.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The invoked method is not part of the dispatch surface.
    #[error("method `{method}` of contract `{point}` is not adaptive")]
    NotAdaptive {
        /// Contract name.
        point: &'static str,
        /// Method name.
        method: &'static str,
    },

    /// A context-scoped method received a carrier without a selector.
    #[error("method `{method}` of contract `{point}` was called without a selector")]
    MissingSelector {
        /// Contract name.
        point: &'static str,
        /// Method name.
        method: &'static str,
    },

    /// The key walk produced no implementation name.
    #[error("failed to pick an extension name for contract `{point}` from selector `{selector}` using keys [{keys}]")]
    NoSelectorValue {
        /// Contract name.
        point: &'static str,
        /// The keys that were consulted, comma separated.
        keys: String,
        /// Rendered selector.
        selector: String,
    },
}

/// Proxy class synthesis failures.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A proxy over zero contracts was requested.
    #[error("cannot build a proxy over zero contracts")]
    NoContracts,

    /// A named contract has no registered glue.
    #[error("`{name}` is not a registered proxy contract")]
    UnknownContract {
        /// The unresolved contract name.
        name: String,
    },

    /// The contract count bound was exceeded.
    #[error("contract limit exceeded: {got} contracts, at most {limit} allowed")]
    TooManyContracts {
        /// The hard bound.
        limit: usize,
        /// Requested count.
        got: usize,
    },
}

/// Errors crossing the uniform proxy call surface.
#[derive(Debug, Error)]
pub enum CallError {
    /// The handler does not implement the invoked method.
    #[error("method `{method}` is not implemented by this handler")]
    Unsupported {
        /// Rendered method signature.
        method: String,
    },

    /// Argument or result marshalling failed.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// The handler itself failed.
    #[error("call handler failed: {0}")]
    Handler(#[source] BoxError),
}

/// Marshalling failures between typed values and [`Value`](crate::Value).
#[derive(Debug, Error)]
pub enum ValueError {
    /// Null where a reference-like value was required.
    #[error("expected {expected}, found null")]
    Null {
        /// The requested target type.
        expected: &'static str,
    },

    /// A value of the wrong kind.
    #[error("expected {expected}, found {found}")]
    Type {
        /// The requested target type.
        expected: &'static str,
        /// Kind of the value that was present.
        found: &'static str,
    },
}

// Convenience conversions.

impl From<BoxError> for RelayError {
    fn from(err: BoxError) -> Self {
        RelayError::Custom(err)
    }
}

impl From<String> for RelayError {
    fn from(msg: String) -> Self {
        RelayError::Custom(msg.into())
    }
}

impl From<&str> for RelayError {
    fn from(msg: &str) -> Self {
        RelayError::Custom(msg.into())
    }
}

impl From<RelayError> for CallError {
    fn from(err: RelayError) -> Self {
        CallError::Handler(Box::new(err))
    }
}
