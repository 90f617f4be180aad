//! # relay - Extension Registry & Dispatch Runtime
//!
//! `relay` is the extensibility runtime of a distributed RPC framework: a
//! registry of named implementations per capability contract, an adaptive
//! dispatch layer that picks the implementation per call from run-time
//! configuration, and a proxy synthesizer that funnels typed contract calls
//! through one generic handler.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use relay::{ExtensionHost, ExtensionPoint, Selector};
//!
//! pub trait Transporter: Send + Sync {
//!     fn open(&self, target: &Selector) -> Result<String, relay::RelayError>;
//! }
//!
//! impl ExtensionPoint for dyn Transporter {
//!     const NAME: &'static str = "demo.Transporter";
//!     const DEFAULT_NAME: Option<&'static str> = Some("tcp");
//! }
//!
//! // Implementations submit registration rows and declaration lines;
//! // resolution happens by name at run time:
//! let host = ExtensionHost::global();
//! let transporter = host.registry::<dyn Transporter>().get("tcp")?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use relay_core::{
    // Errors
    BoxError,
    CallError,
    // Proxy call surface
    CallHandler,
    ConfigError,
    DiscoveryError,
    DispatchError,
    // Contract identity
    ExtensionPoint,
    FromValue,
    IntoValue,
    // Instance lifecycle
    Lifecycle,
    MethodDescriptor,
    NullHandler,
    ProxyError,
    RelayError,
    ResolutionError,
    // Configuration object
    Selector,
    SelectorCarrier,
    SynthesisError,
    UnsupportedHandler,
    Value,
    ValueError,
};

pub use relay_std::{
    // Activation & registration rows
    ActivationSpec,
    AggregateFactory,
    Construct,
    Constructed,
    // Proxy synthesis
    ContractGlue,
    Decorate,
    DeclarationSource,
    // Adaptive dispatch
    DispatchProfile,
    ErasedInstance,
    ErasedRegistry,
    // Injection
    ExtensionFactory,
    // Worlds & registries
    ExtensionHost,
    ExtensionKind,
    ExtensionRegistration,
    ExtensionRegistry,
    HostBuilder,
    InjectCtx,
    MAX_PROXY_CONTRACTS,
    MethodDispatch,
    PointFactory,
    PointRegistration,
    ProxyClass,
    ProxyInstance,
    ScanFlags,
    StrategyRegistration,
    not_adaptive,
    proxy_contract,
    skeleton_of,
};

/// Loading strategy locations and ordering.
pub mod strategy {
    pub use relay_std::strategy::{
        EXTERNAL_LOCATION, INTERNAL_LOCATION, MAIN_LOCATION, strategies,
    };
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use relay_std::testing::*;
}

/// Prelude module - common imports for Relay.
///
/// # Usage
///
/// ```rust,ignore
/// use relay::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Errors
        BoxError,
        CallError,
        // Proxy surface
        CallHandler,
        // Registration
        Constructed,
        // Contract identity
        ExtensionPoint,
        ExtensionRegistration,
        // Worlds
        ExtensionHost,
        Lifecycle,
        RelayError,
        ScanFlags,
        // Configuration
        Selector,
        Value,
    };
}

pub use inventory;
