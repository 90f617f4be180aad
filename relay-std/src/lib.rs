//! Runtime of the Relay extension framework.
//!
//! This crate carries everything behind the contracts in `relay-core`:
//! link-time registration tables, the declaration loader, per-contract
//! registries with dependency injection and decoration, adaptive dispatch
//! support, injection factories, the proxy synthesizer and the
//! [`ExtensionHost`] world handle. Most users depend on the `relay` facade
//! instead of this crate directly.
//!
//! ## How the pieces fit
//!
//! Implementations submit [`ExtensionRegistration`] rows (and contracts
//! submit [`PointRegistration`] rows) into link-time tables. At first access
//! to a contract's registry, the loader walks the configured loading
//! strategies, reads declaration sources and classifies the referenced rows
//! into a per-contract descriptor store. [`ExtensionRegistry`] resolves
//! names against that store, constructing each named singleton at most once
//! through the raw-instance / injection / decoration / lifecycle pipeline.
//! [`proxy_contract!`] declares contracts whose calls marshal through one
//! generic [`CallHandler`](relay_core::CallHandler).

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use inventory;
pub use relay_core;

pub mod adaptive;
pub mod factory;
pub mod host;
mod loader;
pub mod proxy;
pub mod registration;
pub mod registry;
mod store;
pub mod strategy;
pub mod testing;

pub use adaptive::{DispatchProfile, MethodDispatch, not_adaptive};
pub use factory::{AggregateFactory, ExtensionFactory, PointFactory};
pub use host::{ExtensionHost, HostBuilder, ScanFlags};
pub use proxy::{
    ContractGlue, MAX_PROXY_CONTRACTS, ProxyClass, ProxyInstance, find_method, skeleton_of,
};
pub use registration::{
    ActivationSpec, Construct, Constructed, Decorate, DeclarationSource, ErasedInstance,
    ExtensionKind, ExtensionRegistration, PointRegistration, StrategyRegistration,
};
pub use registry::{ErasedRegistry, ExtensionRegistry, InjectCtx};
