//! Core contracts for the Relay extension runtime.
//!
//! This crate holds the data model shared by every Relay crate and nothing
//! else: no registries, no loaders, no synthesized instances. The runtime
//! lives in `relay-std`; most users depend on the `relay` facade.
//!
//! ## Layering
//!
//! - [`ExtensionPoint`] names a contract and its optional default.
//! - [`Selector`] is the configuration object adaptive dispatch reads.
//! - [`Lifecycle`] is the optional init/destroy surface of an instance.
//! - [`Value`], [`MethodDescriptor`] and [`CallHandler`] form the uniform
//!   call surface behind synthesized proxies.
//! - [`RelayError`] and its sub-enums classify every failure the runtime
//!   reports.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod call;
pub mod error;
pub mod lifecycle;
pub mod point;
pub mod selector;

pub use call::{
    CallHandler, FromValue, IntoValue, MethodDescriptor, NullHandler, UnsupportedHandler, Value,
};
pub use error::{
    BoxError, CallError, ConfigError, DiscoveryError, DispatchError, ProxyError, RelayError,
    ResolutionError, SynthesisError, ValueError,
};
pub use lifecycle::Lifecycle;
pub use point::ExtensionPoint;
pub use selector::{Selector, SelectorCarrier};
