//! Injection factories.
//!
//! `ExtensionFactory` is itself an extension point, resolved through the
//! same registries it feeds. The runtime registers its two standard
//! factories below with hand-written rows plus an embedded declaration
//! under the internal location; consumer crates normally write the same
//! thing through the [`ExtensionRegistration`] constructor helpers.

use std::any::TypeId;
use std::sync::Arc;

use relay_core::{ExtensionPoint, RelayError};

use crate::host::ExtensionHost;
use crate::registration::{
    Constructed, DeclarationSource, ErasedInstance, ExtensionKind, ExtensionRegistration,
    PointRegistration,
};
use crate::registry::InjectCtx;
use crate::strategy::INTERNAL_LOCATION;

/// Resolves values requested by constructors through
/// [`InjectCtx::request`](crate::registry::InjectCtx::request).
pub trait ExtensionFactory: Send + Sync {
    /// Finds a value for the requested contract type and property name.
    /// `Ok(None)` means "not mine"; the next factory is asked.
    fn find(
        &self,
        host: &Arc<ExtensionHost>,
        point: TypeId,
        property: &str,
    ) -> Result<Option<ErasedInstance>, RelayError>;
}

impl ExtensionPoint for dyn ExtensionFactory {
    const NAME: &'static str = "relay.ExtensionFactory";
}

/// Serves any registered contract with named implementations by handing
/// out its adaptive instance, whatever the property name.
pub struct PointFactory;

impl ExtensionFactory for PointFactory {
    fn find(
        &self,
        host: &Arc<ExtensionHost>,
        point: TypeId,
        _property: &str,
    ) -> Result<Option<ErasedInstance>, RelayError> {
        let Some(registry) = host.registry_by_id(point) else {
            return Ok(None);
        };
        if registry.names()?.is_empty() {
            return Ok(None);
        }
        registry.adaptive_erased().map(Some)
    }
}

/// The adaptive factory: snapshots every named factory at construction and
/// asks each in name order, first hit wins.
pub struct AggregateFactory {
    factories: Vec<Arc<dyn ExtensionFactory>>,
}

impl AggregateFactory {
    fn build(ctx: &InjectCtx<'_>) -> Result<Self, RelayError> {
        let registry = ctx.host().registry::<dyn ExtensionFactory>();
        let mut factories = Vec::new();
        for name in registry.names()? {
            factories.push(registry.get(&name)?);
        }
        Ok(Self { factories })
    }
}

impl ExtensionFactory for AggregateFactory {
    fn find(
        &self,
        host: &Arc<ExtensionHost>,
        point: TypeId,
        property: &str,
    ) -> Result<Option<ErasedInstance>, RelayError> {
        for factory in &self.factories {
            if let Some(found) = factory.find(host, point, property)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

inventory::submit! {
    PointRegistration::of::<dyn ExtensionFactory>()
}

inventory::submit! {
    ExtensionRegistration {
        point: TypeId::of::<dyn ExtensionFactory>(),
        point_name: "relay.ExtensionFactory",
        type_key: "relay_std::factory::PointFactory",
        impl_id: TypeId::of::<PointFactory>(),
        fallback_name: Some("point"),
        priority: 0,
        kind: ExtensionKind::Normal {
            construct: |_ctx| {
                Ok(Constructed::new::<dyn ExtensionFactory>(Arc::new(
                    PointFactory,
                )))
            },
        },
        activation: None,
    }
}

inventory::submit! {
    ExtensionRegistration {
        point: TypeId::of::<dyn ExtensionFactory>(),
        point_name: "relay.ExtensionFactory",
        type_key: "relay_std::factory::AggregateFactory",
        impl_id: TypeId::of::<AggregateFactory>(),
        fallback_name: None,
        priority: 0,
        kind: ExtensionKind::Adaptive {
            construct: |ctx| {
                Ok(Constructed::new::<dyn ExtensionFactory>(Arc::new(
                    AggregateFactory::build(ctx)?,
                )))
            },
        },
        activation: None,
    }
}

inventory::submit! {
    DeclarationSource {
        location: INTERNAL_LOCATION,
        point_name: "relay.ExtensionFactory",
        origin: "embedded:relay-std/factory",
        text: "point=relay_std::factory::PointFactory\n\
               adaptive=relay_std::factory::AggregateFactory\n",
    }
}
