#![allow(dead_code)]

//! Shared fixtures: a transporter contract with named implementations,
//! decorators, activation rules and a dispatch profile, a codec contract
//! exercising injection, and two proxy contracts.

use std::sync::{Arc, Weak};

use relay::{
    ActivationSpec, ConfigError, Constructed, DeclarationSource, DispatchError, DispatchProfile,
    ExtensionHost, ExtensionPoint, ExtensionRegistration, MethodDispatch, PointRegistration,
    RelayError, ScanFlags, Selector, SelectorCarrier, not_adaptive,
};

// ============================================================================
// Transporter contract
// ============================================================================

pub trait Transporter: Send + Sync + std::fmt::Debug {
    fn id(&self) -> &'static str;
    fn open(&self, target: &Selector) -> Result<String, RelayError>;
    fn connect(&self, target: &Selector) -> Result<String, RelayError>;
    fn open_for(&self, call: &Invocation) -> Result<String, RelayError>;
    fn shutdown_port(&self) -> Result<(), RelayError>;
}

impl ExtensionPoint for dyn Transporter {
    const NAME: &'static str = "relaytest.Transporter";
    const DEFAULT_NAME: Option<&'static str> = Some("tcp");
}

/// Call-context argument carrying the selector indirectly.
pub struct Invocation {
    pub method: &'static str,
    pub target: Option<Selector>,
}

impl SelectorCarrier for Invocation {
    fn selector(&self) -> Option<&Selector> {
        self.target.as_ref()
    }
}

macro_rules! plain_transporter {
    ($ty:ident, $name:literal) => {
        #[derive(Debug)]
        pub struct $ty;

        impl Transporter for $ty {
            fn id(&self) -> &'static str {
                $name
            }

            fn open(&self, target: &Selector) -> Result<String, RelayError> {
                Ok(format!(concat!($name, ":{}"), target.param_or("host", "-")))
            }

            fn connect(&self, target: &Selector) -> Result<String, RelayError> {
                self.open(target)
            }

            fn open_for(&self, call: &Invocation) -> Result<String, RelayError> {
                let target = call.selector().cloned().unwrap_or_default();
                self.open(&target)
            }

            fn shutdown_port(&self) -> Result<(), RelayError> {
                Ok(())
            }
        }
    };
}

plain_transporter!(TcpTransporter, "tcp");
plain_transporter!(UdpTransporter, "udp");
plain_transporter!(CachedTransporter, "cached");
plain_transporter!(PlainTransporter, "plain");
plain_transporter!(EdgeTransporter, "edge");

// ============================================================================
// Decorators
// ============================================================================

/// Priority 2, applies to every name: expected outermost.
#[derive(Debug)]
pub struct FramedTransporter {
    inner: Arc<dyn Transporter>,
}

impl Transporter for FramedTransporter {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    fn open(&self, target: &Selector) -> Result<String, RelayError> {
        Ok(format!("framed({})", self.inner.open(target)?))
    }

    fn connect(&self, target: &Selector) -> Result<String, RelayError> {
        self.inner.connect(target)
    }

    fn open_for(&self, call: &Invocation) -> Result<String, RelayError> {
        Ok(format!("framed({})", self.inner.open_for(call)?))
    }

    fn shutdown_port(&self) -> Result<(), RelayError> {
        self.inner.shutdown_port()
    }
}

/// Priority 1, excluded for `udp`.
#[derive(Debug)]
pub struct TracedTransporter {
    inner: Arc<dyn Transporter>,
}

impl Transporter for TracedTransporter {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    fn open(&self, target: &Selector) -> Result<String, RelayError> {
        Ok(format!("traced({})", self.inner.open(target)?))
    }

    fn connect(&self, target: &Selector) -> Result<String, RelayError> {
        self.inner.connect(target)
    }

    fn open_for(&self, call: &Invocation) -> Result<String, RelayError> {
        Ok(format!("traced({})", self.inner.open_for(call)?))
    }

    fn shutdown_port(&self) -> Result<(), RelayError> {
        self.inner.shutdown_port()
    }
}

// ============================================================================
// Adaptive adapter
// ============================================================================

#[derive(Debug)]
pub struct AdaptiveTransporter {
    host: Weak<ExtensionHost>,
}

impl AdaptiveTransporter {
    fn dispatch(
        &self,
        method: &str,
        selector: &Selector,
        invoked: Option<&str>,
    ) -> Result<Arc<dyn Transporter>, RelayError> {
        let host = self
            .host
            .upgrade()
            .ok_or_else(|| RelayError::from(ConfigError::HostReleased))?;
        let registry = host.registry::<dyn Transporter>();
        let entry = TRANSPORT_PROFILE.method(method).expect("profiled method");
        let name = entry.resolve(
            &TRANSPORT_PROFILE,
            registry.default_name()?.as_deref(),
            selector,
            invoked,
            <dyn Transporter as ExtensionPoint>::NAME,
        )?;
        registry.get(&name)
    }
}

impl Transporter for AdaptiveTransporter {
    fn id(&self) -> &'static str {
        "adaptive"
    }

    fn open(&self, target: &Selector) -> Result<String, RelayError> {
        self.dispatch("open", target, None)?.open(target)
    }

    fn connect(&self, target: &Selector) -> Result<String, RelayError> {
        self.dispatch("connect", target, None)?.connect(target)
    }

    fn open_for(&self, call: &Invocation) -> Result<String, RelayError> {
        let Some(target) = call.selector() else {
            return Err(DispatchError::MissingSelector {
                point: <dyn Transporter as ExtensionPoint>::NAME,
                method: "open_for",
            }
            .into());
        };
        self.dispatch("open_for", target, Some(call.method))?
            .open_for(call)
    }

    fn shutdown_port(&self) -> Result<(), RelayError> {
        Err(not_adaptive(
            <dyn Transporter as ExtensionPoint>::NAME,
            "shutdown_port",
        ))
    }
}

static TRANSPORT_PROFILE: DispatchProfile = DispatchProfile {
    default_key: "transporter",
    methods: &[
        MethodDispatch {
            name: "open",
            keys: &["transporter"],
            context_scoped: false,
        },
        MethodDispatch {
            name: "connect",
            keys: &["protocol", "transporter"],
            context_scoped: false,
        },
        MethodDispatch {
            name: "open_for",
            keys: &[],
            context_scoped: true,
        },
    ],
    construct: |ctx| {
        Ok(Constructed::new::<dyn Transporter>(Arc::new(
            AdaptiveTransporter {
                host: Arc::downgrade(ctx.host()),
            },
        )))
    },
};

inventory::submit! {
    PointRegistration::dispatched::<dyn Transporter>(&TRANSPORT_PROFILE)
}

// ============================================================================
// Transporter registration rows + declarations
// ============================================================================

inventory::submit! {
    ExtensionRegistration::normal::<dyn Transporter, TcpTransporter>(
        "relaytest::TcpTransporter",
        "tcp",
        |_ctx| Ok(Constructed::new::<dyn Transporter>(Arc::new(TcpTransporter))),
    )
}

inventory::submit! {
    ExtensionRegistration::normal::<dyn Transporter, UdpTransporter>(
        "relaytest::UdpTransporter",
        "udp",
        |_ctx| Ok(Constructed::new::<dyn Transporter>(Arc::new(UdpTransporter))),
    )
}

inventory::submit! {
    ExtensionRegistration::normal::<dyn Transporter, CachedTransporter>(
        "relaytest::CachedTransporter",
        "cached",
        |_ctx| Ok(Constructed::new::<dyn Transporter>(Arc::new(CachedTransporter))),
    )
    .with_activation(ActivationSpec { groups: &["server"], keys: &["cache"] })
    .with_priority(10)
}

inventory::submit! {
    ExtensionRegistration::normal::<dyn Transporter, PlainTransporter>(
        "relaytest::PlainTransporter",
        "plain",
        |_ctx| Ok(Constructed::new::<dyn Transporter>(Arc::new(PlainTransporter))),
    )
    .with_activation(ActivationSpec { groups: &["server"], keys: &[] })
    .with_priority(-10)
}

inventory::submit! {
    ExtensionRegistration::normal::<dyn Transporter, EdgeTransporter>(
        "relaytest::EdgeTransporter",
        "edge",
        |_ctx| Ok(Constructed::new::<dyn Transporter>(Arc::new(EdgeTransporter))),
    )
    .with_activation(ActivationSpec { groups: &["client"], keys: &[] })
}

inventory::submit! {
    ExtensionRegistration::decorator::<dyn Transporter, FramedTransporter>(
        "relaytest::FramedTransporter",
        |inner, _ctx| {
            let inner = *inner
                .downcast::<Arc<dyn Transporter>>()
                .map_err(|_| RelayError::from("framed decorator got a foreign instance"))?;
            Ok(Constructed::new::<dyn Transporter>(Arc::new(
                FramedTransporter { inner },
            )))
        },
    )
    .with_priority(2)
}

inventory::submit! {
    ExtensionRegistration::decorator::<dyn Transporter, TracedTransporter>(
        "relaytest::TracedTransporter",
        |inner, _ctx| {
            let inner = *inner
                .downcast::<Arc<dyn Transporter>>()
                .map_err(|_| RelayError::from("traced decorator got a foreign instance"))?;
            Ok(Constructed::new::<dyn Transporter>(Arc::new(
                TracedTransporter { inner },
            )))
        },
    )
    .with_priority(1)
    .filtered(&[], &["udp"])
}

inventory::submit! {
    DeclarationSource {
        location: "relay/",
        point_name: "relaytest.Transporter",
        origin: "embedded:tests/common/transporter",
        text: "# transporters used across the integration suite\n\
               tcp=relaytest::TcpTransporter\n\
               relaytest::UdpTransporter  # bare line, name derives from the row\n\
               fast,quick=relaytest::TcpTransporter\n\
               cached=relaytest::CachedTransporter\n\
               plain=relaytest::PlainTransporter\n\
               edge=relaytest::EdgeTransporter\n\
               relaytest::FramedTransporter\n\
               relaytest::TracedTransporter\n\
               ghost=relaytest::GhostTransporter  # recorded failure, surfaced on lookup\n",
    }
}

// ============================================================================
// Codec contract (exercises injection)
// ============================================================================

pub trait Codec: Send + Sync {
    fn name(&self) -> &'static str;
    fn transporter_id(&self) -> Option<&'static str>;
}

impl ExtensionPoint for dyn Codec {
    const NAME: &'static str = "relaytest.Codec";
    const DEFAULT_NAME: Option<&'static str> = Some("json");
}

pub struct JsonCodec {
    transporter: Option<Arc<dyn Transporter>>,
}

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn transporter_id(&self) -> Option<&'static str> {
        self.transporter.as_ref().map(|t| t.id())
    }
}

pub struct BlobCodec;

impl Codec for BlobCodec {
    fn name(&self) -> &'static str {
        "blob"
    }

    fn transporter_id(&self) -> Option<&'static str> {
        None
    }
}

inventory::submit! {
    ExtensionRegistration::normal::<dyn Codec, JsonCodec>(
        "relaytest::JsonCodec",
        "json",
        |ctx| {
            let transporter = ctx.request::<dyn Transporter>("transporter");
            Ok(Constructed::new::<dyn Codec>(Arc::new(JsonCodec { transporter })))
        },
    )
}

inventory::submit! {
    ExtensionRegistration::normal::<dyn Codec, BlobCodec>(
        "relaytest::BlobCodec",
        "blob",
        |_ctx| Ok(Constructed::new::<dyn Codec>(Arc::new(BlobCodec))),
    )
}

inventory::submit! {
    DeclarationSource {
        location: "relay/",
        point_name: "relaytest.Codec",
        origin: "embedded:tests/common/codec",
        text: "json=relaytest::JsonCodec\nblob=relaytest::BlobCodec\n",
    }
}

// ============================================================================
// Proxy contracts
// ============================================================================

relay::proxy_contract! {
    /// Remote echo surface used by the proxy tests.
    pub trait EchoService: "relaytest.EchoService" {
        fn echo(&self, message: String) -> Result<String, CallError>;
        fn total(&self, amount: i64, batch: i64) -> Result<i64, CallError>;
    }
}

relay::proxy_contract! {
    /// Second contract for multi-contract proxies.
    pub trait TickService: "relaytest.TickService" {
        fn tick(&self) -> Result<i64, CallError>;
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// A fresh world isolated from the filesystem.
pub fn embedded_host() -> Arc<ExtensionHost> {
    ExtensionHost::builder().scan(ScanFlags::EMBEDDED).build()
}
