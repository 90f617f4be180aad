//! Link-time registration rows.
//!
//! Implementations, extension points, declaration texts and loading
//! strategies all register themselves by submitting rows into inventory
//! tables. The loader consumes the tables at first use of a contract; until
//! then a row is just static data. Rows are usually built through the
//! constructor helpers here and submitted next to the type they describe:
//!
//! ```rust,ignore
//! inventory::submit! {
//!     ExtensionRegistration::normal::<dyn Transporter, TcpTransporter>(
//!         "demo::TcpTransporter",
//!         "tcp",
//!         |_ctx| Ok(Constructed::new::<dyn Transporter>(Arc::new(TcpTransporter))),
//!     )
//! }
//! ```

use std::any::{Any, TypeId};
use std::sync::Arc;

use relay_core::{ExtensionPoint, Lifecycle, RelayError, Selector};

use crate::adaptive::DispatchProfile;
use crate::host::ExtensionHost;
use crate::registry::{ErasedRegistry, InjectCtx};

/// A type-erased `Arc<dyn Contract>`.
pub type ErasedInstance = Box<dyn Any + Send + Sync>;

/// Constructor of a fresh raw instance.
pub type Construct = fn(&InjectCtx<'_>) -> Result<Constructed, RelayError>;

/// Constructor of a decorator around an existing instance.
pub type Decorate = fn(ErasedInstance, &InjectCtx<'_>) -> Result<Constructed, RelayError>;

/// What a constructor hands back: the erased instance plus an optional
/// lifecycle view of the same instance.
pub struct Constructed {
    /// The instance, erased. Must hold an `Arc<dyn Contract>` of the
    /// contract the row is registered for.
    pub instance: ErasedInstance,
    /// Lifecycle view of the instance, when it has one.
    pub lifecycle: Option<Arc<dyn Lifecycle>>,
}

impl Constructed {
    /// Wraps an instance without a lifecycle view.
    pub fn new<P: ?Sized + Send + Sync + 'static>(instance: Arc<P>) -> Self {
        Self {
            instance: Box::new(instance),
            lifecycle: None,
        }
    }

    /// Wraps an instance together with its lifecycle view.
    pub fn with_lifecycle<P: ?Sized + Send + Sync + 'static>(
        instance: Arc<P>,
        lifecycle: Arc<dyn Lifecycle>,
    ) -> Self {
        Self {
            instance: Box::new(instance),
            lifecycle: Some(lifecycle),
        }
    }
}

/// How a registered implementation participates in construction.
pub enum ExtensionKind {
    /// A plain named implementation.
    Normal {
        /// Raw instance constructor.
        construct: Construct,
    },
    /// A decorator wrapping other implementations. Decorator rows never
    /// register names; `only` / `except` filter the resolution names the
    /// decorator applies to (both empty: applies to all).
    Decorator {
        /// Wraps an existing instance of the same contract.
        wrap: Decorate,
        /// Names the decorator is restricted to, or empty for all.
        only: &'static [&'static str],
        /// Names the decorator never applies to.
        except: &'static [&'static str],
    },
    /// A hand-written adaptive implementation. Takes precedence over a
    /// dispatch profile.
    Adaptive {
        /// Adaptive instance constructor.
        construct: Construct,
    },
}

/// Conditions under which an implementation joins activation selection.
#[derive(Debug, Clone, Copy)]
pub struct ActivationSpec {
    /// Groups the rule belongs to; empty matches any requested group.
    pub groups: &'static [&'static str],
    /// Selector keys gating the rule: `"key"` requires a non-empty value,
    /// `"key:value"` requires that exact value. Empty: always active.
    pub keys: &'static [&'static str],
}

impl ActivationSpec {
    /// Whether this rule matches the requested group.
    ///
    /// An empty requested group matches every rule; a rule with groups
    /// requires the requested group to be one of them.
    pub fn matches_group(&self, group: &str) -> bool {
        if group.is_empty() {
            return true;
        }
        self.groups.iter().any(|g| *g == group)
    }

    /// Whether this rule is switched on by the selector.
    ///
    /// A selector entry satisfies key `k` when its key equals `k` or ends
    /// with `.k` (method-scoped entries flatten to `method.key`).
    pub fn is_active(&self, selector: &Selector) -> bool {
        if self.keys.is_empty() {
            return true;
        }
        let entries = selector.entries();
        self.keys.iter().any(|spec| {
            let (key, pinned) = match spec.split_once(':') {
                Some((k, v)) => (k, Some(v)),
                None => (*spec, None),
            };
            entries.iter().any(|(entry_key, entry_value)| {
                let key_hit =
                    entry_key == key || entry_key.ends_with(&format!(".{key}"));
                key_hit
                    && match pinned {
                        Some(v) => entry_value == v,
                        None => !entry_value.is_empty(),
                    }
            })
        })
    }
}

/// One registered implementation of one contract.
pub struct ExtensionRegistration {
    /// Type id of the contract (`dyn Contract`).
    pub point: TypeId,
    /// Contract name, matching [`ExtensionPoint::NAME`].
    pub point_name: &'static str,
    /// Stable reference string used by declaration lines.
    pub type_key: &'static str,
    /// Type id of the implementation.
    pub impl_id: TypeId,
    /// Name derived from the implementation itself, used by declaration
    /// lines that carry no `name=` prefix.
    pub fallback_name: Option<&'static str>,
    /// Ordering weight for decorators and activation.
    pub priority: i32,
    /// Participation kind.
    pub kind: ExtensionKind,
    /// Activation rule, if the implementation takes part in activation
    /// selection.
    pub activation: Option<ActivationSpec>,
}

inventory::collect!(ExtensionRegistration);

impl ExtensionRegistration {
    /// A plain named implementation row.
    pub const fn normal<P, T>(type_key: &'static str, name: &'static str, construct: Construct) -> Self
    where
        P: ExtensionPoint + ?Sized,
        T: 'static,
    {
        Self {
            point: TypeId::of::<P>(),
            point_name: P::NAME,
            type_key,
            impl_id: TypeId::of::<T>(),
            fallback_name: Some(name),
            priority: 0,
            kind: ExtensionKind::Normal { construct },
            activation: None,
        }
    }

    /// A decorator row.
    pub const fn decorator<P, T>(type_key: &'static str, wrap: Decorate) -> Self
    where
        P: ExtensionPoint + ?Sized,
        T: 'static,
    {
        Self {
            point: TypeId::of::<P>(),
            point_name: P::NAME,
            type_key,
            impl_id: TypeId::of::<T>(),
            fallback_name: None,
            priority: 0,
            kind: ExtensionKind::Decorator {
                wrap,
                only: &[],
                except: &[],
            },
            activation: None,
        }
    }

    /// A hand-written adaptive implementation row.
    pub const fn adaptive<P, T>(type_key: &'static str, construct: Construct) -> Self
    where
        P: ExtensionPoint + ?Sized,
        T: 'static,
    {
        Self {
            point: TypeId::of::<P>(),
            point_name: P::NAME,
            type_key,
            impl_id: TypeId::of::<T>(),
            fallback_name: None,
            priority: 0,
            kind: ExtensionKind::Adaptive { construct },
            activation: None,
        }
    }

    /// Sets the ordering weight.
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Attaches an activation rule.
    pub const fn with_activation(mut self, spec: ActivationSpec) -> Self {
        self.activation = Some(spec);
        self
    }

    /// Restricts a decorator row to (or away from) specific names.
    /// No-op on non-decorator rows.
    pub const fn filtered(
        mut self,
        only: &'static [&'static str],
        except: &'static [&'static str],
    ) -> Self {
        if let ExtensionKind::Decorator {
            only: o, except: e, ..
        } = &mut self.kind
        {
            *o = only;
            *e = except;
        }
        self
    }
}

/// One registered extension point.
pub struct PointRegistration {
    /// Type id of the contract (`dyn Contract`).
    pub id: TypeId,
    /// Contract name.
    pub name: &'static str,
    /// Dispatch metadata, when the contract supports synthesized adaptive
    /// instances.
    pub dispatch: Option<&'static DispatchProfile>,
    /// Creates (or fetches) the contract's registry on a host, erased.
    pub make_registry: fn(&Arc<ExtensionHost>) -> Arc<dyn ErasedRegistry>,
}

inventory::collect!(PointRegistration);

impl PointRegistration {
    /// A point row without dispatch metadata.
    pub const fn of<P: ExtensionPoint + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<P>(),
            name: P::NAME,
            dispatch: None,
            make_registry: |host| host.registry::<P>(),
        }
    }

    /// A point row carrying dispatch metadata.
    pub const fn dispatched<P: ExtensionPoint + ?Sized>(profile: &'static DispatchProfile) -> Self {
        Self {
            dispatch: Some(profile),
            ..Self::of::<P>()
        }
    }
}

/// Declaration text compiled into the binary.
///
/// Equivalent to a declaration file at `<location><point_name>`, scanned
/// before any filesystem root.
pub struct DeclarationSource {
    /// Strategy location the source belongs to, e.g. `"relay/"`.
    pub location: &'static str,
    /// Contract name the declarations are for.
    pub point_name: &'static str,
    /// Label used in logs and to order sources deterministically.
    pub origin: &'static str,
    /// The declaration lines.
    pub text: &'static str,
}

inventory::collect!(DeclarationSource);

/// One loading strategy: a location prefix plus scan ordering rules.
pub struct StrategyRegistration {
    /// Location prefix, e.g. `"relay/internal/"`.
    pub location: &'static str,
    /// Scan order: higher priorities are consumed first.
    pub priority: i32,
    /// Whether declarations from this strategy replace earlier same-name
    /// registrations instead of being refused.
    pub overridden: bool,
    /// Reference prefixes this strategy silently skips.
    pub excluded: &'static [&'static str],
}

inventory::collect!(StrategyRegistration);
