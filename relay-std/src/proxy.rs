//! Forwarding proxies over registered contract glue.
//!
//! [`proxy_contract!`](crate::proxy_contract) declares a contract trait
//! and registers its [`ContractGlue`]: the method descriptor table, a stub
//! constructor (trait impl forwarding every call into one
//! [`CallHandler`]) and a skeleton constructor (the reverse direction).
//! [`ExtensionHost::proxy_class`](crate::host::ExtensionHost::proxy_class)
//! combines glues into cached [`ProxyClass`]es.

use std::any::TypeId;
use std::sync::Arc;

use relay_core::{CallHandler, MethodDescriptor, ProxyError, RelayError, UnsupportedHandler};

use crate::registration::ErasedInstance;

/// Upper bound on the number of contracts one proxy may combine.
pub const MAX_PROXY_CONTRACTS: usize = 65535;

/// Everything the runtime needs to stub and skeletonize one contract.
/// Submitted by `proxy_contract!`, one row per contract.
#[derive(Debug)]
pub struct ContractGlue {
    /// Contract name, the key used by `proxy_class`.
    pub contract: &'static str,
    /// Type id of the contract trait object.
    pub id: TypeId,
    /// The contract's method descriptors.
    pub methods: &'static [MethodDescriptor],
    /// Builds a stub: an `Arc<dyn Contract>` forwarding into the handler.
    pub make_stub: fn(Arc<dyn CallHandler>) -> ErasedInstance,
    /// Wraps a typed implementation as a handler. `None` when the erased
    /// value is not an `Arc` of this contract.
    pub make_skeleton: fn(ErasedInstance) -> Option<Arc<dyn CallHandler>>,
}

inventory::collect!(ContractGlue);

pub(crate) fn glue_by_name(name: &str) -> Option<&'static ContractGlue> {
    inventory::iter::<ContractGlue>
        .into_iter()
        .find(|glue| glue.contract == name)
}

/// A synthesized proxy shape over one or more contracts.
#[derive(Debug)]
pub struct ProxyClass {
    label: String,
    glues: Vec<&'static ContractGlue>,
    methods: Vec<&'static MethodDescriptor>,
}

impl ProxyClass {
    /// De-duplicates the method union by name and parameter list; the
    /// first contract's descriptor wins.
    pub(crate) fn build(label: String, glues: Vec<&'static ContractGlue>) -> Self {
        let mut methods: Vec<&'static MethodDescriptor> = Vec::new();
        for glue in &glues {
            for method in glue.methods {
                let duplicate = methods
                    .iter()
                    .any(|seen| seen.name == method.name && seen.params == method.params);
                if !duplicate {
                    methods.push(method);
                }
            }
        }
        Self {
            label,
            glues,
            methods,
        }
    }

    /// The synthesized label, `proxy<N>` with a per-host counter.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The names of the combined contracts.
    pub fn contracts(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.glues.iter().map(|glue| glue.contract)
    }

    /// The de-duplicated method union.
    pub fn methods(&self) -> &[&'static MethodDescriptor] {
        &self.methods
    }

    /// Builds an instance whose every facet forwards into `handler`.
    pub fn instantiate(&self, handler: Arc<dyn CallHandler>) -> ProxyInstance {
        let facets = self
            .glues
            .iter()
            .map(|glue| (glue.id, (glue.make_stub)(handler.clone())))
            .collect();
        ProxyInstance {
            label: self.label.clone(),
            facets,
        }
    }

    /// Builds an instance that refuses every call.
    pub fn instantiate_default(&self) -> ProxyInstance {
        self.instantiate(Arc::new(UnsupportedHandler))
    }
}

/// One proxy instance: a typed facet per combined contract, all sharing
/// one handler.
pub struct ProxyInstance {
    label: String,
    facets: Vec<(TypeId, ErasedInstance)>,
}

impl ProxyInstance {
    /// The label of the class this instance came from.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The typed handle for one of the combined contracts.
    pub fn facet<Q: ?Sized + 'static>(&self) -> Option<Arc<Q>> {
        let id = TypeId::of::<Q>();
        self.facets
            .iter()
            .find(|(facet_id, _)| *facet_id == id)
            .and_then(|(_, erased)| erased.downcast_ref::<Arc<Q>>().cloned())
    }
}

/// Wraps a typed implementation as a [`CallHandler`] using the contract's
/// registered glue.
pub fn skeleton_of<Q: ?Sized + Send + Sync + 'static>(
    implementation: Arc<Q>,
) -> Result<Arc<dyn CallHandler>, RelayError> {
    let id = TypeId::of::<Q>();
    let glue = inventory::iter::<ContractGlue>
        .into_iter()
        .find(|glue| glue.id == id)
        .ok_or_else(|| ProxyError::UnknownContract {
            name: std::any::type_name::<Q>().to_string(),
        })?;
    (glue.make_skeleton)(Box::new(implementation)).ok_or_else(|| {
        ProxyError::UnknownContract {
            name: glue.contract.to_string(),
        }
        .into()
    })
}

static UNKNOWN_METHOD: MethodDescriptor = MethodDescriptor {
    contract: "",
    name: "unknown",
    params: &[],
};

/// Descriptor lookup used by generated stubs. Falls back to a placeholder
/// descriptor rather than panicking on a name the table does not carry.
pub fn find_method(methods: &'static [MethodDescriptor], name: &str) -> &'static MethodDescriptor {
    methods
        .iter()
        .find(|method| method.name == name)
        .unwrap_or(&UNKNOWN_METHOD)
}

/// Declares a proxy contract: the trait itself, its descriptor table, a
/// forwarding stub, a skeleton, and the [`ContractGlue`] row tying them
/// together.
///
/// Method signatures must take `&self`, own their arguments, and return
/// `Result<T, CallError>` (written literally); arguments and returns
/// marshal through [`IntoValue`](relay_core::IntoValue) /
/// [`FromValue`](relay_core::FromValue).
///
/// ```rust,ignore
/// relay_std::proxy_contract! {
///     /// Remote echo surface.
///     pub trait EchoService: "demo.EchoService" {
///         fn echo(&self, message: String) -> Result<String, CallError>;
///         fn total(&self, amount: i64) -> Result<i64, CallError>;
///     }
/// }
/// ```
#[macro_export]
macro_rules! proxy_contract {
    (
        $(#[$meta:meta])*
        $vis:vis trait $name:ident : $contract:literal {
            $(
                fn $method:ident(&self $(, $arg:ident : $aty:ty)* $(,)?) -> Result<$ret:ty, CallError>;
            )+
        }
    ) => {
        $(#[$meta])*
        $vis trait $name: Send + Sync {
            $(
                fn $method(
                    &self
                    $(, $arg: $aty)*
                ) -> ::std::result::Result<$ret, $crate::relay_core::CallError>;
            )+
        }

        const _: () = {
            static METHODS: &[$crate::relay_core::MethodDescriptor] = &[
                $(
                    $crate::relay_core::MethodDescriptor {
                        contract: $contract,
                        name: stringify!($method),
                        params: &[$(stringify!($aty)),*],
                    },
                )+
            ];

            struct Stub {
                handler: ::std::sync::Arc<dyn $crate::relay_core::CallHandler>,
            }

            impl $name for Stub {
                $(
                    fn $method(
                        &self
                        $(, $arg: $aty)*
                    ) -> ::std::result::Result<$ret, $crate::relay_core::CallError> {
                        let args = ::std::vec![
                            $($crate::relay_core::IntoValue::into_value($arg)),*
                        ];
                        let method = $crate::proxy::find_method(METHODS, stringify!($method));
                        let ret = self.handler.invoke(method, args)?;
                        $crate::relay_core::FromValue::from_value(ret)
                            .map_err($crate::relay_core::CallError::from)
                    }
                )+
            }

            struct Skeleton {
                target: ::std::sync::Arc<dyn $name>,
            }

            impl $crate::relay_core::CallHandler for Skeleton {
                #[allow(unused_mut, unused_variables)]
                fn invoke(
                    &self,
                    method: &$crate::relay_core::MethodDescriptor,
                    args: ::std::vec::Vec<$crate::relay_core::Value>,
                ) -> ::std::result::Result<$crate::relay_core::Value, $crate::relay_core::CallError>
                {
                    match method.name {
                        $(
                            stringify!($method) => {
                                let mut args = args.into_iter();
                                $(
                                    let $arg: $aty = $crate::relay_core::FromValue::from_value(
                                        args.next().unwrap_or($crate::relay_core::Value::Null),
                                    )
                                    .map_err($crate::relay_core::CallError::from)?;
                                )*
                                let out = self.target.$method($($arg),*)?;
                                ::std::result::Result::Ok(
                                    $crate::relay_core::IntoValue::into_value(out),
                                )
                            }
                        )+
                        _ => ::std::result::Result::Err(
                            $crate::relay_core::CallError::Unsupported {
                                method: method.signature(),
                            },
                        ),
                    }
                }
            }

            fn make_stub(
                handler: ::std::sync::Arc<dyn $crate::relay_core::CallHandler>,
            ) -> $crate::registration::ErasedInstance {
                let stub: ::std::sync::Arc<dyn $name> = ::std::sync::Arc::new(Stub { handler });
                ::std::boxed::Box::new(stub)
            }

            fn make_skeleton(
                target: $crate::registration::ErasedInstance,
            ) -> ::std::option::Option<::std::sync::Arc<dyn $crate::relay_core::CallHandler>> {
                match target.downcast::<::std::sync::Arc<dyn $name>>() {
                    ::std::result::Result::Ok(typed) => ::std::option::Option::Some(
                        ::std::sync::Arc::new(Skeleton { target: *typed }),
                    ),
                    ::std::result::Result::Err(_) => ::std::option::Option::None,
                }
            }

            $crate::inventory::submit! {
                $crate::proxy::ContractGlue {
                    contract: $contract,
                    id: ::std::any::TypeId::of::<dyn $name>(),
                    methods: METHODS,
                    make_stub: make_stub,
                    make_skeleton: make_skeleton,
                }
            }
        };
    };
}
