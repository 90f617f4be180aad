//! Dispatch metadata for synthesized adaptive instances.
//!
//! Instead of generating an adapter per contract, a contract registers a
//! [`DispatchProfile`] describing which methods dispatch and on which
//! selector keys, plus a constructor for a hand-written adapter. The
//! adapter's dispatching methods call [`MethodDispatch::resolve`] to turn a
//! selector into an implementation name and then forward through the
//! registry; its remaining methods report [`not_adaptive`].

use relay_core::{DispatchError, RelayError, Selector};

use crate::registration::Construct;

/// Dispatch metadata for one contract method.
pub struct MethodDispatch {
    /// Method name.
    pub name: &'static str,
    /// Selector keys consulted left to right; empty means the profile's
    /// default key.
    pub keys: &'static [&'static str],
    /// Whether the method receives a call-context argument whose method
    /// name scopes parameter lookups.
    pub context_scoped: bool,
}

/// Dispatch metadata for one contract.
pub struct DispatchProfile {
    /// Key consulted by methods that list none, conventionally the dotted
    /// lower-case rendering of the contract's simple name.
    pub default_key: &'static str,
    /// The dispatching methods. An empty table means the contract cannot
    /// have an adaptive instance synthesized.
    pub methods: &'static [MethodDispatch],
    /// Constructor for the adapter instance.
    pub construct: Construct,
}

impl DispatchProfile {
    /// Looks up a method's dispatch entry.
    pub fn method(&self, name: &str) -> Option<&MethodDispatch> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl MethodDispatch {
    /// Resolves the implementation name for one call.
    ///
    /// Keys are walked left to right; the key `protocol` reads the
    /// selector's protocol field, every other key reads a method-scoped
    /// parameter when the entry is context-scoped and `invoked_method` is
    /// given (falling back to the flat parameters) and a flat parameter
    /// otherwise. Empty values are skipped. After the last key the
    /// contract default applies; with no default the walk fails, naming
    /// the keys and the selector.
    pub fn resolve(
        &self,
        profile: &DispatchProfile,
        default_name: Option<&str>,
        selector: &Selector,
        invoked_method: Option<&str>,
        point: &'static str,
    ) -> Result<String, RelayError> {
        let keys: &[&str] = if self.keys.is_empty() {
            std::slice::from_ref(&profile.default_key)
        } else {
            self.keys
        };
        let scope = if self.context_scoped {
            invoked_method
        } else {
            None
        };

        for key in keys {
            let found = if *key == "protocol" {
                selector.protocol()
            } else {
                match scope {
                    Some(method) => selector.method_param(method, key),
                    None => selector.param(key),
                }
            };
            match found {
                Some(value) if !value.is_empty() => return Ok(value.to_string()),
                _ => {}
            }
        }
        if let Some(default) = default_name {
            return Ok(default.to_string());
        }
        Err(DispatchError::NoSelectorValue {
            point,
            keys: keys.join(", "),
            selector: selector.to_string(),
        }
        .into())
    }
}

/// The error a hand-written adapter returns from methods outside its
/// dispatch surface.
pub fn not_adaptive(point: &'static str, method: &'static str) -> RelayError {
    DispatchError::NotAdaptive { point, method }.into()
}
