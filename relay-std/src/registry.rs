//! Per-contract extension registries.
//!
//! A registry owns everything the runtime knows about one contract on one
//! host: the lazily-built descriptor store, the per-name instance cache,
//! the per-implementation raw singletons and the adaptive slot. Named
//! construction runs the full pipeline (raw instance, injection, decorator
//! chain, lifecycle initialization); concurrent requests for one name
//! serialize on that name's holder and construct exactly once.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock, Weak};
use std::thread::{self, ThreadId};

use relay_core::{
    ConfigError, ExtensionPoint, Lifecycle, RelayError, ResolutionError, Selector, SynthesisError,
};

use crate::factory::ExtensionFactory;
use crate::host::ExtensionHost;
use crate::loader::{load_store, split_names};
use crate::registration::{ErasedInstance, ExtensionKind, ExtensionRegistration};
use crate::store::DescriptorStore;

// ============================================================================
// InjectCtx - constructor-side dependency lookup
// ============================================================================

/// Handed to every constructor and decorator. Grants access to the host and
/// to property injection through the host's adaptive factory.
pub struct InjectCtx<'a> {
    pub(crate) host: &'a Arc<ExtensionHost>,
    pub(crate) factory: Option<Arc<dyn ExtensionFactory>>,
    pub(crate) point: &'static str,
    pub(crate) name: &'a str,
}

impl InjectCtx<'_> {
    /// The host this construction runs on.
    pub fn host(&self) -> &Arc<ExtensionHost> {
        self.host
    }

    /// The contract being constructed.
    pub fn point(&self) -> &'static str {
        self.point
    }

    /// The resolution name being constructed.
    pub fn requested_name(&self) -> &str {
        self.name
    }

    /// Looks up a collaborator by contract type and property name through
    /// the injection factories. Failures are logged and skipped: a missing
    /// or broken collaborator never fails the construction.
    pub fn request<Q: ExtensionPoint + ?Sized>(&self, property: &str) -> Option<Arc<Q>> {
        let factory = self.factory.as_ref()?;
        match factory.find(self.host, TypeId::of::<Q>(), property) {
            Ok(Some(erased)) => match erased.downcast::<Arc<Q>>() {
                Ok(instance) => Some(*instance),
                Err(_) => {
                    tracing::warn!(
                        point = self.point,
                        name = self.name,
                        property,
                        "injected value had an unexpected type, skipping"
                    );
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(
                    point = self.point,
                    name = self.name,
                    property,
                    error = %err,
                    "failed to inject property, skipping"
                );
                None
            }
        }
    }
}

// ============================================================================
// Type-erased registry access
// ============================================================================

/// The registry surface available without knowing the contract type,
/// used by the injection path and the host's shutdown sweep.
pub trait ErasedRegistry: Send + Sync {
    /// Contract name.
    fn point_name(&self) -> &'static str;

    /// `get`, erased: the box holds an `Arc<dyn Contract>`.
    fn get_erased(&self, name: &str) -> Result<ErasedInstance, RelayError>;

    /// `get_adaptive`, erased.
    fn adaptive_erased(&self) -> Result<ErasedInstance, RelayError>;

    /// All declared names, sorted.
    fn names(&self) -> Result<Vec<String>, RelayError>;

    /// Destroys the registry's raw instances.
    fn shutdown(&self);

    /// Recovers the typed registry.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

// ============================================================================
// Internal cache cells
// ============================================================================

struct Holder<P: ?Sized> {
    cell: Mutex<Option<Arc<P>>>,
}

impl<P: ?Sized> Holder<P> {
    fn new() -> Self {
        Self {
            cell: Mutex::new(None),
        }
    }
}

struct RawEntry<P: ?Sized> {
    instance: Arc<P>,
    lifecycle: Option<Arc<dyn Lifecycle>>,
}

impl<P: ?Sized> Clone for RawEntry<P> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            lifecycle: self.lifecycle.clone(),
        }
    }
}

struct AdaptiveState<P: ?Sized> {
    outcome: Option<Result<Arc<P>, String>>,
    building: Option<ThreadId>,
    attempts: usize,
}

impl<P: ?Sized> AdaptiveState<P> {
    fn new() -> Self {
        Self {
            outcome: None,
            building: None,
            attempts: 0,
        }
    }
}

/// Clears the in-flight marker if the adaptive build unwinds, so waiters
/// on the condvar are not stranded.
struct BuildGuard<'a, P: ExtensionPoint + ?Sized> {
    registry: &'a ExtensionRegistry<P>,
    done: bool,
}

impl<P: ExtensionPoint + ?Sized> Drop for BuildGuard<'_, P> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut state = self
            .registry
            .adaptive
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.building = None;
        drop(state);
        self.registry.adaptive_done.notify_all();
    }
}

// ============================================================================
// ExtensionRegistry
// ============================================================================

/// The per-contract registry. Obtained through
/// [`ExtensionHost::registry`](crate::host::ExtensionHost::registry).
pub struct ExtensionRegistry<P: ExtensionPoint + ?Sized> {
    host: Weak<ExtensionHost>,
    store: RwLock<Option<Arc<DescriptorStore>>>,
    holders: RwLock<HashMap<String, Arc<Holder<P>>>>,
    raw: Mutex<HashMap<TypeId, RawEntry<P>>>,
    adaptive: Mutex<AdaptiveState<P>>,
    adaptive_done: Condvar,
}

impl<P: ExtensionPoint + ?Sized> ExtensionRegistry<P> {
    pub(crate) fn new(host: Weak<ExtensionHost>) -> Self {
        Self {
            host,
            store: RwLock::new(None),
            holders: RwLock::new(HashMap::new()),
            raw: Mutex::new(HashMap::new()),
            adaptive: Mutex::new(AdaptiveState::new()),
            adaptive_done: Condvar::new(),
        }
    }

    fn host(&self) -> Result<Arc<ExtensionHost>, RelayError> {
        let host = self
            .host
            .upgrade()
            .ok_or(ConfigError::HostReleased)?;
        if host.is_shut_down() {
            return Err(ConfigError::HostStopped.into());
        }
        Ok(host)
    }

    /// The descriptor store, built on first use.
    fn store(&self) -> Result<Arc<DescriptorStore>, RelayError> {
        if let Some(store) = self
            .store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(store.clone());
        }
        let mut guard = self.store.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(store) = guard.as_ref() {
            return Ok(store.clone());
        }
        let host = self.host()?;
        let built = Arc::new(load_store::<P>(&host)?);
        *guard = Some(built.clone());
        Ok(built)
    }

    /// Resolves a name through the full pipeline. `""` is refused and
    /// `"true"` resolves the contract default.
    pub fn get(&self, name: &str) -> Result<Arc<P>, RelayError> {
        if name.is_empty() {
            return Err(ConfigError::EmptyName.into());
        }
        if name == "true" {
            return self
                .get_default()?
                .ok_or_else(|| ResolutionError::NoDefault { point: P::NAME }.into());
        }
        self.resolve(name, true)
    }

    /// Resolves a name but skips the decorator chain. The returned instance
    /// is the raw singleton also underlying decorated resolutions.
    pub fn get_undecorated(&self, name: &str) -> Result<Arc<P>, RelayError> {
        if name.is_empty() {
            return Err(ConfigError::EmptyName.into());
        }
        let resolved = if name == "true" {
            match self.store()?.default_name.clone() {
                Some(default) => default,
                None => return Err(ResolutionError::NoDefault { point: P::NAME }.into()),
            }
        } else {
            name.to_string()
        };
        self.resolve(&resolved, false)
    }

    /// The default implementation, if the contract declares one.
    pub fn get_default(&self) -> Result<Option<Arc<P>>, RelayError> {
        let store = self.store()?;
        match store.default_name.clone() {
            Some(name) => self.get(&name).map(Some),
            None => Ok(None),
        }
    }

    /// `get(name)`, falling back to the default for unknown names.
    pub fn get_or_default(&self, name: &str) -> Result<Arc<P>, RelayError> {
        if name.is_empty() {
            return Err(ConfigError::EmptyName.into());
        }
        if self.has(name)? {
            return self.get(name);
        }
        match self.get_default()? {
            Some(instance) => Ok(instance),
            None => Err(self.store()?.not_found(name)),
        }
    }

    /// Whether `name` is declared, without constructing anything.
    pub fn has(&self, name: &str) -> Result<bool, RelayError> {
        Ok(self.store()?.lookup(name).is_some())
    }

    /// All declared names, sorted.
    pub fn names(&self) -> Result<Vec<String>, RelayError> {
        Ok(self.store()?.names.keys().cloned().collect())
    }

    /// The declared default name, if any.
    pub fn default_name(&self) -> Result<Option<String>, RelayError> {
        Ok(self.store()?.default_name.clone())
    }

    /// The already-constructed instance for `name`, if there is one.
    pub fn peek(&self, name: &str) -> Option<Arc<P>> {
        let holder = self
            .holders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)?
            .clone();
        let cell = holder.cell.lock().unwrap_or_else(PoisonError::into_inner);
        cell.clone()
    }

    /// Names with an already-constructed instance, sorted.
    pub fn loaded_names(&self) -> Vec<String> {
        let holders = self.holders.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = holders
            .iter()
            .filter(|(_, holder)| {
                holder
                    .cell
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some()
            })
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Already-constructed instances, ordered by name.
    pub fn loaded_instances(&self) -> Vec<Arc<P>> {
        let holders = self.holders.read().unwrap_or_else(PoisonError::into_inner);
        let mut loaded: Vec<(String, Arc<P>)> = holders
            .iter()
            .filter_map(|(name, holder)| {
                holder
                    .cell
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
                    .map(|instance| (name.clone(), instance))
            })
            .collect();
        loaded.sort_by(|a, b| a.0.cmp(&b.0));
        loaded.into_iter().map(|(_, instance)| instance).collect()
    }

    fn resolve(&self, name: &str, decorate: bool) -> Result<Arc<P>, RelayError> {
        let store = self.store()?;
        let Some(row) = store.lookup(name) else {
            return Err(store.not_found(name));
        };
        if !decorate {
            return Ok(self.raw_singleton(name, row)?.instance);
        }

        let holder = self.holder(name);
        let mut cell = holder.cell.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = cell.as_ref() {
            return Ok(existing.clone());
        }
        let built = self.construct(&store, name, row)?;
        *cell = Some(built.clone());
        Ok(built)
    }

    fn holder(&self, name: &str) -> Arc<Holder<P>> {
        if let Some(holder) = self
            .holders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return holder.clone();
        }
        self.holders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Holder::new()))
            .clone()
    }

    /// The shared raw instance of a row's implementation, constructing it
    /// if needed. Construction runs outside the map lock; when two threads
    /// race, the loser's instance is discarded.
    fn raw_singleton(
        &self,
        name: &str,
        row: &'static ExtensionRegistration,
    ) -> Result<RawEntry<P>, RelayError> {
        if let Some(entry) = self
            .raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&row.impl_id)
        {
            return Ok(entry.clone());
        }

        let ExtensionKind::Normal { construct } = &row.kind else {
            return Err(instantiation_failure(
                P::NAME,
                name,
                row.type_key,
                "row is not a named implementation".into(),
            ));
        };
        let host = self.host()?;
        let factory = self.injection_factory(&host)?;
        let ctx = InjectCtx {
            host: &host,
            factory,
            point: P::NAME,
            name,
        };
        let constructed = construct(&ctx)
            .map_err(|err| instantiation_failure(P::NAME, name, row.type_key, Box::new(err)))?;
        let instance = open_instance::<P>(constructed.instance, name, row.type_key)?;
        let entry = RawEntry {
            instance,
            lifecycle: constructed.lifecycle,
        };
        let mut raw = self.raw.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(raw.entry(row.impl_id).or_insert(entry).clone())
    }

    /// Full pipeline: raw singleton, decorator chain, lifecycle init.
    /// Decorators apply in ascending priority so the highest priority one
    /// ends up outermost; initialization runs on the final instance's
    /// lifecycle view only.
    fn construct(
        &self,
        store: &Arc<DescriptorStore>,
        name: &str,
        row: &'static ExtensionRegistration,
    ) -> Result<Arc<P>, RelayError> {
        let raw = self.raw_singleton(name, row)?;
        let host = self.host()?;
        let factory = self.injection_factory(&host)?;

        let mut instance = raw.instance;
        let mut lifecycle = raw.lifecycle;
        for decorator in store.decorators_for(name) {
            let ExtensionKind::Decorator { wrap, .. } = &decorator.kind else {
                continue;
            };
            let ctx = InjectCtx {
                host: &host,
                factory: factory.clone(),
                point: P::NAME,
                name,
            };
            let built = wrap(Box::new(instance), &ctx).map_err(|err| {
                instantiation_failure(P::NAME, name, decorator.type_key, Box::new(err))
            })?;
            instance = open_instance::<P>(built.instance, name, decorator.type_key)?;
            lifecycle = built.lifecycle;
        }

        if let Some(view) = &lifecycle {
            view.initialize()
                .map_err(|err| instantiation_failure(P::NAME, name, row.type_key, err))?;
        }
        tracing::debug!(point = P::NAME, name, "built extension instance");
        Ok(instance)
    }

    fn injection_factory(
        &self,
        host: &Arc<ExtensionHost>,
    ) -> Result<Option<Arc<dyn ExtensionFactory>>, RelayError> {
        // The factory contract is the root of the injection graph and gets
        // no injection itself.
        if TypeId::of::<P>() == TypeId::of::<dyn ExtensionFactory>() {
            return Ok(None);
        }
        host.object_factory().map(Some)
    }

    // ------------------------------------------------------------------
    // Adaptive instances
    // ------------------------------------------------------------------

    /// The contract's adaptive instance. Built at most once; the outcome,
    /// success or failure, is cached and replayed identically. Concurrent
    /// requests block on the in-flight build; a recursive request from the
    /// building thread errors instead of deadlocking.
    pub fn get_adaptive(&self) -> Result<Arc<P>, RelayError> {
        let mut state = self.adaptive.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(outcome) = &state.outcome {
                return match outcome {
                    Ok(instance) => Ok(instance.clone()),
                    Err(detail) => Err(SynthesisError::Failed {
                        point: P::NAME,
                        detail: detail.clone(),
                    }
                    .into()),
                };
            }
            match state.building {
                Some(owner) if owner == thread::current().id() => {
                    return Err(SynthesisError::Failed {
                        point: P::NAME,
                        detail: "recursive adaptive construction".to_string(),
                    }
                    .into());
                }
                Some(_) => {
                    state = self
                        .adaptive_done
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                None => {
                    state.building = Some(thread::current().id());
                    state.attempts += 1;
                    break;
                }
            }
        }
        drop(state);

        let mut guard = BuildGuard {
            registry: self,
            done: false,
        };
        let built = self.build_adaptive();
        guard.done = true;
        drop(guard);

        let mut state = self.adaptive.lock().unwrap_or_else(PoisonError::into_inner);
        state.building = None;
        let result = match built {
            Ok(instance) => {
                state.outcome = Some(Ok(instance.clone()));
                Ok(instance)
            }
            Err(err) => {
                let detail = err.to_string();
                state.outcome = Some(Err(detail.clone()));
                Err(SynthesisError::Failed {
                    point: P::NAME,
                    detail,
                }
                .into())
            }
        };
        drop(state);
        self.adaptive_done.notify_all();
        result
    }

    /// How many adaptive builds actually ran. A cached outcome keeps this
    /// at its value after the first build.
    pub fn synthesis_attempts(&self) -> usize {
        self.adaptive
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .attempts
    }

    fn build_adaptive(&self) -> Result<Arc<P>, RelayError> {
        let store = self.store()?;
        let host = self.host()?;
        let factory = self.injection_factory(&host)?;
        let ctx = InjectCtx {
            host: &host,
            factory,
            point: P::NAME,
            name: "adaptive",
        };

        // An explicitly registered adaptive implementation wins over a
        // dispatch profile.
        if let Some(row) = store.adaptive {
            let ExtensionKind::Adaptive { construct } = &row.kind else {
                return Err(SynthesisError::NoDispatchableMethods { point: P::NAME }.into());
            };
            let built = construct(&ctx).map_err(|err| {
                instantiation_failure(P::NAME, "adaptive", row.type_key, Box::new(err))
            })?;
            return open_instance::<P>(built.instance, "adaptive", row.type_key);
        }

        let profile = host
            .point_row(TypeId::of::<P>())
            .and_then(|row| row.dispatch);
        let Some(profile) = profile else {
            return Err(SynthesisError::NoDispatchableMethods { point: P::NAME }.into());
        };
        if profile.methods.is_empty() {
            return Err(SynthesisError::NoDispatchableMethods { point: P::NAME }.into());
        }
        let built = (profile.construct)(&ctx).map_err(|err| {
            instantiation_failure(P::NAME, "adaptive", "dispatch profile", Box::new(err))
        })?;
        open_instance::<P>(built.instance, "adaptive", "dispatch profile")
    }

    // ------------------------------------------------------------------
    // Programmatic registration
    // ------------------------------------------------------------------

    /// Registers a row at runtime. Adaptive rows may not displace an
    /// existing adaptive registration; named rows need an unused name.
    pub fn add_extension(
        &self,
        name: &str,
        row: &'static ExtensionRegistration,
    ) -> Result<(), RelayError> {
        let _ = self.store()?;
        let mut guard = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = match guard.as_deref() {
            Some(current) => current.clone(),
            None => load_store::<P>(&*self.host()?)?,
        };

        match &row.kind {
            ExtensionKind::Adaptive { .. } => {
                if let Some(existing) = next.adaptive {
                    return Err(ConfigError::AdaptiveConflict {
                        point: P::NAME,
                        kept: existing.type_key,
                        offered: row.type_key,
                    }
                    .into());
                }
                next.adaptive = Some(row);
            }
            ExtensionKind::Decorator { .. } => {
                next.register_decorator(row);
            }
            ExtensionKind::Normal { .. } => {
                if name.is_empty() {
                    return Err(ConfigError::EmptyName.into());
                }
                if next.names.contains_key(name) {
                    return Err(ConfigError::DuplicateName {
                        point: P::NAME,
                        name: name.to_string(),
                    }
                    .into());
                }
                next.names.insert(name.to_string(), row);
                if row.activation.is_some() {
                    next.register_activate(name, row);
                }
            }
        }
        *guard = Some(Arc::new(next));
        Ok(())
    }

    /// Replaces an existing registration. The name's cached instance is
    /// evicted; replacing the adaptive registration clears the cached
    /// adaptive outcome, including a cached failure.
    pub fn replace_extension(
        &self,
        name: &str,
        row: &'static ExtensionRegistration,
    ) -> Result<(), RelayError> {
        let _ = self.store()?;
        let mut guard = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = match guard.as_deref() {
            Some(current) => current.clone(),
            None => load_store::<P>(&*self.host()?)?,
        };

        match &row.kind {
            ExtensionKind::Adaptive { .. } => {
                if next.adaptive.is_none() {
                    return Err(ConfigError::AdaptiveMissing { point: P::NAME }.into());
                }
                next.adaptive = Some(row);
                let mut state = self.adaptive.lock().unwrap_or_else(PoisonError::into_inner);
                state.outcome = None;
            }
            ExtensionKind::Decorator { .. } => {
                return Err(ConfigError::ReplaceMissing {
                    point: P::NAME,
                    name: name.to_string(),
                }
                .into());
            }
            ExtensionKind::Normal { .. } => {
                if name.is_empty() {
                    return Err(ConfigError::EmptyName.into());
                }
                if !next.names.contains_key(name) {
                    return Err(ConfigError::ReplaceMissing {
                        point: P::NAME,
                        name: name.to_string(),
                    }
                    .into());
                }
                next.names.insert(name.to_string(), row);
                if row.activation.is_some() {
                    next.register_activate(name, row);
                } else {
                    next.activates.retain(|(n, _)| n != name);
                }
                self.holders
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(name);
            }
        }
        *guard = Some(Arc::new(next));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Activation selection
    // ------------------------------------------------------------------

    /// Resolves the activated set for a request: rule-matched
    /// implementations (group and key matched, sorted by priority) followed
    /// by the explicitly requested names in listed order. `-name` drops a
    /// name from both sets, `-default` drops the whole rule-matched set,
    /// and the literal `default` marks where the rule-matched set sits
    /// relative to the explicit names.
    pub fn get_activated(
        &self,
        selector: &Selector,
        names: &[&str],
        group: &str,
    ) -> Result<Vec<Arc<P>>, RelayError> {
        let store = self.store()?;
        let mut activated: Vec<Arc<P>> = Vec::new();

        if !names.iter().any(|n| *n == "-default") {
            let mut matched: Vec<(i32, &str)> = Vec::new();
            for (name, row) in &store.activates {
                let Some(rule) = row.activation else {
                    continue;
                };
                if !rule.matches_group(group) {
                    continue;
                }
                if names
                    .iter()
                    .any(|n| *n == name.as_str() || *n == format!("-{name}"))
                {
                    continue;
                }
                if rule.is_active(selector) {
                    matched.push((row.priority, name.as_str()));
                }
            }
            matched.sort_by_key(|(priority, _)| *priority);
            for (_, name) in matched {
                activated.push(self.get(name)?);
            }
        }

        let mut explicit: Vec<Arc<P>> = Vec::new();
        for name in names {
            if name.starts_with('-') || names.iter().any(|n| *n == format!("-{name}")) {
                continue;
            }
            if *name == "default" {
                if !explicit.is_empty() {
                    let head = std::mem::take(&mut explicit);
                    activated.splice(0..0, head);
                }
            } else {
                explicit.push(self.get(name)?);
            }
        }
        activated.extend(explicit);
        Ok(activated)
    }

    /// [`get_activated`](Self::get_activated) with the request list read
    /// from a selector parameter (split on commas and whitespace).
    pub fn get_activated_by_key(
        &self,
        selector: &Selector,
        key: &str,
        group: &str,
    ) -> Result<Vec<Arc<P>>, RelayError> {
        let raw = selector.param(key).unwrap_or("");
        let names = split_names(raw);
        self.get_activated(selector, &names, group)
    }

    // ------------------------------------------------------------------
    // Shutdown
    // ------------------------------------------------------------------

    /// Destroys the raw instances. Decorator chains are not walked; the
    /// destroy side of the lifecycle belongs to raw instances.
    pub(crate) fn shutdown_raw(&self) {
        let entries: Vec<RawEntry<P>> = {
            let mut raw = self.raw.lock().unwrap_or_else(PoisonError::into_inner);
            raw.drain().map(|(_, entry)| entry).collect()
        };
        for entry in entries {
            if let Some(lifecycle) = &entry.lifecycle {
                if let Err(err) = lifecycle.destroy() {
                    tracing::error!(
                        point = P::NAME,
                        error = %err,
                        "failed to destroy extension instance"
                    );
                }
            }
        }
    }
}

impl<P: ExtensionPoint + ?Sized> ErasedRegistry for ExtensionRegistry<P> {
    fn point_name(&self) -> &'static str {
        P::NAME
    }

    fn get_erased(&self, name: &str) -> Result<ErasedInstance, RelayError> {
        self.get(name)
            .map(|instance| Box::new(instance) as ErasedInstance)
    }

    fn adaptive_erased(&self) -> Result<ErasedInstance, RelayError> {
        self.get_adaptive()
            .map(|instance| Box::new(instance) as ErasedInstance)
    }

    fn names(&self) -> Result<Vec<String>, RelayError> {
        ExtensionRegistry::names(self)
    }

    fn shutdown(&self) {
        self.shutdown_raw();
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

fn instantiation_failure(
    point: &'static str,
    name: &str,
    type_key: &'static str,
    source: Box<dyn std::error::Error + Send + Sync>,
) -> RelayError {
    ConfigError::Instantiation {
        point,
        name: name.to_string(),
        type_key,
        source,
    }
    .into()
}

fn open_instance<P: ExtensionPoint + ?Sized>(
    instance: ErasedInstance,
    name: &str,
    type_key: &'static str,
) -> Result<Arc<P>, RelayError> {
    instance.downcast::<Arc<P>>().map(|arc| *arc).map_err(|_| {
        instantiation_failure(
            P::NAME,
            name,
            type_key,
            "constructor produced a value of an unexpected type".into(),
        )
    })
}
