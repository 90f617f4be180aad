//! The extension world handle.
//!
//! An [`ExtensionHost`] owns every per-contract registry created within it,
//! the synthesized proxy-class cache and the declaration-scan configuration.
//! Hosts are independent worlds: two hosts never share instances or caches.
//! Most programs use the process default, [`ExtensionHost::global`]; tests
//! build isolated hosts through [`ExtensionHost::builder`].

use std::any::TypeId;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock, PoisonError, RwLock};

use relay_core::{ExtensionPoint, ProxyError, RelayError};

use crate::factory::ExtensionFactory;
use crate::proxy::{MAX_PROXY_CONTRACTS, ProxyClass, glue_by_name};
use crate::registration::PointRegistration;
use crate::registry::{ErasedRegistry, ExtensionRegistry};

bitflags::bitflags! {
    /// Which declaration source families the loader consults.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ScanFlags: u8 {
        /// Link-time [`DeclarationSource`](crate::registration::DeclarationSource)
        /// rows compiled into the binary.
        const EMBEDDED = 1;
        /// `<root>/<location><contract>` files under the host's roots.
        const FILESYSTEM = 1 << 1;
    }
}

impl Default for ScanFlags {
    fn default() -> Self {
        Self::EMBEDDED | Self::FILESYSTEM
    }
}

enum ProxySlot {
    /// A build is in flight; waiters block on the condvar.
    Pending,
    Ready(Arc<ProxyClass>),
}

/// Evicts the `Pending` marker if a proxy build unwinds, so waiters on
/// the condvar are not stranded.
struct PendingGuard<'a> {
    host: &'a ExtensionHost,
    key: &'a str,
    done: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut cache = self
            .host
            .proxy_classes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        cache.remove(self.key);
        drop(cache);
        self.host.proxy_ready.notify_all();
    }
}

/// One extension world: registries, proxy cache, scan configuration.
pub struct ExtensionHost {
    roots: Vec<PathBuf>,
    flags: ScanFlags,
    registries: RwLock<HashMap<TypeId, Arc<dyn ErasedRegistry>>>,
    proxy_classes: Mutex<HashMap<String, ProxySlot>>,
    proxy_ready: Condvar,
    proxy_counter: AtomicU64,
    stopped: AtomicBool,
}

impl ExtensionHost {
    /// Starts building an isolated host.
    pub fn builder() -> HostBuilder {
        HostBuilder::new()
    }

    /// The process-default world, created on first use with the default
    /// scan flags and no filesystem roots.
    pub fn global() -> Arc<ExtensionHost> {
        static GLOBAL: OnceLock<Arc<ExtensionHost>> = OnceLock::new();
        GLOBAL.get_or_init(|| ExtensionHost::builder().build()).clone()
    }

    /// The registry for contract `P`, created on first use.
    pub fn registry<P: ExtensionPoint + ?Sized>(self: &Arc<Self>) -> Arc<ExtensionRegistry<P>> {
        let id = TypeId::of::<P>();
        let existing = self
            .registries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned();
        let erased = match existing {
            Some(erased) => erased,
            None => self
                .registries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(id)
                .or_insert_with(|| Arc::new(ExtensionRegistry::<P>::new(Arc::downgrade(self))))
                .clone(),
        };
        erased
            .into_any()
            .downcast::<ExtensionRegistry<P>>()
            .expect("registry map entries are keyed by their contract type")
    }

    /// Type-erased registry lookup by contract type id, used by the
    /// injection path. Creates the registry when the contract has a
    /// registered [`PointRegistration`] row; unknown ids yield `None`.
    pub fn registry_by_id(self: &Arc<Self>, id: TypeId) -> Option<Arc<dyn ErasedRegistry>> {
        if let Some(existing) = self
            .registries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
        {
            return Some(existing);
        }
        let row = self.point_row(id)?;
        Some((row.make_registry)(self))
    }

    pub(crate) fn point_row(&self, id: TypeId) -> Option<&'static PointRegistration> {
        inventory::iter::<PointRegistration>
            .into_iter()
            .find(|row| row.id == id)
    }

    pub(crate) fn object_factory(
        self: &Arc<Self>,
    ) -> Result<Arc<dyn ExtensionFactory>, RelayError> {
        self.registry::<dyn ExtensionFactory>().get_adaptive()
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// The configured scan flags.
    pub fn scan_flags(&self) -> ScanFlags {
        self.flags
    }

    /// The configured filesystem roots, in scan order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    // ------------------------------------------------------------------
    // Proxy classes
    // ------------------------------------------------------------------

    /// The cached proxy class over the named contracts, synthesized on
    /// first request. The cache key ignores ordering and duplicates;
    /// concurrent requests for one key block on the in-flight build and
    /// share the winner. Failures evict the in-flight marker and are not
    /// cached, so a later request retries.
    pub fn proxy_class(&self, contracts: &[&str]) -> Result<Arc<ProxyClass>, RelayError> {
        if contracts.is_empty() {
            return Err(ProxyError::NoContracts.into());
        }
        if contracts.len() > MAX_PROXY_CONTRACTS {
            return Err(ProxyError::TooManyContracts {
                limit: MAX_PROXY_CONTRACTS,
                got: contracts.len(),
            }
            .into());
        }
        let mut names: Vec<&str> = contracts.to_vec();
        names.sort_unstable();
        names.dedup();
        let key = names.join(";");

        let mut cache = self
            .proxy_classes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            match cache.get(&key) {
                Some(ProxySlot::Ready(class)) => return Ok(class.clone()),
                Some(ProxySlot::Pending) => {
                    cache = self
                        .proxy_ready
                        .wait(cache)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                None => {
                    cache.insert(key.clone(), ProxySlot::Pending);
                    break;
                }
            }
        }
        drop(cache);

        let mut guard = PendingGuard {
            host: self,
            key: key.as_str(),
            done: false,
        };
        let built = self.build_proxy_class(&names);
        guard.done = true;
        drop(guard);

        let mut cache = self
            .proxy_classes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let result = match built {
            Ok(class) => {
                cache.insert(key, ProxySlot::Ready(class.clone()));
                Ok(class)
            }
            Err(err) => {
                cache.remove(&key);
                Err(err)
            }
        };
        drop(cache);
        self.proxy_ready.notify_all();
        result
    }

    fn build_proxy_class(&self, names: &[&str]) -> Result<Arc<ProxyClass>, RelayError> {
        let mut glues = Vec::with_capacity(names.len());
        for name in names {
            glues.push(glue_by_name(name).ok_or_else(|| ProxyError::UnknownContract {
                name: (*name).to_string(),
            })?);
        }
        let label = format!("proxy{}", self.proxy_counter.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(label = %label, contracts = %names.join(";"), "synthesized proxy class");
        Ok(Arc::new(ProxyClass::build(label, glues)))
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Drops the registry for `P` together with every instance it cached,
    /// so the next access rebuilds from the declaration sources.
    /// Test-oriented.
    pub fn reset<P: ExtensionPoint + ?Sized>(&self) {
        self.registries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&TypeId::of::<P>());
    }

    /// Shuts the world down: every registry's raw instances get their
    /// [`Lifecycle::destroy`](relay_core::Lifecycle::destroy) call, once.
    /// Runs at most once; later calls are no-ops. Instances already cached
    /// in a live registry handle stay readable, but constructing anything
    /// new through this host is refused afterwards.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let registries: Vec<Arc<dyn ErasedRegistry>> = self
            .registries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, registry)| registry)
            .collect();
        for registry in registries {
            tracing::debug!(point = registry.point_name(), "destroying extension instances");
            registry.shutdown();
        }
    }
}

/// Configures and builds an [`ExtensionHost`].
pub struct HostBuilder {
    roots: Vec<PathBuf>,
    flags: ScanFlags,
}

impl HostBuilder {
    fn new() -> Self {
        Self {
            roots: Vec::new(),
            flags: ScanFlags::default(),
        }
    }

    /// Adds a filesystem root to scan for declaration files.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.roots.push(path.into());
        self
    }

    /// Replaces the scan flags. `ScanFlags::EMBEDDED` alone isolates the
    /// host from the filesystem entirely.
    pub fn scan(mut self, flags: ScanFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Builds the host.
    pub fn build(self) -> Arc<ExtensionHost> {
        Arc::new(ExtensionHost {
            roots: self.roots,
            flags: self.flags,
            registries: RwLock::new(HashMap::new()),
            proxy_classes: Mutex::new(HashMap::new()),
            proxy_ready: Condvar::new(),
            proxy_counter: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
        })
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}
