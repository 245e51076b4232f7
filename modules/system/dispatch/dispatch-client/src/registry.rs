use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use dispatch_sdk::{Endpoint, RegistryError, ServiceProfile};
use parking_lot::RwLock;

use crate::guard::call_hook;

/// A profile that passed initialization, together with the endpoint it produced.
pub struct RegisteredService {
    profile: Arc<dyn ServiceProfile>,
    endpoint: Endpoint,
}

impl std::fmt::Debug for RegisteredService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredService")
            .field("name", &self.profile.name())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl RegisteredService {
    #[must_use]
    pub fn name(&self) -> &str {
        self.profile.name()
    }

    #[must_use]
    pub fn profile(&self) -> &dyn ServiceProfile {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

/// Name → profile mapping shared by dispatchers.
///
/// Profiles are expected to be registered during startup, before dispatch
/// traffic begins. Registration and lookup are still safe to interleave:
/// writes take the lock exclusively, lookups only take it for reading.
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Arc<RegisteredService>>>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.names())
            .finish()
    }
}

impl ServiceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize `profile` and make it resolvable under its name.
    ///
    /// # Errors
    /// Returns `RegistryError::Duplicate` if the name is taken (the existing
    /// profile is kept), `RegistryError::EmptyName` for an empty name, and
    /// `RegistryError::Init` if the profile's `init` hook fails.
    pub fn register<P>(&self, profile: P) -> Result<(), RegistryError>
    where
        P: ServiceProfile + 'static,
    {
        self.register_shared(Arc::new(profile))
    }

    /// Same as [`ServiceRegistry::register`] for an already shared profile.
    ///
    /// # Errors
    /// See [`ServiceRegistry::register`].
    pub fn register_shared(&self, profile: Arc<dyn ServiceProfile>) -> Result<(), RegistryError> {
        let name = profile.name().to_owned();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.contains(&name) {
            tracing::warn!(service = %name, "rejected duplicate service registration");
            return Err(RegistryError::Duplicate { name });
        }

        // init runs outside the lock so a profile may consult the registry.
        let endpoint = call_hook("init", || profile.init())
            .and_then(|r| r)
            .map_err(|source| {
                tracing::warn!(service = %name, error = %source, "service initialization failed");
                RegistryError::Init {
                    name: name.clone(),
                    source,
                }
            })?;

        match self.services.write().entry(name) {
            Entry::Occupied(slot) => {
                let name = slot.key().clone();
                tracing::warn!(service = %name, "rejected duplicate service registration");
                Err(RegistryError::Duplicate { name })
            }
            Entry::Vacant(slot) => {
                tracing::info!(
                    service = %slot.key(),
                    base_url = %endpoint.base_url(),
                    timeout = ?endpoint.timeout(),
                    "service registered"
                );
                slot.insert(Arc::new(RegisteredService { profile, endpoint }));
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<RegisteredService>> {
        self.services.read().get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.services.read().contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    /// Drop every registered profile. Returns how many were removed.
    ///
    /// Results already produced are unaffected; dispatches started afterwards
    /// see an empty registry.
    #[must_use = "the count tells how many profiles were dropped"]
    pub fn shutdown(&self) -> usize {
        let removed = std::mem::take(&mut *self.services.write()).len();
        tracing::info!(removed, "service registry shut down");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_sdk::{DEFAULT_TIMEOUT, ProfileError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counting {
        name: &'static str,
        base_url: &'static str,
        inits: Arc<AtomicUsize>,
    }

    impl ServiceProfile for Counting {
        fn name(&self) -> &str {
            self.name
        }

        fn init(&self) -> Result<Endpoint, ProfileError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(Endpoint::new(self.base_url, DEFAULT_TIMEOUT))
        }
    }

    struct Failing;

    impl ServiceProfile for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn init(&self) -> Result<Endpoint, ProfileError> {
            Err(ProfileError::Init("no base url".into()))
        }
    }

    struct Panicking;

    impl ServiceProfile for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn init(&self) -> Result<Endpoint, ProfileError> {
            panic!("init exploded")
        }
    }

    fn counting(name: &'static str, base_url: &'static str) -> (Counting, Arc<AtomicUsize>) {
        let inits = Arc::new(AtomicUsize::new(0));
        (
            Counting {
                name,
                base_url,
                inits: Arc::clone(&inits),
            },
            inits,
        )
    }

    #[test]
    fn test_register_runs_init_once_and_resolves() {
        let registry = ServiceRegistry::new();
        let (profile, inits) = counting("A", "http://a.local");

        registry.register(profile).unwrap();

        assert_eq!(inits.load(Ordering::SeqCst), 1);
        let service = registry.lookup("A").unwrap();
        assert_eq!(service.name(), "A");
        assert_eq!(service.endpoint().base_url(), "http://a.local");
        assert_eq!(service.endpoint().timeout(), DEFAULT_TIMEOUT);

        let _ = registry.lookup("A");
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_is_rejected_and_first_kept() {
        let registry = ServiceRegistry::new();
        let (first, _) = counting("A", "http://first.local");
        let (second, second_inits) = counting("A", "http://second.local");

        registry.register(first).unwrap();
        let err = registry.register(second).unwrap_err();

        assert_eq!(err, RegistryError::Duplicate { name: "A".into() });
        assert_eq!(second_inits.load(Ordering::SeqCst), 0);
        assert_eq!(
            registry.lookup("A").unwrap().endpoint().base_url(),
            "http://first.local"
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_init_failure_aborts_registration() {
        let registry = ServiceRegistry::new();
        let err = registry.register(Failing).unwrap_err();

        assert!(matches!(
            err,
            RegistryError::Init { ref name, source: ProfileError::Init(_) } if name == "failing"
        ));
        assert!(registry.lookup("failing").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_init_panic_aborts_registration() {
        let registry = ServiceRegistry::new();
        let err = registry.register(Panicking).unwrap_err();

        assert!(matches!(
            err,
            RegistryError::Init { source: ProfileError::Panicked { hook: "init", .. }, .. }
        ));
        assert!(!registry.contains("panicking"));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let registry = ServiceRegistry::new();
        let (profile, inits) = counting("", "http://a.local");
        assert_eq!(registry.register(profile).unwrap_err(), RegistryError::EmptyName);
        assert_eq!(inits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_lookup_missing() {
        let registry = ServiceRegistry::new();
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn test_names_and_shutdown() {
        let registry = ServiceRegistry::new();
        registry.register(counting("b", "http://b.local").0).unwrap();
        registry.register(counting("a", "http://a.local").0).unwrap();

        assert_eq!(registry.names(), vec!["a".to_owned(), "b".to_owned()]);
        let held = registry.lookup("a").unwrap();

        assert_eq!(registry.shutdown(), 2);
        assert!(registry.is_empty());
        assert!(registry.lookup("a").is_none());
        assert_eq!(held.name(), "a");
    }

    #[test]
    fn test_concurrent_lookups_during_registration() {
        let registry = Arc::new(ServiceRegistry::new());
        registry.register(counting("base", "http://base.local").0).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        assert!(registry.lookup("base").is_some());
                        std::thread::sleep(Duration::from_micros(10));
                    }
                })
            })
            .collect();

        for name in ["x1", "x2", "x3"] {
            registry.register(counting(name, "http://x.local").0).unwrap();
        }
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(registry.len(), 4);
    }
}
