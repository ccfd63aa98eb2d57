use crate::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread::spawn;

/// Creates a capability. Runs on a worker thread and may block.
pub type Factory<T> = Arc<dyn Fn() -> Result<Arc<T>, Error> + Send + Sync>;

/// Makes external capabilities available on first use.
///
/// Every capability is registered under a name together with a factory.
/// A successfully loaded capability is cached and handed out from then on.
/// Failed loads are not cached so the next request tries again.
pub struct CapabilityLoader<T: ?Sized> {
    factories: HashMap<String, Factory<T>>,
    loaded: HashMap<String, Arc<T>>,
    loading: HashSet<String>,
}

impl<T: ?Sized + Send + Sync + 'static> CapabilityLoader<T> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            loaded: HashMap::new(),
            loading: HashSet::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, factory: Factory<T>) {
        self.factories.insert(name.into(), factory);
    }

    /// Returns the capability if it has been loaded already.
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.loaded.get(name).cloned()
    }

    pub fn is_loading(&self, name: &str) -> bool {
        self.loading.contains(name)
    }

    /// Starts loading `name` on a worker thread.
    ///
    /// `done` is called from the worker thread with the outcome and has to hand
    /// it back to whoever owns the loader, who then calls [`Self::finish`].
    /// Returns `false` if nothing was started because the capability is already
    /// loaded or currently loading.
    pub fn load<F>(&mut self, name: &str, done: F) -> bool
    where
        F: FnOnce(Result<Arc<T>, Error>) + Send + 'static,
    {
        if self.loaded.contains_key(name) || self.loading.contains(name) {
            return false;
        }

        let factory = match self.factories.get(name) {
            Some(factory) => factory.clone(),
            None => {
                log::error!("No capability named {} has been registered.", name);
                done(Err(Error::ProviderUnavailable(format!(
                    "unknown capability {}",
                    name
                ))));
                return true;
            }
        };

        self.loading.insert(name.to_string());
        log::debug!("Loading capability {}.", name);
        spawn(move || done((*factory)()));
        true
    }

    /// Records the outcome of a load started by [`Self::load`].
    pub fn finish(&mut self, name: &str, result: Result<Arc<T>, Error>) -> Result<Arc<T>, Error> {
        self.loading.remove(name);
        match result {
            Ok(capability) => {
                log::info!("Capability {} is available.", name);
                let capability = self
                    .loaded
                    .entry(name.to_string())
                    .or_insert(capability)
                    .clone();
                Ok(capability)
            }
            Err(e) => {
                log::error!("Unable to load capability {}. Reason:\r\n{}", name, e);
                Err(match e {
                    Error::ProviderUnavailable(_) => e,
                    other => Error::ProviderUnavailable(other.to_string()),
                })
            }
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> Default for CapabilityLoader<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Hello;

    impl Greeter for Hello {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    fn loader_with_counter(fail: bool) -> (CapabilityLoader<dyn Greeter>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let mut loader: CapabilityLoader<dyn Greeter> = CapabilityLoader::new();
        loader.register(
            "greeter",
            Arc::new(move || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err(Error::ProviderUnavailable("offline".into()))
                } else {
                    Ok(Arc::new(Hello) as Arc<dyn Greeter>)
                }
            }),
        );
        (loader, calls)
    }

    #[test]
    fn loads_once() {
        let (mut loader, calls) = loader_with_counter(false);
        let (tx, rx) = unbounded();

        let tx_clone = tx.clone();
        assert!(loader.load("greeter", move |r| tx_clone.send(r).unwrap()));
        // Already loading, so no second factory call.
        let tx_clone = tx.clone();
        assert!(!loader.load("greeter", move |r| tx_clone.send(r).unwrap()));
        assert!(loader.is_loading("greeter"));

        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let greeter = loader.finish("greeter", result).unwrap();
        assert_eq!(greeter.greet(), "hello");
        assert!(!loader.is_loading("greeter"));
        assert!(loader.get("greeter").is_some());

        assert!(!loader.load("greeter", move |r| tx.send(r).unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_loads_are_retried() {
        let (mut loader, calls) = loader_with_counter(true);
        let (tx, rx) = unbounded();

        let tx_clone = tx.clone();
        loader.load("greeter", move |r| tx_clone.send(r).unwrap());
        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(
            loader.finish("greeter", result).err(),
            Some(Error::ProviderUnavailable("offline".into()))
        );
        assert!(loader.get("greeter").is_none());

        assert!(loader.load("greeter", move |r| tx.send(r).unwrap()));
        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(loader.finish("greeter", result).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_capability() {
        let mut loader: CapabilityLoader<dyn Greeter> = CapabilityLoader::new();
        let (tx, rx) = unbounded();
        assert!(loader.load("nope", move |r| tx.send(r).unwrap()));
        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(
            loader.finish("nope", result),
            Err(Error::ProviderUnavailable(_))
        ));
    }
}
