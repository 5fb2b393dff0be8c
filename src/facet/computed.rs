use std::any::type_name;
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::Facet;

/// A facet whose value is produced on demand, every time it is read.
pub struct Computed<T> {
    compute: Arc<dyn Fn() -> T + Send + Sync>,
}

impl<T> Computed<T> {
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            compute: Arc::new(compute),
        }
    }

    pub fn compute(&self) -> T {
        (self.compute)()
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            compute: Arc::clone(&self.compute),
        }
    }
}

impl<T> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Computed<{}>", type_name::<T>())
    }
}

impl<T: 'static> Facet for Computed<T> {}

/// A computed facet that remembers its first result.
///
/// Relay tasks run concurrently, so several may call [`Lazy::value`] on the
/// same instance at once; the computation still runs exactly once.
pub struct Lazy<T> {
    compute: Arc<dyn Fn() -> T + Send + Sync>,
    value: OnceLock<T>,
}

impl<T> Lazy<T> {
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            compute: Arc::new(compute),
            value: OnceLock::new(),
        }
    }

    /// The memoized result.
    pub fn value(&self) -> &T {
        self.value.get_or_init(|| (self.compute)())
    }

    /// Run the computation again, bypassing the memoized result.
    pub fn compute(&self) -> T {
        (self.compute)()
    }

    pub fn is_evaluated(&self) -> bool {
        self.value.get().is_some()
    }
}

impl<T: fmt::Debug> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.get() {
            Some(value) => write!(f, "Lazy<{}>({:?})", type_name::<T>(), value),
            None => write!(f, "Lazy<{}>(<pending>)", type_name::<T>()),
        }
    }
}

impl<T: fmt::Debug + Send + Sync + 'static> Facet for Lazy<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_computed_reevaluates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let computed = Computed::new(move || counter.fetch_add(1, Ordering::SeqCst) + 1);

        assert_eq!(computed.compute(), 1);
        assert_eq!(computed.compute(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_lazy_memoizes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let lazy = Lazy::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            42
        });

        assert!(!lazy.is_evaluated());
        assert_eq!(*lazy.value(), 42);
        assert_eq!(*lazy.value(), 42);
        assert!(lazy.is_evaluated());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lazy_single_evaluation_across_threads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let lazy = Arc::new(Lazy::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(5));
            "done".to_string()
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lazy = Arc::clone(&lazy);
                std::thread::spawn(move || lazy.value().clone())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "done");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_shows_pending_then_value() {
        let lazy = Lazy::new(|| 3u8);
        assert!(format!("{:?}", lazy).contains("<pending>"));
        lazy.value();
        assert!(format!("{:?}", lazy).contains("(3)"));
    }
}
