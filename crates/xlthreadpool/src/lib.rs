//! Parallelism boundary used by the frame decoder and encoder: an optional Rayon-backed pool
//! behind a facade that degrades to synchronous execution when the `rayon` feature is off or
//! the pool failed to initialize.

#[derive(Debug, Clone)]
pub struct WorkerPool(WorkerPoolImpl);

#[derive(Debug, Clone)]
enum WorkerPoolImpl {
    #[cfg(feature = "rayon")]
    Rayon(std::sync::Arc<rayon_core::ThreadPool>),
    None,
}

#[derive(Debug, Copy, Clone)]
pub struct WorkerScope<'r, 'scope>(WorkerScopeInner<'r, 'scope>);

#[derive(Debug, Copy, Clone)]
enum WorkerScopeInner<'r, 'scope> {
    #[cfg(feature = "rayon")]
    Rayon(&'r rayon_core::Scope<'scope>),
    None(std::marker::PhantomData<&'r &'scope ()>),
}

#[cfg(feature = "rayon")]
impl Default for WorkerPool {
    fn default() -> Self {
        let num_threads = std::thread::available_parallelism();
        let num_threads = match num_threads {
            Ok(num_threads) => num_threads.into(),
            Err(e) => {
                tracing::warn!(%e, "failed to query available parallelism; falling back to single-threaded");
                return Self::none();
            },
        };

        let inner = rayon_core::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map(|pool| WorkerPoolImpl::Rayon(std::sync::Arc::new(pool)));

        match inner {
            Ok(inner) => {
                tracing::debug!(num_threads, "initialized worker pool");
                Self(inner)
            },
            Err(e) => {
                tracing::warn!(%e, "failed to initialize worker pool; falling back to single-threaded");
                Self::none()
            },
        }
    }
}

#[cfg(not(feature = "rayon"))]
impl Default for WorkerPool {
    fn default() -> Self {
        tracing::debug!("built without multithread support");
        Self::none()
    }
}

impl WorkerPool {
    pub const fn none() -> Self {
        Self(WorkerPoolImpl::None)
    }

    #[cfg(feature = "rayon")]
    pub fn rayon(pool: std::sync::Arc<rayon_core::ThreadPool>) -> Self {
        Self(WorkerPoolImpl::Rayon(pool))
    }

    /// Builds a pool sized to exactly `num_threads` workers, falling back to [`Self::default`]'s
    /// automatic sizing when `num_threads == 0` and to single-threaded execution if the pool
    /// fails to initialize at the requested size.
    pub fn sized(num_threads: usize) -> Self {
        if num_threads == 0 {
            return Self::default();
        }
        #[cfg(feature = "rayon")]
        {
            match rayon_core::ThreadPoolBuilder::new().num_threads(num_threads).build() {
                Ok(pool) => return Self::rayon(std::sync::Arc::new(pool)),
                Err(e) => tracing::warn!(%e, num_threads, "failed to size worker pool; falling back"),
            }
        }
        Self::none()
    }

    pub fn is_multithreaded(&self) -> bool {
        match self.0 {
            #[cfg(feature = "rayon")]
            WorkerPoolImpl::Rayon(_) => true,
            WorkerPoolImpl::None => false,
        }
    }
}

impl WorkerPool {
    pub fn spawn(&self, op: impl FnOnce() + Send + 'static) {
        match &self.0 {
            #[cfg(feature = "rayon")]
            WorkerPoolImpl::Rayon(pool) => pool.spawn(op),
            WorkerPoolImpl::None => op(),
        }
    }

    /// Runs `op(index)` for every `index` in `0..len` across the pool and collects the results in
    /// order. Each frame in a multi-frame container is built by one such call, independent of the
    /// others, so this is the one concurrency shape the codec actually needs: a fixed-size
    /// fan-out with no communication between tasks and a single join point at the end.
    pub fn parallel_map<T: Send>(&self, len: usize, op: impl Fn(usize) -> T + Sync) -> Vec<T> {
        let slots: Vec<_> = (0..len).map(|_| std::sync::Mutex::new(None)).collect();
        let slots_ref = &slots;
        self.scope(|scope| {
            let op = &op;
            for index in 0..len {
                scope.spawn(move |_| {
                    *slots_ref[index].lock().unwrap() = Some(op(index));
                });
            }
        });
        slots.into_iter().map(|slot| slot.into_inner().unwrap().unwrap()).collect()
    }

    pub fn scope<'scope, R: Send>(
        &self,
        op: impl for<'r> FnOnce(WorkerScope<'r, 'scope>) -> R + Send,
    ) -> R {
        match &self.0 {
            #[cfg(feature = "rayon")]
            WorkerPoolImpl::Rayon(pool) => {
                pool.scope(|scope| {
                    let scope = WorkerScope(WorkerScopeInner::Rayon(scope));
                    op(scope)
                })
            },
            WorkerPoolImpl::None => {
                op(WorkerScope(WorkerScopeInner::None(Default::default())))
            },
        }
    }

    pub fn yield_now(&self) -> Option<YieldResult> {
        match &self.0 {
            #[cfg(feature = "rayon")]
            WorkerPoolImpl::Rayon(_) => rayon_core::yield_now().map(From::from),
            WorkerPoolImpl::None => None,
        }
    }
}

impl<'scope> WorkerScope<'_, 'scope> {
    pub fn spawn(&self, op: impl for<'r> FnOnce(WorkerScope<'r, 'scope>) + Send + 'scope) {
        match self.0 {
            #[cfg(feature = "rayon")]
            WorkerScopeInner::Rayon(scope) => {
                scope.spawn(|scope| {
                    let scope = WorkerScope(WorkerScopeInner::Rayon(scope));
                    op(scope)
                })
            },
            WorkerScopeInner::None(_) => {
                op(WorkerScope(WorkerScopeInner::None(Default::default())))
            },
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum YieldResult {
    Executed,
    Idle,
}

#[cfg(feature = "rayon")]
impl From<rayon_core::Yield> for YieldResult {
    fn from(value: rayon_core::Yield) -> Self {
        match value {
            rayon_core::Yield::Executed => Self::Executed,
            rayon_core::Yield::Idle => Self::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_requested_threads_falls_back_to_automatic_sizing() {
        let pool = WorkerPool::sized(0);
        let _ = pool.is_multithreaded();
    }

    #[test]
    fn parallel_map_preserves_index_order() {
        let pool = WorkerPool::none();
        let results = pool.parallel_map(8, |i| i * i);
        assert_eq!(results, (0..8).map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn parallel_map_runs_every_index_exactly_once() {
        let pool = WorkerPool::sized(4);
        let counter = std::sync::atomic::AtomicUsize::new(0);
        let results = pool.parallel_map(100, |i| {
            counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            i
        });
        assert_eq!(counter.load(std::sync::atomic::Ordering::Relaxed), 100);
        assert_eq!(results, (0..100).collect::<Vec<_>>());
    }
}
