use super::*;

/// A handler invoked directly, and synchronously, by the engine.
pub type Callback<R> = Arc<dyn Fn(R) + Send + Sync>;

/// An asynchronous handler: given the request and the scheduler driving it,
/// it produces the future that handles the request.
pub type AsyncHandler<R> = Arc<dyn Fn(R, Scheduler) -> BoxFuture + Send + Sync>;

/// The `callback` argument of the construction gate.
pub enum CallbackArg<R> {
    /// Runs on the native loop's callback path.
    Sync(Callback<R>),
    /// Runs as a task on a cooperative [Scheduler].
    Async(AsyncHandler<R>),
    /// A value from the hosting runtime that cannot be invoked.
    Foreign(HostValue),
}

impl<R: Send + 'static> CallbackArg<R> {
    /// A synchronous handler.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(R) + Send + Sync + 'static,
    {
        CallbackArg::Sync(Arc::new(f))
    }

    /// An asynchronous handler.
    ///
    /// Requires the server to be constructed with a [Scheduler] as its event loop.
    pub fn from_async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(R, Scheduler) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        CallbackArg::Async(Arc::new(move |req: R, scheduler: Scheduler| -> BoxFuture {
            Box::pin(f(req, scheduler))
        }))
    }

    /// Whether the handler needs a scheduler.
    pub fn is_async(&self) -> bool {
        matches!(self, CallbackArg::Async(_))
    }
}

impl<R> From<Callback<R>> for CallbackArg<R> {
    fn from(callback: Callback<R>) -> Self {
        CallbackArg::Sync(callback)
    }
}

impl<R> From<HostValue> for CallbackArg<R> {
    fn from(value: HostValue) -> Self {
        CallbackArg::Foreign(value)
    }
}

impl<R> fmt::Debug for CallbackArg<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackArg::Sync(_) => f.write_str("CallbackArg::Sync(..)"),
            CallbackArg::Async(_) => f.write_str("CallbackArg::Async(..)"),
            CallbackArg::Foreign(value) => f.debug_tuple("CallbackArg::Foreign").field(value).finish(),
        }
    }
}

/// Bridges the engine's synchronous calling convention to `scheduler`.
///
/// The returned callback creates the handler's future and spawns it; it never
/// waits on it, so the engine never learns how the handler ends.
pub(crate) fn trampoline<R: Send + 'static>(
    handler: AsyncHandler<R>,
    scheduler: Scheduler,
) -> Callback<R> {
    Arc::new(move |req: R| {
        tracing::trace!("scheduling asynchronous handler");
        scheduler.spawn(handler(req, scheduler.clone()));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct Counter(Arc<AtomicUsize>);

    impl Spawn for Counter {
        fn spawn(&self, _task: BoxFuture) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn trampoline_spawns_once_per_call() {
        let counter = Counter::default();
        let scheduler = Scheduler::with_spawner(NativeLoop::current().unwrap(), counter.clone());
        let CallbackArg::Async(handler) = CallbackArg::from_async_fn(|_: u8, _| async {}) else {
            unreachable!()
        };
        let callback = trampoline(handler, scheduler);
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
        callback(1);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        callback(2);
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn is_async() {
        assert!(!CallbackArg::from_fn(|_: u8| {}).is_async());
        assert!(!CallbackArg::<u8>::from(HostValue::of("x")).is_async());
    }
}
