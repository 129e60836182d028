use super::*;
use std::sync::OnceLock;
use tokio::runtime::{Handle, TryCurrentError};

static SCHEDULER_SUPPORT: OnceLock<bool> = OnceLock::new();

/// Reports whether [Scheduler] wrappers are recognized as event loops.
///
/// Resolved once per process from the `scheduler` cargo feature. When it is off,
/// a scheduler passed as `event_loop` is rejected like any other foreign value;
/// native loops with synchronous callbacks are unaffected.
pub fn scheduler_support() -> bool {
    *SCHEDULER_SUPPORT.get_or_init(|| cfg!(feature = "scheduler"))
}

/// A native event loop: the tokio runtime that drives all I/O and invokes
/// callbacks directly from its tasks.
#[derive(Debug, Clone)]
pub struct NativeLoop(Handle);

impl NativeLoop {
    /// Wraps a runtime handle.
    pub fn new(handle: Handle) -> Self {
        Self(handle)
    }

    /// The loop of the runtime this thread is currently running on.
    pub fn current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self)
    }

    /// The underlying runtime handle.
    pub fn handle(&self) -> &Handle {
        &self.0
    }
}

impl From<Handle> for NativeLoop {
    fn from(handle: Handle) -> Self {
        Self(handle)
    }
}

/// Something that accepts futures and runs them to completion later.
pub trait Spawn: Send + Sync + 'static {
    /// Enqueues `task` and returns without waiting on it.
    fn spawn(&self, task: BoxFuture);
}

impl Spawn for Handle {
    fn spawn(&self, task: BoxFuture) {
        // detached: the outcome of the task is never observed
        drop(Handle::spawn(self, task));
    }
}

/// A cooperative scheduler layered over exactly one [NativeLoop].
///
/// Asynchronous handlers need one of these: it is what drives their
/// suspension points once the native loop has handed the request over.
#[derive(Clone)]
pub struct Scheduler {
    native: NativeLoop,
    spawner: Arc<dyn Spawn>,
}

impl Scheduler {
    /// A scheduler that spawns its tasks on the native loop's own runtime.
    pub fn new(native: NativeLoop) -> Self {
        let spawner = Arc::new(native.handle().clone());
        Self { native, spawner }
    }

    /// A scheduler over `native` that hands its tasks to `spawner`.
    pub fn with_spawner(native: NativeLoop, spawner: impl Spawn) -> Self {
        Self {
            native,
            spawner: Arc::new(spawner),
        }
    }

    /// The native loop this scheduler wraps.
    pub fn native(&self) -> &NativeLoop {
        &self.native
    }

    /// Schedules `task` and returns immediately.
    pub fn spawn(&self, task: impl Future<Output = ()> + Send + 'static) {
        self.spawner.spawn(Box::pin(task));
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("native", &self.native)
            .finish_non_exhaustive()
    }
}

/// The `event_loop` argument of the construction gate.
#[derive(Debug, Clone)]
pub enum LoopArg {
    /// A bare native loop.
    Native(NativeLoop),
    /// A cooperative scheduler wrapping a native loop.
    Cooperative(Scheduler),
    /// Anything else the hosting runtime handed over.
    Foreign(HostValue),
}

impl LoopArg {
    /// Resolves to the native loop and, for a recognized scheduler wrapper,
    /// the scheduler itself.
    pub(crate) fn resolve(
        self,
        scheduler_support: bool,
    ) -> Result<(NativeLoop, Option<Scheduler>), ConfigError> {
        match self {
            LoopArg::Native(native) => Ok((native, None)),
            LoopArg::Cooperative(scheduler) if scheduler_support => {
                Ok((scheduler.native().clone(), Some(scheduler)))
            }
            LoopArg::Cooperative(scheduler) => Err(ConfigError::Loop(HostValue::of(&scheduler))),
            LoopArg::Foreign(value) => Err(ConfigError::Loop(value)),
        }
    }
}

impl From<NativeLoop> for LoopArg {
    fn from(native: NativeLoop) -> Self {
        LoopArg::Native(native)
    }
}

impl From<Handle> for LoopArg {
    fn from(handle: Handle) -> Self {
        LoopArg::Native(NativeLoop(handle))
    }
}

impl From<Scheduler> for LoopArg {
    fn from(scheduler: Scheduler) -> Self {
        LoopArg::Cooperative(scheduler)
    }
}

impl From<HostValue> for LoopArg {
    fn from(value: HostValue) -> Self {
        LoopArg::Foreign(value)
    }
}
