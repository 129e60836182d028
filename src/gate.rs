use super::*;
use tracing::debug;

/// Default listen backlog.
pub const DEFAULT_BACKLOG: i32 = 128;

/// Optional arguments of the construction gate.
#[derive(Debug, Clone)]
pub struct Options {
    /// Event loop to run on. There is no default loop: leaving it unset is an error.
    pub event_loop: Option<LoopArg>,
    /// TLS context used to terminate connections; plain TCP when unset.
    pub tls: Option<TlsArg>,
    /// Listen backlog, [DEFAULT_BACKLOG] by default.
    pub backlog: i32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            event_loop: None,
            tls: None,
            backlog: DEFAULT_BACKLOG,
        }
    }
}

impl Options {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the event loop: a [NativeLoop], a [Scheduler] or a foreign value.
    pub fn event_loop(mut self, event_loop: impl Into<LoopArg>) -> Self {
        self.event_loop = Some(event_loop.into());
        self
    }

    /// Sets the TLS context.
    pub fn tls(mut self, tls: impl Into<TlsArg>) -> Self {
        self.tls = Some(tls.into());
        self
    }

    /// Sets the listen backlog.
    pub fn backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }
}

struct Validated<R> {
    native: NativeLoop,
    callback: Callback<R>,
    adapted: bool,
    tls: Option<TlsContext>,
    backlog: i32,
}

fn validate<R: Send + 'static>(
    callback: CallbackArg<R>,
    options: Options,
    scheduler_support: bool,
) -> Result<Validated<R>, ConfigError> {
    let (native, scheduler) = options
        .event_loop
        .ok_or_else(|| ConfigError::Loop(HostValue::none()))?
        .resolve(scheduler_support)?;

    let (callback, adapted) = match callback {
        CallbackArg::Sync(callback) => (callback, false),
        CallbackArg::Async(handler) => {
            let scheduler = scheduler.ok_or(ConfigError::MissingScheduler)?;
            (crate::callback::trampoline(handler, scheduler), true)
        }
        CallbackArg::Foreign(value) => return Err(ConfigError::NotCallable(value)),
    };

    let tls = options.tls.map(TlsArg::validate).transpose()?;

    Ok(Validated {
        native,
        callback,
        adapted,
        tls,
        backlog: options.backlog,
    })
}

/// Validates the arguments, transfers socket ownership and delegates to `engine`.
///
/// Checks run in this order and the first failure is returned:
///
/// 1. `event_loop` must be a [NativeLoop], or a [Scheduler] when
///    [scheduler_support] is enabled, in which case its native loop is used.
/// 2. `callback` must be callable.
/// 3. An asynchronous `callback` needs a [Scheduler]; it is then wrapped so that
///    each call spawns the handler on the scheduler and returns at once.
///    Synchronous callbacks reach the engine unchanged.
/// 4. `tls` must be a [TlsContext] if set.
///
/// Until all of these pass, no socket is touched and a failure hands them back
/// in [Error::Config]. After that, socket objects are switched to non-blocking
/// mode and detached, raw descriptors are passed as they are, and the
/// descriptors reach the engine in input order.
pub fn construct<E: Engine>(
    engine: &E,
    sockets: impl IntoIterator<Item = SocketArg>,
    callback: CallbackArg<E::Request>,
    options: Options,
) -> Result<E::Server, Error> {
    let sockets: Vec<SocketArg> = sockets.into_iter().collect();
    let checked = match validate(callback, options, scheduler_support()) {
        Ok(checked) => checked,
        Err(error) => return Err(Error::Config { error, sockets }),
    };

    let descriptors = crate::socket::normalize(sockets)?;
    let count = descriptors.len();
    let tls = checked.tls.is_some();
    let server = engine.construct(
        descriptors,
        checked.callback,
        &checked.native,
        checked.tls,
        checked.backlog,
    )?;
    debug!(
        sockets = count,
        tls,
        adapted = checked.adapted,
        backlog = checked.backlog,
        "server constructed"
    );
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync_callback() -> CallbackArg<()> {
        CallbackArg::from_fn(|_| {})
    }

    fn async_callback() -> CallbackArg<()> {
        CallbackArg::from_async_fn(|_, _| async {})
    }

    #[test]
    fn missing_loop_is_rejected() {
        let err = validate(sync_callback(), Options::new(), true).err().unwrap();
        assert!(matches!(err, ConfigError::Loop(value) if value == HostValue::none()));
    }

    #[tokio::test]
    async fn loop_is_checked_before_callback() {
        let options = Options::new().event_loop(HostValue::of(&7));
        let err = validate(CallbackArg::<()>::from(HostValue::of(&8)), options, true).err().unwrap();
        assert!(matches!(err, ConfigError::Loop(_)));
    }

    #[tokio::test]
    async fn callback_is_checked_before_tls() {
        let options = Options::new()
            .event_loop(NativeLoop::current().unwrap())
            .tls(HostValue::of("cert.pem"));
        let err = validate(CallbackArg::<()>::from(HostValue::of(&8)), options, true).err().unwrap();
        assert!(matches!(err, ConfigError::NotCallable(_)));
    }

    #[tokio::test]
    async fn async_callback_needs_recognized_scheduler() {
        let native = NativeLoop::current().unwrap();
        let options = Options::new().event_loop(native.clone());
        let err = validate(async_callback(), options, true).err().unwrap();
        assert!(matches!(err, ConfigError::MissingScheduler));

        let options = Options::new().event_loop(Scheduler::new(native));
        let err = validate(async_callback(), options, false).err().unwrap();
        assert!(matches!(err, ConfigError::Loop(_)));
    }

    #[tokio::test]
    async fn sync_path_does_not_need_scheduler_support() {
        let options = Options::new().event_loop(NativeLoop::current().unwrap());
        let checked = validate(sync_callback(), options, false).ok().unwrap();
        assert!(!checked.adapted);
        assert!(checked.tls.is_none());
        assert_eq!(checked.backlog, DEFAULT_BACKLOG);
    }

    #[tokio::test]
    async fn async_callback_is_adapted() {
        let scheduler = Scheduler::new(NativeLoop::current().unwrap());
        let options = Options::new().event_loop(scheduler).backlog(16);
        let checked = validate(async_callback(), options, true).ok().unwrap();
        assert!(checked.adapted);
        assert_eq!(checked.backlog, 16);
    }
}
