//! Runtime bridge
//!
//! Owns the single foreign-runtime instance of a host process and runs work
//! against it on the host's event loop. Callers on any thread block until
//! their work has finished and get back exactly the `Ok` or `Err` their
//! callback produced.

use crate::config::RuntimeConfig;
use crate::error::{panic_message, BridgeError, BridgeResult};
use crate::host::{HostRuntime, LoopLocals};
use crate::session::{self, SessionContext};
use crate::signals;
use livecall_types::{MimePayload, MimeType};
use once_cell::sync::OnceCell;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{sync_channel, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::time::Duration;

/// Binding surface of an embedded foreign runtime
///
/// Implementations are created and used only on the event-loop thread, so
/// they need not be `Send`. Values and errors cross back to callers.
pub trait ForeignRuntime: 'static {
    type Value: Send + 'static;
    type Error: std::error::Error + Send + From<BridgeError> + 'static;

    /// Name used in logs and errors
    const NAME: &'static str;

    /// Display helper loaded once at initialization unless configured otherwise
    const HELPER_SCRIPT: &'static str;

    /// Evaluate source in the runtime's global namespace
    fn evaluate(&mut self, source: &str) -> Result<Self::Value, Self::Error>;

    /// Load the display helper script
    fn load_helper(&mut self, script: &str) -> Result<(), Self::Error>;

    /// Helper entry point: best representation of a value
    fn best_mime(&mut self, value: &Self::Value) -> Result<MimePayload, Self::Error>;

    /// Helper entry point: render a value as a specific MIME type
    fn render_mime(
        &mut self,
        mime: &MimeType,
        value: &Self::Value,
    ) -> Result<MimePayload, Self::Error>;
}

type Factory<R> =
    dyn Fn(&RuntimeConfig) -> Result<R, <R as ForeignRuntime>::Error> + Send + Sync + 'static;

struct HandleInner {
    host: Arc<HostRuntime>,
    call_timeout: Option<Duration>,
    parallelism: String,
}

/// Handle to the initialized foreign runtime
///
/// Cheap to clone and usable from any thread. All clones refer to the same
/// instance.
pub struct RuntimeHandle<R: ForeignRuntime> {
    inner: Arc<HandleInner>,
    _runtime: PhantomData<fn() -> R>,
}

impl<R: ForeignRuntime> Clone for RuntimeHandle<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _runtime: PhantomData,
        }
    }
}

impl<R: ForeignRuntime> std::fmt::Debug for RuntimeHandle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("runtime", &R::NAME)
            .field("parallelism", &self.inner.parallelism)
            .finish()
    }
}

impl<R: ForeignRuntime> RuntimeHandle<R> {
    /// Run `callback` on the event loop and block until it finishes
    pub fn run_blocking<T, F>(&self, callback: F) -> Result<T, R::Error>
    where
        T: Send + 'static,
        F: FnOnce(&mut R) -> Result<T, R::Error> + Send + 'static,
    {
        run_on_loop(
            &self.inner.host,
            self.inner.call_timeout,
            move |locals: &mut LoopLocals| -> Result<T, R::Error> {
                let runtime = locals
                    .get_mut::<R>()
                    .ok_or(BridgeError::RuntimeMissing(R::NAME))?;
                callback(runtime)
            },
        )
    }

    /// Whether two handles refer to the same runtime instance
    pub fn same_instance(&self, other: &RuntimeHandle<R>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Parallelism hint in effect when the runtime was created
    pub fn parallelism(&self) -> &str {
        &self.inner.parallelism
    }

    pub fn runtime_name(&self) -> &'static str {
        R::NAME
    }
}

struct BridgeInner<R: ForeignRuntime> {
    host: Arc<HostRuntime>,
    config: RuntimeConfig,
    factory: Arc<Factory<R>>,
    handle: OnceCell<RuntimeHandle<R>>,
}

/// Lazily initialized, process-wide access to one foreign runtime
///
/// Construct it once and share it (it is cheap to clone). The runtime is
/// created on first use, at most once, however many threads race for it.
pub struct Bridge<R: ForeignRuntime> {
    inner: Arc<BridgeInner<R>>,
}

impl<R: ForeignRuntime> Clone for Bridge<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: ForeignRuntime> Bridge<R> {
    pub fn new<F>(host: Arc<HostRuntime>, config: RuntimeConfig, factory: F) -> Self
    where
        F: Fn(&RuntimeConfig) -> Result<R, R::Error> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(BridgeInner {
                host,
                config,
                factory: Arc::new(factory),
                handle: OnceCell::new(),
            }),
        }
    }

    /// Bridge on the process-wide host runtime
    pub fn on_global_host<F>(config: RuntimeConfig, factory: F) -> BridgeResult<Self>
    where
        F: Fn(&RuntimeConfig) -> Result<R, R::Error> + Send + Sync + 'static,
    {
        let host = HostRuntime::init_global(&config)?;
        Ok(Self::new(host, config, factory))
    }

    pub fn host(&self) -> &Arc<HostRuntime> {
        &self.inner.host
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.handle.get().is_some()
    }

    /// Return the runtime handle, creating the runtime if needed.
    ///
    /// On the event loop itself this never initializes: it returns the
    /// existing handle, or `ReentrantCall` if the runtime does not exist yet.
    pub fn ensure_runtime(&self) -> Result<RuntimeHandle<R>, R::Error> {
        // Initialization waits on the loop, so the loop must not wait on it.
        if self.inner.host.is_loop_thread() {
            return self
                .inner
                .handle
                .get()
                .cloned()
                .ok_or_else(|| BridgeError::ReentrantCall.into());
        }

        self.inner
            .handle
            .get_or_try_init(|| self.initialize())
            .cloned()
    }

    /// Ensure the runtime, then run `callback` on it
    pub fn run_blocking<T, F>(&self, callback: F) -> Result<T, R::Error>
    where
        T: Send + 'static,
        F: FnOnce(&mut R) -> Result<T, R::Error> + Send + 'static,
    {
        self.ensure_runtime()?.run_blocking(callback)
    }

    /// Wrap an operation on the runtime into a plain synchronous function
    ///
    /// The wrapper ensures the runtime exists, runs `target` on the event
    /// loop and hands back its value or its original error.
    pub fn call<A, T, F>(&self, target: F) -> impl Fn(A) -> Result<T, R::Error> + Send + Sync
    where
        A: Send + 'static,
        T: Send + 'static,
        F: Fn(&mut R, A) -> Result<T, R::Error> + Send + Sync + 'static,
    {
        let bridge = self.clone();
        let target = Arc::new(target);
        move |args: A| {
            let handle = bridge.ensure_runtime()?;
            let target = Arc::clone(&target);
            let result = handle.run_blocking(move |runtime| target(runtime, args));
            tracing::debug!(runtime = R::NAME, ok = result.is_ok(), "Call finished");
            result
        }
    }

    fn initialize(&self) -> Result<RuntimeHandle<R>, R::Error> {
        let config = &self.inner.config;
        let span = tracing::debug_span!(
            "init_runtime",
            runtime = R::NAME,
            session = ?SessionContext::current().map(|session| session.id())
        );
        let _entered = span.enter();

        let parallelism = config.apply_parallelism_default();
        let helper = self.helper_source()?;
        let factory = Arc::clone(&self.inner.factory);
        let runtime_config = config.clone();
        let loop_span = span.clone();

        let init = move |locals: &mut LoopLocals| -> Result<(), R::Error> {
            let _entered = loop_span.enter();
            if locals.contains::<R>() {
                tracing::debug!("Runtime already present on the event loop, reusing it");
                return Ok(());
            }

            tracing::debug!("Start to instantiate the runtime");
            let mut runtime = (*factory)(&runtime_config)?;
            tracing::debug!("The runtime has been created");

            runtime.load_helper(&helper)?;
            tracing::debug!("Helper script is loaded");

            if runtime_config.rearm_interrupt {
                if let Err(e) = signals::rearm_interrupt() {
                    tracing::warn!(error = %e, "Failed to re-arm interrupt handling");
                }
            }

            locals.insert(runtime);
            Ok(())
        };

        let outcome = run_on_loop(&self.inner.host, None, init);

        if let Err(e) = outcome {
            tracing::error!(error = %e, "Runtime initialization failed");
            return Err(e);
        }

        tracing::debug!(parallelism = %parallelism, "Runtime is ready");

        Ok(RuntimeHandle {
            inner: Arc::new(HandleInner {
                host: Arc::clone(&self.inner.host),
                call_timeout: config.call_timeout(),
                parallelism,
            }),
            _runtime: PhantomData,
        })
    }

    fn helper_source(&self) -> Result<String, BridgeError> {
        match &self.inner.config.helper_script {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Start to load helper script");
                std::fs::read_to_string(path).map_err(|e| BridgeError::HelperUnreadable {
                    path: path.clone(),
                    message: e.to_string(),
                })
            }
            None => Ok(R::HELPER_SCRIPT.to_string()),
        }
    }
}

/// Work handed to the loop together with its completion signal
struct PendingCall<F, T, E> {
    work: F,
    completion: SyncSender<Result<T, E>>,
    session: Option<SessionContext>,
}

impl<F, T, E> PendingCall<F, T, E>
where
    F: FnOnce(&mut LoopLocals) -> Result<T, E>,
    E: From<BridgeError>,
{
    fn run(self, locals: &mut LoopLocals) {
        let PendingCall {
            work,
            completion,
            session,
        } = self;
        let _session = session::attach_optional(session.as_ref());

        let outcome = match catch_unwind(AssertUnwindSafe(|| work(locals))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(panic = %message, "Callback panicked on the event loop");
                Err(BridgeError::CallbackPanicked(message).into())
            }
        };

        // The caller may have stopped waiting after a timeout.
        let _ = completion.send(outcome);
    }
}

fn run_on_loop<T, E, F>(host: &HostRuntime, timeout: Option<Duration>, work: F) -> Result<T, E>
where
    T: Send + 'static,
    E: From<BridgeError> + Send + 'static,
    F: FnOnce(&mut LoopLocals) -> Result<T, E> + Send + 'static,
{
    if host.is_loop_thread() {
        return Err(BridgeError::ReentrantCall.into());
    }

    let (completion, done) = sync_channel(1);
    let call = PendingCall {
        work,
        completion,
        session: SessionContext::current(),
    };
    host.schedule_threadsafe(Box::new(move |locals| call.run(locals)))?;

    match timeout {
        None => done.recv().map_err(|_| BridgeError::LoopClosed)?,
        Some(limit) => match done.recv_timeout(limit) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(BridgeError::Timeout(limit).into()),
            Err(RecvTimeoutError::Disconnected) => Err(BridgeError::LoopClosed.into()),
        },
    }
}
