//! Host runtime: the single cooperative event loop
//!
//! The host owns one dedicated OS thread running a single-threaded tokio
//! runtime. Jobs submitted from any thread are queued and run there one at a
//! time, in submission order. Values that must never leave the loop (such as
//! an embedded interpreter) live in [`LoopLocals`].

use crate::config::RuntimeConfig;
use crate::error::{panic_message, BridgeError, BridgeResult};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};
use tokio::sync::mpsc;

/// A unit of work for the event loop
pub type Job = Box<dyn FnOnce(&mut LoopLocals) + Send + 'static>;

static INSTANCE: OnceCell<Arc<HostRuntime>> = OnceCell::new();

/// Typed storage that only exists on the event-loop thread
///
/// One slot per type. Nothing stored here needs to be `Send`.
#[derive(Default)]
pub struct LoopLocals {
    slots: HashMap<TypeId, Box<dyn Any>>,
}

impl LoopLocals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.slots
            .get_mut(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_mut::<T>())
    }

    /// Store a value, returning the one it replaced
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.slots
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|previous| *previous)
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.slots
            .remove(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast::<T>().ok())
            .map(|slot| *slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The host application's runtime object
///
/// Holds the event loop and accepts work for it from any thread.
pub struct HostRuntime {
    sender: Option<mpsc::UnboundedSender<Job>>,
    loop_thread: ThreadId,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl HostRuntime {
    /// Start a new host runtime with its own event-loop thread
    pub fn new(config: &RuntimeConfig) -> BridgeResult<Arc<Self>> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), String>>();

        let join = std::thread::Builder::new()
            .name(config.loop_thread_name.clone())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread().build() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                let mut locals = LoopLocals::new();
                runtime.block_on(async move {
                    while let Some(job) = receiver.recv().await {
                        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| job(&mut locals))) {
                            tracing::error!(
                                panic = %panic_message(payload.as_ref()),
                                "Job panicked on the event loop"
                            );
                        }
                    }
                });
                tracing::debug!("Event loop stopped");
            })
            .map_err(|e| BridgeError::LoopStart(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(message)) => return Err(BridgeError::LoopStart(message)),
            Err(_) => {
                return Err(BridgeError::LoopStart(
                    "event loop thread exited during startup".to_string(),
                ))
            }
        }

        tracing::debug!(thread = %config.loop_thread_name, "Event loop started");

        Ok(Arc::new(Self {
            sender: Some(sender),
            loop_thread: join.thread().id(),
            join: Mutex::new(Some(join)),
        }))
    }

    /// The process-wide host runtime, created on first use
    pub fn get_instance() -> BridgeResult<Arc<Self>> {
        Self::init_global(&RuntimeConfig::default())
    }

    /// Create the process-wide host runtime with `config` unless it exists
    pub fn init_global(config: &RuntimeConfig) -> BridgeResult<Arc<Self>> {
        INSTANCE
            .get_or_try_init(|| Self::new(config))
            .map(Arc::clone)
    }

    /// Queue a job on the event loop without waiting for it
    pub fn schedule_threadsafe(&self, job: Job) -> BridgeResult<()> {
        let sender = self.sender.as_ref().ok_or(BridgeError::LoopClosed)?;
        sender.send(job).map_err(|_| BridgeError::LoopClosed)
    }

    /// Whether the calling thread is the event-loop thread
    pub fn is_loop_thread(&self) -> bool {
        std::thread::current().id() == self.loop_thread
    }

    pub fn is_closed(&self) -> bool {
        self.sender.as_ref().map_or(true, |sender| sender.is_closed())
    }
}

impl Drop for HostRuntime {
    fn drop(&mut self) {
        // Closing the queue lets the loop drain what is left and exit.
        self.sender.take();
        if self.is_loop_thread() {
            return;
        }
        if let Some(join) = self.join.lock().take() {
            let _ = join.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_loop_locals_slots() {
        let mut locals = LoopLocals::new();
        assert!(locals.is_empty());

        assert_eq!(locals.insert(41u32), None);
        assert!(locals.contains::<u32>());
        *locals.get_mut::<u32>().unwrap() += 1;
        assert_eq!(locals.get::<u32>(), Some(&42));

        assert_eq!(locals.insert(7u32), Some(42));
        assert!(!locals.contains::<String>());
        assert_eq!(locals.remove::<u32>(), Some(7));
        assert!(locals.is_empty());
    }

    #[test]
    fn test_jobs_run_in_submission_order_on_loop_thread() {
        let host = HostRuntime::new(&RuntimeConfig::default()).unwrap();
        let (tx, rx) = channel();

        for i in 0..10 {
            let tx = tx.clone();
            host.schedule_threadsafe(Box::new(move |_locals| {
                let name = std::thread::current().name().map(str::to_string);
                tx.send((i, name)).unwrap();
            }))
            .unwrap();
        }

        let seen: Vec<_> = (0..10).map(|_| rx.recv().unwrap()).collect();
        let order: Vec<_> = seen.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
        assert!(seen
            .iter()
            .all(|(_, name)| name.as_deref() == Some("livecall-eventloop")));
        assert!(!host.is_loop_thread());
    }

    #[test]
    fn test_loop_survives_panicking_job() {
        let host = HostRuntime::new(&RuntimeConfig::default()).unwrap();
        host.schedule_threadsafe(Box::new(|_| panic!("job failure")))
            .unwrap();

        let (tx, rx) = channel();
        host.schedule_threadsafe(Box::new(move |_| tx.send("still running").unwrap()))
            .unwrap();
        assert_eq!(rx.recv().unwrap(), "still running");
    }

    #[test]
    fn test_locals_persist_between_jobs() {
        let host = HostRuntime::new(&RuntimeConfig::default()).unwrap();
        host.schedule_threadsafe(Box::new(|locals| {
            locals.insert(String::from("stored on the loop"));
        }))
        .unwrap();

        let (tx, rx) = channel();
        host.schedule_threadsafe(Box::new(move |locals| {
            tx.send(locals.get::<String>().cloned()).unwrap();
        }))
        .unwrap();
        assert_eq!(rx.recv().unwrap().as_deref(), Some("stored on the loop"));
    }

    #[test]
    fn test_global_instance_is_shared() {
        let a = HostRuntime::get_instance().unwrap();
        let b = HostRuntime::get_instance().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!a.is_closed());
    }
}
