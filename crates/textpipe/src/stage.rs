//! The per-stage execution context: a dedicated worker thread, its input
//! [`HandoffBuffer`], an optional downstream submission callback, and the
//! startup/teardown handshakes that let a [`crate::pipeline::Pipeline`]
//! compose many of these safely.

use crate::error::{BufferError, StageError};
use crate::record::Record;
use crate::sync::{Event, HandoffBuffer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::warn;

/// The pluggable per-record transformation a stage performs.
///
/// `transform` returning `None` means the routine had nothing to emit for
/// this input (logged and the record dropped, per the worker's failure
/// semantics); it never represents an error the pipeline should abort on.
pub trait Transform: Send {
    /// Human-readable identifier, used in diagnostics and as the registry key.
    fn name(&self) -> &str;

    /// Produce zero or one output records for one input record.
    fn transform(&mut self, input: &Record) -> Option<Record>;
}

/// The callback a stage invokes to hand a record to the next stage. Boxed as
/// a trait object because each stage is wired to a concrete downstream
/// `StageWorker::submit` only at link time.
pub type DownstreamSubmit = Arc<dyn Fn(Record) -> Result<(), StageError> + Send + Sync>;

/// The lifecycle states a worker thread passes through, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    Constructed,
    Ready,
    Consuming,
    Draining,
    Finished,
}

/// A single pipeline stage: owns one worker thread, one input buffer, and
/// (if not the terminal stage) a callback into the next stage.
pub struct StageWorker {
    name: String,
    input: Arc<HandoffBuffer<Record>>,
    downstream: Arc<Mutex<Option<DownstreamSubmit>>>,
    state: Arc<Mutex<WorkerState>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    initialized: AtomicBool,
}

impl StageWorker {
    /// Construct the buffer, spawn the worker thread, and block until the
    /// worker has signaled `ready` — the startup handshake that rules out a
    /// whole class of races where the orchestrator calls `attach` or
    /// `submit` before the thread exists.
    pub fn init(transform: Box<dyn Transform>, capacity: usize) -> Result<Self, StageError> {
        let name = transform.name().to_string();
        let input = Arc::new(HandoffBuffer::new(capacity)?);
        let downstream: Arc<Mutex<Option<DownstreamSubmit>>> = Arc::new(Mutex::new(None));
        let state = Arc::new(Mutex::new(WorkerState::Constructed));
        let ready = Arc::new(Event::new());

        let thread_input = Arc::clone(&input);
        let thread_downstream = Arc::clone(&downstream);
        let thread_state = Arc::clone(&state);
        let thread_ready = Arc::clone(&ready);
        let thread_name = name.clone();

        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || run_loop(transform, thread_input, thread_downstream, thread_state, thread_ready))
            .map_err(|e| StageError::Spawn(format!("stage '{thread_name}': {e}")))?;

        ready
            .wait()
            .map_err(|e| StageError::Buffer(BufferError::Event(e)))?;

        Ok(StageWorker {
            name,
            input,
            downstream,
            state,
            handle: Mutex::new(Some(handle)),
            initialized: AtomicBool::new(true),
        })
    }

    /// Install the callback invoked for every outbound record. Must be
    /// called before this stage sees its first record (the pipeline's
    /// construction order — link before feed — guarantees this); a stage
    /// that emits before being attached silently drops its output, per the
    /// orchestrator contract this type leaves to its caller.
    pub fn attach(&self, downstream_submit: DownstreamSubmit) {
        *self.downstream.lock().unwrap() = Some(downstream_submit);
    }

    /// Enqueue a record for processing, blocking if the input buffer is full.
    pub fn submit(&self, record: Record) -> Result<(), StageError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(StageError::NotInitialized);
        }
        self.input.put(record).map_err(StageError::from)
    }

    /// Block until the worker has observed and propagated the sentinel and
    /// marked its input buffer finished.
    pub fn wait_finished(&self) -> Result<(), StageError> {
        self.input
            .wait_finished()
            .map_err(|e| StageError::Buffer(BufferError::Event(e)))
    }

    /// Tear down: force any blocked getter to wake, join the worker thread.
    /// Idempotent — a second call on an already-finalized (or never
    /// initialized) stage is a no-op.
    pub fn fini(&self) -> Result<(), StageError> {
        if !self.initialized.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.input.signal_finished();
        if let Some(handle) = self.handle.lock().unwrap().take() {
            if handle.join().is_err() {
                warn!(stage = %self.name, "worker thread panicked during teardown");
            }
        }
        Ok(())
    }

    /// Stable, borrowed name for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state, for tests and diagnostics.
    pub fn state(&self) -> WorkerState {
        *self.state.lock().unwrap()
    }
}

impl Drop for StageWorker {
    fn drop(&mut self) {
        let _ = self.fini();
    }
}

/// The worker thread body: signal `ready`, then consume records until the
/// sentinel or a forced shutdown, implementing the per-record algorithm and
/// failure semantics described by this crate's runtime contract.
fn run_loop(
    mut transform: Box<dyn Transform>,
    input: Arc<HandoffBuffer<Record>>,
    downstream: Arc<Mutex<Option<DownstreamSubmit>>>,
    state: Arc<Mutex<WorkerState>>,
    ready: Arc<Event>,
) {
    *state.lock().unwrap() = WorkerState::Ready;
    ready.signal();

    loop {
        let record = match input.get() {
            Some(r) => r,
            None => {
                *state.lock().unwrap() = WorkerState::Finished;
                return;
            }
        };
        *state.lock().unwrap() = WorkerState::Consuming;

        if record.is_sentinel() {
            *state.lock().unwrap() = WorkerState::Draining;
            // Give the transform a chance to observe the sentinel (the
            // logger stage prints/logs it) but always forward the literal
            // sentinel downstream regardless of what transform() returns —
            // <END> must reach the next stage unchanged.
            let _ = transform.transform(&record);
            if let Some(cb) = downstream.lock().unwrap().as_ref() {
                if let Err(e) = (cb.as_ref())(record) {
                    warn!(stage = %transform.name(), error = %e, "failed to propagate sentinel downstream");
                }
            }
            input.signal_finished();
            *state.lock().unwrap() = WorkerState::Finished;
            return;
        }

        match transform.transform(&record) {
            Some(produced) => {
                if let Some(cb) = downstream.lock().unwrap().as_ref() {
                    if let Err(e) = (cb.as_ref())(produced) {
                        warn!(
                            stage = %transform.name(),
                            error = %e,
                            "downstream submit failed; record lost but pipeline stays alive"
                        );
                    }
                }
            }
            None => {
                warn!(
                    stage = %transform.name(),
                    len = record.len(),
                    "transform produced nothing; dropping record"
                );
            }
        }
    }
}
