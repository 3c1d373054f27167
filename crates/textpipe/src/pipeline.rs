//! Top-level composition: resolve stage names through a [`StageRegistry`],
//! construct one [`StageWorker`] per stage, link them in order, and drive
//! records through the head.

use crate::error::PipelineError;
use crate::record::Record;
use crate::registry::StageRegistry;
use crate::stage::StageWorker;
use std::sync::Arc;
use tracing::{debug, info};

/// Capacity is bounded to keep a misconfigured run from allocating an
/// unreasonable amount of queue storage; the lower bound rules out the
/// degenerate zero-capacity buffer a level down in [`crate::sync::HandoffBuffer`].
pub const MIN_CAPACITY: usize = 1;
pub const MAX_CAPACITY: usize = 1_000_000;

/// A linear chain of stage workers, each one's output wired to the next's
/// input, with the caller feeding the first stage directly.
pub struct Pipeline {
    stages: Vec<Arc<StageWorker>>,
}

impl Pipeline {
    /// Resolve every name in `stage_names` through `registry`, constructing a
    /// [`StageWorker`] for each and linking it to the previously constructed
    /// one. On any failure, already-constructed stages are torn down in
    /// reverse order before the error is returned, so a partially built
    /// pipeline never leaks live worker threads.
    pub fn construct(
        registry: &StageRegistry,
        stage_names: &[String],
        capacity: usize,
    ) -> Result<Self, PipelineError> {
        if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&capacity) {
            return Err(PipelineError::InvalidCapacity(capacity));
        }
        if stage_names.is_empty() {
            return Err(PipelineError::EmptyPipeline);
        }

        let mut stages: Vec<Arc<StageWorker>> = Vec::with_capacity(stage_names.len());
        for name in stage_names {
            let transform = match registry.create(name) {
                Some(t) => t,
                None => {
                    teardown_all(&stages);
                    return Err(PipelineError::UnknownStage(name.clone()));
                }
            };
            match StageWorker::init(transform, capacity) {
                Ok(worker) => {
                    let worker = Arc::new(worker);
                    if let Some(prev) = stages.last() {
                        let next = Arc::clone(&worker);
                        prev.attach(Arc::new(move |record: Record| next.submit(record)));
                    }
                    debug!(stage = name.as_str(), "stage constructed");
                    stages.push(worker);
                }
                Err(source) => {
                    teardown_all(&stages);
                    return Err(PipelineError::StageInit {
                        name: name.clone(),
                        source,
                    });
                }
            }
        }

        info!(stages = stage_names.len(), capacity, "pipeline constructed");
        Ok(Pipeline { stages })
    }

    /// Feed one record into the head (first) stage.
    pub fn submit(&self, record: Record) -> Result<(), PipelineError> {
        let head = self
            .stages
            .first()
            .expect("construct() guarantees a non-empty pipeline");
        head.submit(record).map_err(PipelineError::from)
    }

    /// Submit the sentinel to signal end-of-stream, then block until every
    /// stage, in order, has observed it and finished draining.
    pub fn drain(&self) -> Result<(), PipelineError> {
        self.submit(Record::sentinel())?;
        for stage in &self.stages {
            stage
                .wait_finished()
                .map_err(PipelineError::from)?;
        }
        Ok(())
    }

    /// Join every worker thread. Safe to call after [`Pipeline::drain`] or on
    /// an aborted pipeline; each [`StageWorker::fini`] is idempotent.
    pub fn teardown(&self) {
        teardown_all(&self.stages);
    }

    /// Number of stages in this pipeline.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Tear down already-constructed stages in reverse order: the last stage
/// finishes before the one feeding it, so a `fini` never races a submit from
/// an upstream stage that is still alive.
fn teardown_all(stages: &[Arc<StageWorker>]) {
    for stage in stages.iter().rev() {
        let _ = stage.fini();
    }
}
