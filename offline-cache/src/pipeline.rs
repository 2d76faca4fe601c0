//! Ordered stages per event type.
//!
//! Every event type gets one [`Pipeline`]: a list of [`Stage`]s that run in the order they were
//! added, each seeing the effects of the ones before it. A stage that fails is logged and
//! reported in the [`StageFailure`]s returned by [`Pipeline::dispatch()`], and the remaining stages
//! still run.

use crate::error::Error;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// One step in the handling of an event.
#[async_trait]
pub trait Stage<E>: Send + Sync {
    /// A short name for logs and failure reports.
    fn name(&self) -> &str;

    async fn run(&self, event: &mut E) -> Result<(), Error>;
}

/// A stage that failed while handling an event.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: String,
    pub error: Error,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} failed: {:#}", self.stage, self.error)
    }
}

/// The stages for one event type, in execution order.
pub struct Pipeline<E> {
    stages: Vec<Arc<dyn Stage<E>>>,
}

impl<E> Default for Pipeline<E> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<E> Clone for Pipeline<E> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
        }
    }
}

impl<E> fmt::Debug for Pipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|stage| stage.name()))
            .finish()
    }
}

impl<E: Send> Pipeline<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style equivalent of [`push()`][Self::push()].
    pub fn with_stage(mut self, stage: impl Stage<E> + 'static) -> Self {
        self.push(stage);
        self
    }

    /// Append a stage; it runs after every stage already present.
    pub fn push(&mut self, stage: impl Stage<E> + 'static) {
        self.stages.push(Arc::new(stage));
    }

    /// Append every stage of `other`, keeping their order.
    pub fn extend(&mut self, other: Pipeline<E>) {
        self.stages.extend(other.stages);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The stage names, in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run every stage against the event, in order.
    pub async fn dispatch(&self, event: &mut E) -> Vec<StageFailure> {
        let mut failures = Vec::new();
        for stage in &self.stages {
            if let Err(error) = stage.run(event).await {
                let failure = StageFailure {
                    stage: stage.name().to_owned(),
                    error,
                };
                log::error!("{}", failure);
                failures.push(failure);
            }
        }
        failures
    }
}
