//! The worker lifecycle state machine.
//!
//! ```text
//! Parsed -> Installing -> Installed -> Activating -> Activated -> Redundant
//!               |             |                          ^
//!               +-------------+--------------------------+  (failed install, or replaced)
//! ```
//!
//! The hosting environment drives the transitions; the machine only refuses the ones that make no
//! sense.

pub use offline_cache_shared::WorkerState;

/// An attempt to move the lifecycle along an edge that does not exist.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("cannot move a worker from {from} to {to}")]
pub struct LifecycleError {
    pub from: WorkerState,
    pub to: WorkerState,
}

#[derive(Clone, Debug)]
pub struct Lifecycle {
    state: WorkerState,
    skip_waiting: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            state: WorkerState::Parsed,
            skip_waiting: false,
        }
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Whether the worker asked to be activated without waiting for the previous worker's clients.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }

    /// Ask to skip the waiting phase. Has no effect once the worker is activating or beyond.
    pub fn skip_waiting(&mut self) {
        self.skip_waiting = true;
    }

    pub fn begin_install(&mut self) -> Result<(), LifecycleError> {
        self.transition(WorkerState::Parsed, WorkerState::Installing)
    }

    pub fn finish_install(&mut self) -> Result<(), LifecycleError> {
        self.transition(WorkerState::Installing, WorkerState::Installed)
    }

    /// A failed install makes the worker redundant; it never reaches `Installed`.
    pub fn fail_install(&mut self) -> Result<(), LifecycleError> {
        self.transition(WorkerState::Installing, WorkerState::Redundant)
    }

    pub fn begin_activate(&mut self) -> Result<(), LifecycleError> {
        self.transition(WorkerState::Installed, WorkerState::Activating)
    }

    pub fn finish_activate(&mut self) -> Result<(), LifecycleError> {
        self.transition(WorkerState::Activating, WorkerState::Activated)
    }

    /// Retire the worker, for example because a newer version replaced it.
    pub fn make_redundant(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            WorkerState::Parsed | WorkerState::Redundant => Err(LifecycleError {
                from: self.state,
                to: WorkerState::Redundant,
            }),
            _ => {
                self.state = WorkerState::Redundant;
                Ok(())
            }
        }
    }

    fn transition(&mut self, from: WorkerState, to: WorkerState) -> Result<(), LifecycleError> {
        if self.state != from {
            return Err(LifecycleError {
                from: self.state,
                to,
            });
        }
        log::debug!("worker {} -> {}", from, to);
        self.state = to;
        Ok(())
    }
}
