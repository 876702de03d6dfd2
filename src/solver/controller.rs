//! Lifecycle of the background solver worker.
//!
//! ```text
//! Stopped -> Starting -> Running -> Stopping -> Stopped
//! ```
//!
//! The controller owns the solver while stopped and moves it into the worker
//! on [`start`](SolverThreadController::start). Constraints flow to the worker
//! over a channel and are picked up between iterations. The worker publishes
//! each new layout by swapping an `Arc` behind a briefly held mutex, so a
//! reader always sees either the whole old layout or the whole new one.
//! [`stop`](SolverThreadController::stop) joins the worker and takes the
//! solver back; once it returns no further layouts are published.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};

use super::{Solver, SolverConstraints, SolverOptions, UvLayout};
use crate::error::{EditorError, Result, SolverFailure};

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// No worker is running.
    Stopped,
    /// A worker was spawned and has not yet acknowledged readiness.
    Starting,
    /// The worker is iterating.
    Running,
    /// The worker was asked to stop and is being joined.
    Stopping,
}

/// State shared with the worker.
#[derive(Debug, Default)]
struct Shared {
    layout: Mutex<Arc<UvLayout>>,
    iterations: AtomicU64,
    /// Bits of the last reported energy.
    energy: AtomicU64,
    converged: AtomicBool,
}

impl Shared {
    fn publish(&self, layout: UvLayout) {
        let fresh = Arc::new(layout);
        let mut guard = self.layout.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = fresh;
    }

    fn latest(&self) -> Arc<UvLayout> {
        self.layout
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

enum WorkerEvent {
    Ready,
    Failed(SolverFailure),
}

struct Worker {
    handle: JoinHandle<Box<dyn Solver>>,
    stop: Arc<AtomicBool>,
    constraints: Sender<SolverConstraints>,
    events: Receiver<WorkerEvent>,
}

/// Runs a [`Solver`] on one background thread.
pub struct SolverThreadController {
    state: SolverState,
    solver: Option<Box<dyn Solver>>,
    worker: Option<Worker>,
    shared: Arc<Shared>,
    last_constraints: Option<SolverConstraints>,
    options: SolverOptions,
    spawned: u64,
}

impl std::fmt::Debug for SolverThreadController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverThreadController")
            .field("state", &self.state)
            .field("has_solver", &self.solver.is_some())
            .field("iterations", &self.iterations())
            .finish()
    }
}

fn worker_loop(
    mut solver: Box<dyn Solver>,
    stop: Arc<AtomicBool>,
    shared: Arc<Shared>,
    constraints: Receiver<SolverConstraints>,
    events: Sender<WorkerEvent>,
    idle_interval: Duration,
) -> Box<dyn Solver> {
    let _ = events.send(WorkerEvent::Ready);
    let mut idle = false;

    while !stop.load(Ordering::Acquire) {
        if idle {
            match constraints.recv_timeout(idle_interval) {
                Ok(c) => {
                    solver.set_constraints(&c);
                    idle = false;
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        loop {
            match constraints.try_recv() {
                Ok(c) => {
                    solver.set_constraints(&c);
                    idle = false;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return solver,
            }
        }
        if stop.load(Ordering::Acquire) {
            break;
        }

        match solver.step() {
            Ok(status) => {
                shared.publish(solver.layout().clone());
                shared.iterations.fetch_add(1, Ordering::AcqRel);
                shared
                    .energy
                    .store(status.energy().to_bits(), Ordering::Release);
                shared
                    .converged
                    .store(status.is_converged(), Ordering::Release);
                idle = status.is_converged();
            }
            Err(failure) => {
                let _ = events.send(WorkerEvent::Failed(failure));
                break;
            }
        }
    }

    solver
}

impl SolverThreadController {
    /// Create a stopped controller with no solver.
    pub fn new(options: SolverOptions) -> Self {
        Self {
            state: SolverState::Stopped,
            solver: None,
            worker: None,
            shared: Arc::new(Shared::default()),
            last_constraints: None,
            options,
            spawned: 0,
        }
    }

    /// Install a solver. The controller must be stopped.
    pub fn set_solver(&mut self, solver: Box<dyn Solver>) -> Result<()> {
        if self.state != SolverState::Stopped {
            return Err(EditorError::InvalidState(
                "cannot replace the solver while it is running".into(),
            ));
        }
        self.shared.publish(solver.layout().clone());
        self.shared.iterations.store(0, Ordering::Release);
        self.shared.converged.store(false, Ordering::Release);
        self.solver = Some(solver);
        Ok(())
    }

    /// Take the solver out of a stopped controller.
    pub fn take_solver(&mut self) -> Option<Box<dyn Solver>> {
        if self.state == SolverState::Stopped {
            self.solver.take()
        } else {
            None
        }
    }

    /// Start the worker. Does nothing if it is already running.
    ///
    /// A worker that exited on a failure is joined and the failure returned
    /// instead of spawning a new one.
    pub fn start(&mut self) -> Result<()> {
        if self.state == SolverState::Running {
            if !self.worker_finished() {
                return Ok(());
            }
            self.stop()?;
        }
        let Some(solver) = self.solver.take() else {
            return Err(EditorError::InvalidState("no solver to start".into()));
        };

        self.state = SolverState::Starting;
        let stop = Arc::new(AtomicBool::new(false));
        let (constraints_tx, constraints_rx) = mpsc::channel();
        let (events_tx, events_rx) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        let worker_stop = Arc::clone(&stop);
        let idle_interval = self.options.idle_interval;

        let handle = thread::Builder::new()
            .name("seamstress-solver".into())
            .spawn(move || {
                worker_loop(
                    solver,
                    worker_stop,
                    shared,
                    constraints_rx,
                    events_tx,
                    idle_interval,
                )
            })
            .map_err(|e| {
                self.state = SolverState::Stopped;
                EditorError::Io(e)
            })?;
        self.spawned += 1;

        if !matches!(events_rx.recv(), Ok(WorkerEvent::Ready)) {
            self.state = SolverState::Stopped;
            return match handle.join() {
                Ok(solver) => {
                    self.solver = Some(solver);
                    Err(EditorError::InvalidState("solver worker exited on start".into()))
                }
                Err(_) => Err(EditorError::InvalidState("solver worker panicked".into())),
            };
        }

        if let Some(c) = &self.last_constraints {
            let _ = constraints_tx.send(c.clone());
        }
        self.worker = Some(Worker {
            handle,
            stop,
            constraints: constraints_tx,
            events: events_rx,
        });
        self.state = SolverState::Running;
        info!("solver thread started");
        Ok(())
    }

    /// Stop the worker and wait for it to exit. Does nothing if stopped.
    ///
    /// Surfaces a failure the worker hit before it was stopped.
    pub fn stop(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            self.state = SolverState::Stopped;
            return Ok(());
        };

        self.state = SolverState::Stopping;
        worker.stop.store(true, Ordering::Release);
        drop(worker.constraints);
        let joined = worker.handle.join();
        self.state = SolverState::Stopped;

        let solver =
            joined.map_err(|_| EditorError::InvalidState("solver worker panicked".into()))?;
        self.solver = Some(solver);

        let failure = worker.events.try_iter().find_map(|event| match event {
            WorkerEvent::Failed(f) => Some(f),
            WorkerEvent::Ready => None,
        });
        info!("solver thread stopped after {} iterations", self.iterations());
        match failure {
            Some(f) => {
                warn!("solver failed: {}", f);
                Err(EditorError::Solver(f))
            }
            None => Ok(()),
        }
    }

    /// Check whether the worker failed. A failed worker is joined and the
    /// controller moves to [`SolverState::Stopped`]; it is not restarted.
    pub fn poll(&mut self) -> Result<()> {
        let failed = match &self.worker {
            Some(worker) => match worker.events.try_recv() {
                Ok(WorkerEvent::Failed(f)) => Some(f),
                Ok(WorkerEvent::Ready) | Err(_) => None,
            },
            None => None,
        };
        let Some(failure) = failed else {
            return Ok(());
        };

        if let Some(worker) = self.worker.take() {
            drop(worker.constraints);
            self.state = SolverState::Stopped;
            match worker.handle.join() {
                Ok(solver) => self.solver = Some(solver),
                Err(_) => {
                    return Err(EditorError::InvalidState("solver worker panicked".into()));
                }
            }
        }
        warn!("solver failed, stopping: {}", failure);
        Err(EditorError::Solver(failure))
    }

    /// Publish new constraints. They are kept and re-sent on the next start.
    pub fn publish(&mut self, mut constraints: SolverConstraints) {
        let revision = self.last_constraints.as_ref().map_or(0, |c| c.revision) + 1;
        constraints.revision = revision;
        if let Some(worker) = &self.worker {
            let _ = worker.constraints.send(constraints.clone());
        } else if let Some(solver) = self.solver.as_mut() {
            solver.set_constraints(&constraints);
            self.shared.publish(solver.layout().clone());
        }
        debug!(
            "published constraints r{} ({} pins, {} face targets, {} pairs)",
            revision,
            constraints.pinned.len(),
            constraints.face_targets.len(),
            constraints.separation.len()
        );
        self.last_constraints = Some(constraints);
    }

    /// The last published constraints.
    pub fn constraints(&self) -> Option<&SolverConstraints> {
        self.last_constraints.as_ref()
    }

    /// The most recently published layout.
    pub fn latest_layout(&self) -> Arc<UvLayout> {
        self.shared.latest()
    }

    /// Current state. A worker that has exited reports
    /// [`SolverState::Stopped`] even before it is joined.
    pub fn state(&self) -> SolverState {
        if self.state == SolverState::Running && self.worker_finished() {
            SolverState::Stopped
        } else {
            self.state
        }
    }

    /// Whether the worker is running.
    pub fn is_running(&self) -> bool {
        self.state() == SolverState::Running
    }

    fn worker_finished(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| worker.handle.is_finished())
    }

    /// Whether a solver is installed (stopped or running).
    pub fn has_solver(&self) -> bool {
        self.solver.is_some() || self.worker.is_some()
    }

    /// Iterations published since the solver was installed.
    pub fn iterations(&self) -> u64 {
        self.shared.iterations.load(Ordering::Acquire)
    }

    /// Energy of the last iteration, if any ran.
    pub fn last_energy(&self) -> Option<f64> {
        (self.iterations() > 0).then(|| f64::from_bits(self.shared.energy.load(Ordering::Acquire)))
    }

    /// Whether the last iteration converged.
    pub fn is_converged(&self) -> bool {
        self.shared.converged.load(Ordering::Acquire)
    }

    /// Number of workers spawned over the controller's life.
    pub fn workers_spawned(&self) -> u64 {
        self.spawned
    }
}

impl Drop for SolverThreadController {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.stop();
        }
    }
}
