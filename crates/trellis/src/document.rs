//! A graph shared between the host and a background layout worker.
//!
//! Structural edits run synchronously on the caller's thread. A layout runs
//! on a snapshot in a worker thread; its result is applied with
//! [`Document::commit`] under the write lock, so readers see either all of
//! the new positions or none of them.

use std::{
    sync::{
        Mutex, PoisonError, RwLock, RwLockReadGuard,
        mpsc::{self, Receiver, TryRecvError},
    },
    thread::{self, JoinHandle},
};

use log::{debug, info, warn};
use serde::Deserialize;

use trellis_core::{command::Command, error::GraphError, graph::Graph};

use crate::{
    advisor,
    config::LayoutConfig,
    error::{LayoutError, TrellisError},
    layout::{self, Algorithm, CancelToken, LayoutOptions, PositionAssignment},
};

/// What to do with a layout request while another one is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Fail the new request with [`LayoutError::Busy`].
    #[default]
    Reject,
    /// Cancel the running job, wait for it to stop, then start the new one.
    CancelInFlight,
}

struct InFlight {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

type JobResult = Result<PositionAssignment, LayoutError>;

/// A running layout.
///
/// Dropping the job does not stop the worker; call [`cancel`](Self::cancel)
/// first if the result is no longer wanted.
pub struct LayoutJob {
    algorithm: Algorithm,
    cancel: CancelToken,
    receiver: Receiver<JobResult>,
}

impl LayoutJob {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// A token that cancels this job from anywhere.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Asks the worker to stop after its current iteration. The job still
    /// delivers the positions reached so far.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Blocks until the worker reports.
    ///
    /// # Errors
    ///
    /// The layout's own error, or [`LayoutError::Disconnected`] if the worker
    /// died without reporting.
    pub fn wait(self) -> JobResult {
        self.receiver.recv().map_err(|_| LayoutError::Disconnected)?
    }

    /// The result if the worker has finished, without blocking.
    ///
    /// The result is handed out once; later calls report
    /// [`LayoutError::Disconnected`].
    pub fn try_result(&self) -> Option<JobResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(LayoutError::Disconnected)),
        }
    }
}

/// Owns a [`Graph`] and runs at most one layout for it at a time.
pub struct Document {
    graph: RwLock<Graph>,
    in_flight: Mutex<Option<InFlight>>,
    options: LayoutOptions,
    policy: BusyPolicy,
}

impl Document {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph: RwLock::new(graph),
            in_flight: Mutex::new(None),
            options: LayoutOptions::default(),
            policy: BusyPolicy::default(),
        }
    }

    /// A document using the layout parameters and busy policy of `config`.
    pub fn with_config(graph: Graph, config: &LayoutConfig) -> Self {
        Self {
            graph: RwLock::new(graph),
            in_flight: Mutex::new(None),
            options: LayoutOptions::from(config),
            policy: config.busy_policy(),
        }
    }

    /// Parses DOT text into a new document.
    ///
    /// # Errors
    ///
    /// [`TrellisError::Parse`] carrying the text for snippet rendering.
    pub fn import_text(text: &str) -> Result<Self, TrellisError> {
        crate::import_text(text).map(Self::new)
    }

    pub fn set_busy_policy(&mut self, policy: BusyPolicy) {
        self.policy = policy;
    }

    pub fn set_options(&mut self, options: LayoutOptions) {
        self.options = options;
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Read access to the graph. Holding the guard delays commits.
    pub fn read(&self) -> RwLockReadGuard<'_, Graph> {
        self.graph.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs a structural edit under the write lock.
    ///
    /// ```
    /// # use trellis::Document;
    /// # use trellis_core::{graph::Graph, identifier::Id, node::Node};
    /// let document = Document::new(Graph::new());
    /// document.edit(|graph| graph.add_node(Node::new(Id::new("a")))).unwrap();
    /// assert_eq!(document.read().node_count(), 1);
    /// ```
    pub fn edit<T>(&self, edit: impl FnOnce(&mut Graph) -> T) -> T {
        let mut graph = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        edit(&mut graph)
    }

    /// Returns `true` while a layout worker is running.
    pub fn is_busy(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|job| !job.handle.is_finished())
    }

    /// Starts `algorithm` with the document's options.
    ///
    /// # Errors
    ///
    /// See [`start_layout_with`](Self::start_layout_with).
    pub fn start_layout(&self, algorithm: Algorithm) -> Result<LayoutJob, LayoutError> {
        self.start_layout_with(algorithm, self.options.clone())
    }

    /// Starts `algorithm` on a snapshot of the graph in a worker thread.
    ///
    /// # Errors
    ///
    /// [`LayoutError::Busy`] if a job is running and the policy is
    /// [`BusyPolicy::Reject`]; [`LayoutError::Disconnected`] if no worker
    /// thread could be spawned.
    pub fn start_layout_with(
        &self,
        algorithm: Algorithm,
        options: LayoutOptions,
    ) -> Result<LayoutJob, LayoutError> {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = slot.take() {
            if !running.handle.is_finished() {
                match self.policy {
                    BusyPolicy::Reject => {
                        *slot = Some(running);
                        debug!(algorithm = algorithm.name(); "Layout rejected, document busy");
                        return Err(LayoutError::Busy);
                    }
                    BusyPolicy::CancelInFlight => {
                        info!(algorithm = algorithm.name(); "Cancelling running layout");
                        running.cancel.cancel();
                        if running.handle.join().is_err() {
                            warn!("Cancelled layout worker panicked");
                        }
                    }
                }
            }
        }

        let snapshot = self.read().clone();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(format!("trellis-{}", algorithm.name()))
            .spawn(move || {
                let result = layout::compute(&snapshot, algorithm, &options, &worker_cancel);
                // The job may have been dropped; nobody is waiting then.
                let _ = sender.send(result);
            })
            .map_err(|err| {
                warn!(err:% = err; "Failed to spawn layout worker");
                LayoutError::Disconnected
            })?;

        *slot = Some(InFlight {
            cancel: cancel.clone(),
            handle,
        });
        Ok(LayoutJob {
            algorithm,
            cancel,
            receiver,
        })
    }

    /// Applies `assignment` in one write-locked step.
    ///
    /// # Errors
    ///
    /// A [`GraphError`] if an assigned node was removed since the layout
    /// started. Nothing is applied in that case.
    pub fn commit(&self, assignment: &PositionAssignment) -> Result<Command, GraphError> {
        self.edit(|graph| layout::commit(graph, assignment))
    }

    /// Runs `algorithm` to completion and commits the result.
    ///
    /// # Errors
    ///
    /// Any error of [`start_layout`](Self::start_layout),
    /// [`LayoutJob::wait`] or [`commit`](Self::commit).
    pub fn apply_layout(&self, algorithm: Algorithm) -> Result<PositionAssignment, TrellisError> {
        let assignment = self.start_layout(algorithm)?.wait()?;
        self.commit(&assignment)?;
        Ok(assignment)
    }

    /// Serializes the graph under the read lock.
    pub fn export_text(&self) -> String {
        crate::export_text(&self.read())
    }

    /// Recomputes density and suggestions and stores them on the graph.
    pub fn refresh_advisory(&self) -> Vec<Algorithm> {
        self.edit(advisor::refresh)
    }

    /// Consumes the document and returns its graph.
    pub fn into_graph(self) -> Graph {
        if let Some(running) = self.take_in_flight() {
            running.cancel.cancel();
        }
        // Drop runs after this, so the graph is taken rather than moved out.
        self.edit(std::mem::take)
    }

    fn take_in_flight(&self) -> Option<InFlight> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        if let Some(running) = self.take_in_flight() {
            running.cancel.cancel();
        }
    }
}
