//! Reconciliation of local sequence order with a backing store.
//!
//! # Responsibility
//! - Serialize every mutating operation on one sequence (FIFO).
//! - Apply reorders optimistically, then persist changed positions one by one.
//! - Persist add/update/delete first and mutate local state only on success.
//! - Surface typed failures and broadcast reconciliation outcomes.
//!
//! # Invariants
//! - At most one operation per sequence is in flight; others wait in order.
//! - Position writes run sequentially by ascending target position; the
//!   first failure aborts the rest and local order is not rolled back.
//! - Once an operation has started it runs to completion even if the caller
//!   stops waiting; dropping a call still waiting in the queue discards it.
//! - The phase is `Applying` from invocation (queued included) until the
//!   last pending operation finishes, then `Idle`.
//! - `create_entry` is never retried: a timed-out create may have committed.

use crate::model::entry::{EntryId, EntryPayload, EntryValidationError, OrderedEntry};
use crate::sequence::reorder::{
    compact_positions, merge_assignments, move_entry, sort_for_display, Assignment,
    MoveInstruction, ReorderError, ReorderOutcome,
};
use crate::sequence::retry::RetryPolicy;
use crate::sequence::store::{FailureKind, SequenceId, SequenceStore, StoreError, StoreResult};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch, Mutex, OwnedMutexGuard};

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Coordinator tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Upper bound for each individual store call.
    pub store_timeout: Duration,
    /// Retry policy for transient store failures.
    pub retry: RetryPolicy,
    /// Buffered reconciliation events per subscriber.
    pub event_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            retry: RetryPolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_event_capacity(mut self, event_capacity: usize) -> Self {
        self.event_capacity = event_capacity.max(1);
        self
    }
}

/// Coordinator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorPhase {
    Idle,
    Applying,
    /// Set when an operation fails; replaced by `Idle`, or by `Applying`
    /// while more operations are pending, as soon as it returns.
    Failed,
}

/// Operation kinds reported in failures and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Load,
    Move,
    ApplyReorder,
    Add,
    Update,
    Remove,
    Compact,
    FlushPending,
    Resync,
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Load => "load",
            Self::Move => "move",
            Self::ApplyReorder => "apply_reorder",
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Compact => "compact",
            Self::FlushPending => "flush_pending",
            Self::Resync => "resync",
        };
        f.write_str(label)
    }
}

/// Asynchronous reconciliation outcome notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationEvent {
    Started {
        operation: OperationKind,
    },
    Completed {
        operation: OperationKind,
    },
    Failed {
        operation: OperationKind,
        kind: Option<FailureKind>,
        entry_id: Option<EntryId>,
        message: String,
    },
    /// Local cache is stale; caller should `resync`.
    ResyncRequired {
        operation: OperationKind,
        entry_id: Option<EntryId>,
    },
}

/// Aggregated store failure for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileFailure {
    pub operation: OperationKind,
    /// Entry whose store call failed, when the call targeted one entry.
    pub entry_id: Option<EntryId>,
    pub cause: StoreError,
    /// Entries persisted by this operation before the failure.
    pub applied: Vec<EntryId>,
    /// Entries whose writes were not persisted, failing entry first.
    pub unwritten: Vec<EntryId>,
}

impl ReconcileFailure {
    fn single(operation: OperationKind, entry_id: Option<EntryId>, cause: StoreError) -> Self {
        Self {
            operation,
            entry_id,
            cause,
            applied: Vec::new(),
            unwritten: entry_id.into_iter().collect(),
        }
    }
}

impl Display for ReconcileFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} failed ({}): {}; {} applied, {} unwritten",
            self.operation,
            self.cause.kind(),
            self.cause,
            self.applied.len(),
            self.unwritten.len()
        )
    }
}

impl Error for ReconcileFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

/// Errors from coordinator operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// Caller passed indices outside the current sequence.
    Precondition(ReorderError),
    /// Entry id is not part of the local sequence.
    UnknownEntry(EntryId),
    /// Payload failed local validation; the store was not contacted.
    InvalidPayload(EntryValidationError),
    /// Store call failed.
    Reconcile(ReconcileFailure),
    /// Background operation task did not finish normally.
    Interrupted(String),
}

impl CoordinatorError {
    /// Failure class, when the error maps to the store taxonomy.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::InvalidPayload(_) => Some(FailureKind::ValidationFailure),
            Self::Reconcile(failure) => Some(failure.cause.kind()),
            Self::Precondition(_) | Self::UnknownEntry(_) | Self::Interrupted(_) => None,
        }
    }

    /// Whether the caller must refresh the full sequence before retrying.
    pub fn requires_resync(&self) -> bool {
        self.failure_kind() == Some(FailureKind::NotFoundFailure)
    }

    fn entry_id(&self) -> Option<EntryId> {
        match self {
            Self::UnknownEntry(id) => Some(*id),
            Self::Reconcile(failure) => failure.entry_id,
            _ => None,
        }
    }
}

impl Display for CoordinatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Precondition(err) => write!(f, "precondition violated: {err}"),
            Self::UnknownEntry(id) => write!(f, "entry is not part of this sequence: {id}"),
            Self::InvalidPayload(err) => write!(f, "{err}"),
            Self::Reconcile(failure) => write!(f, "{failure}"),
            Self::Interrupted(message) => write!(f, "operation interrupted: {message}"),
        }
    }
}

impl Error for CoordinatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Precondition(err) => Some(err),
            Self::InvalidPayload(err) => Some(err),
            Self::Reconcile(failure) => Some(failure),
            Self::UnknownEntry(_) | Self::Interrupted(_) => None,
        }
    }
}

impl From<ReorderError> for CoordinatorError {
    fn from(value: ReorderError) -> Self {
        Self::Precondition(value)
    }
}

impl From<EntryValidationError> for CoordinatorError {
    fn from(value: EntryValidationError) -> Self {
        Self::InvalidPayload(value)
    }
}

impl From<ReconcileFailure> for CoordinatorError {
    fn from(value: ReconcileFailure) -> Self {
        Self::Reconcile(value)
    }
}

/// Local sequence plus last positions known to be persisted.
#[derive(Debug, Default)]
struct SequenceState {
    entries: Vec<OrderedEntry>,
    persisted: HashMap<EntryId, i64>,
}

impl SequenceState {
    fn from_store(mut entries: Vec<OrderedEntry>) -> Self {
        sort_for_display(&mut entries);
        let persisted = entries
            .iter()
            .map(|entry| (entry.id, entry.position))
            .collect();
        Self { entries, persisted }
    }

    fn contains(&self, entry_id: EntryId) -> bool {
        self.entries.iter().any(|entry| entry.id == entry_id)
    }

    /// Next free position at the tail. Equals `len` unless deletions left
    /// gaps that push the last position past it.
    fn append_position(&self) -> i64 {
        let len = self.entries.len() as i64;
        self.entries
            .last()
            .map_or(len, |last| len.max(last.position + 1))
    }

    fn current_assignments(&self) -> Vec<Assignment> {
        self.entries
            .iter()
            .map(|entry| Assignment {
                entry_id: entry.id,
                position: entry.position,
            })
            .collect()
    }
}

/// Phase plus the number of invoked, unfinished operations.
struct PhaseTracker {
    pending: StdMutex<usize>,
    phase: watch::Sender<CoordinatorPhase>,
}

impl PhaseTracker {
    fn new() -> Self {
        let (phase, _) = watch::channel(CoordinatorPhase::Idle);
        Self {
            pending: StdMutex::new(0),
            phase,
        }
    }

    fn enter(self: &Arc<Self>) -> PendingOperation {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending += 1;
        self.phase.send_replace(CoordinatorPhase::Applying);
        PendingOperation {
            tracker: Arc::clone(self),
        }
    }

    fn mark_failed(&self) {
        let _pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        self.phase.send_replace(CoordinatorPhase::Failed);
    }

    fn leave(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending = pending.saturating_sub(1);
        let next = if *pending == 0 {
            CoordinatorPhase::Idle
        } else {
            CoordinatorPhase::Applying
        };
        self.phase.send_replace(next);
    }
}

/// Counts one operation as pending until dropped, queued or running.
struct PendingOperation {
    tracker: Arc<PhaseTracker>,
}

impl Drop for PendingOperation {
    fn drop(&mut self) {
        self.tracker.leave();
    }
}

type OpFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CoordinatorError>> + Send + 'a>>;

struct Shared<S> {
    store: S,
    sequence_id: SequenceId,
    config: CoordinatorConfig,
    view: watch::Sender<Vec<OrderedEntry>>,
    phase: Arc<PhaseTracker>,
    events: broadcast::Sender<ReconciliationEvent>,
}

/// Serialized, failure-aware manager of one ordered sequence.
///
/// Cloning yields another handle to the same sequence and queue.
pub struct ReconciliationCoordinator<S> {
    shared: Arc<Shared<S>>,
    state: Arc<Mutex<SequenceState>>,
}

impl<S> Clone for ReconciliationCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: SequenceStore + 'static> ReconciliationCoordinator<S> {
    /// Reads `sequence_id` from `store` and builds a coordinator over it.
    ///
    /// # Errors
    /// - `Reconcile` with the store failure when the initial read fails.
    pub async fn load(
        store: S,
        sequence_id: SequenceId,
        config: CoordinatorConfig,
    ) -> Result<Self, CoordinatorError> {
        let started_at = Instant::now();
        info!(
            "event=sequence_load module=sequence status=start sequence_id={}",
            sequence_id
        );

        let (view, _) = watch::channel(Vec::new());
        let phase = Arc::new(PhaseTracker::new());
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let shared = Shared {
            store,
            sequence_id,
            config,
            view,
            phase,
            events,
        };

        let entries = match shared
            .call("read_sequence", || shared.store.read_sequence(sequence_id))
            .await
        {
            Ok(entries) => entries,
            Err(cause) => {
                error!(
                    "event=sequence_load module=sequence status=error sequence_id={} duration_ms={} error_kind={} error={}",
                    sequence_id,
                    started_at.elapsed().as_millis(),
                    cause.kind(),
                    cause
                );
                return Err(ReconcileFailure::single(OperationKind::Load, None, cause).into());
            }
        };

        let state = SequenceState::from_store(entries);
        shared.view.send_replace(state.entries.clone());
        info!(
            "event=sequence_load module=sequence status=ok sequence_id={} entries={} duration_ms={}",
            sequence_id,
            state.entries.len(),
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            shared: Arc::new(shared),
            state: Arc::new(Mutex::new(state)),
        })
    }

    pub fn sequence_id(&self) -> SequenceId {
        self.shared.sequence_id
    }

    /// Current ordered view. Never waits on queued operations, so it may
    /// show an optimistic order that an in-flight operation has not
    /// confirmed yet.
    pub fn snapshot(&self) -> Vec<OrderedEntry> {
        self.shared.view.borrow().clone()
    }

    /// Receiver notified on every change of the ordered view.
    pub fn watch_view(&self) -> watch::Receiver<Vec<OrderedEntry>> {
        self.shared.view.subscribe()
    }

    pub fn phase(&self) -> CoordinatorPhase {
        *self.shared.phase.phase.borrow()
    }

    /// Subscribes to reconciliation events.
    pub fn subscribe(&self) -> broadcast::Receiver<ReconciliationEvent> {
        self.shared.events.subscribe()
    }

    /// Moves the entry at display index `source` to `destination`.
    ///
    /// The new order is published locally before any write. On failure the
    /// optimistic order stays in place; see `flush_pending`.
    pub async fn move_entry(
        &self,
        source: usize,
        destination: usize,
    ) -> Result<ReorderOutcome, CoordinatorError> {
        let instruction = MoveInstruction::new(source, destination);
        self.run(OperationKind::Move, move |shared, state| {
            Box::pin(shared.move_entry(state, instruction))
        })
        .await
    }

    /// Applies externally computed assignments locally, then persists them.
    pub async fn apply_reorder(
        &self,
        assignments: Vec<Assignment>,
    ) -> Result<Vec<EntryId>, CoordinatorError> {
        self.run(OperationKind::ApplyReorder, move |shared, state| {
            Box::pin(shared.apply_reorder(state, assignments))
        })
        .await
    }

    /// Appends a new entry after persisting it.
    pub async fn add_entry(&self, payload: EntryPayload) -> Result<OrderedEntry, CoordinatorError> {
        self.run(OperationKind::Add, move |shared, state| {
            Box::pin(shared.add_entry(state, payload))
        })
        .await
    }

    /// Replaces an entry payload after persisting it.
    pub async fn update_entry(
        &self,
        entry_id: EntryId,
        payload: EntryPayload,
    ) -> Result<OrderedEntry, CoordinatorError> {
        self.run(OperationKind::Update, move |shared, state| {
            Box::pin(shared.update_entry(state, entry_id, payload))
        })
        .await
    }

    /// Deletes an entry after persisting the deletion. Survivors keep their
    /// positions.
    pub async fn remove_entry(&self, entry_id: EntryId) -> Result<(), CoordinatorError> {
        self.run(OperationKind::Remove, move |shared, state| {
            Box::pin(shared.remove_entry(state, entry_id))
        })
        .await
    }

    /// Renumbers positions to `0..len` and persists the changed ones.
    pub async fn compact(&self) -> Result<Vec<EntryId>, CoordinatorError> {
        self.run(OperationKind::Compact, |shared, state| {
            Box::pin(shared.compact(state))
        })
        .await
    }

    /// Writes every local position that differs from the persisted one.
    pub async fn flush_pending(&self) -> Result<Vec<EntryId>, CoordinatorError> {
        self.run(OperationKind::FlushPending, |shared, state| {
            Box::pin(shared.flush_pending(state))
        })
        .await
    }

    /// Replaces local state with a fresh read from the store.
    pub async fn resync(&self) -> Result<Vec<OrderedEntry>, CoordinatorError> {
        self.run(OperationKind::Resync, |shared, state| {
            Box::pin(shared.resync(state))
        })
        .await
    }

    /// Queues `op` behind earlier operations and runs it on its own task.
    async fn run<T, F>(&self, operation: OperationKind, op: F) -> Result<T, CoordinatorError>
    where
        T: Send + 'static,
        F: for<'a> FnOnce(&'a Shared<S>, &'a mut SequenceState) -> OpFuture<'a, T>
            + Send
            + 'static,
    {
        debug!(
            "event=operation_queued module=sequence operation={} sequence_id={}",
            operation, self.shared.sequence_id
        );
        let pending = self.shared.phase.enter();
        // Dropping the caller's future here discards the queued operation.
        let mut guard: OwnedMutexGuard<SequenceState> = Arc::clone(&self.state).lock_owned().await;
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            let started_at = shared.begin(operation);
            let result = op(shared.as_ref(), &mut *guard).await;
            shared.finish(operation, started_at, &result);
            drop(pending);
            result
        });

        match task.await {
            Ok(result) => result,
            Err(err) => {
                error!(
                    "event=operation_task module=sequence status=error operation={} error={}",
                    operation, err
                );
                Err(CoordinatorError::Interrupted(err.to_string()))
            }
        }
    }
}

impl<S: SequenceStore> Shared<S> {
    fn begin(&self, operation: OperationKind) -> Instant {
        let _ = self.events.send(ReconciliationEvent::Started { operation });
        info!(
            "event=reconcile module=sequence status=start operation={} sequence_id={}",
            operation, self.sequence_id
        );
        Instant::now()
    }

    fn finish<T>(
        &self,
        operation: OperationKind,
        started_at: Instant,
        result: &Result<T, CoordinatorError>,
    ) {
        let duration_ms = started_at.elapsed().as_millis();
        match result {
            Ok(_) => {
                info!(
                    "event=reconcile module=sequence status=ok operation={} sequence_id={} duration_ms={}",
                    operation, self.sequence_id, duration_ms
                );
                let _ = self.events.send(ReconciliationEvent::Completed { operation });
            }
            Err(err) => {
                self.phase.mark_failed();
                error!(
                    "event=reconcile module=sequence status=error operation={} sequence_id={} duration_ms={} error_kind={} error={}",
                    operation,
                    self.sequence_id,
                    duration_ms,
                    err.failure_kind()
                        .map_or_else(|| "precondition".to_string(), |kind| kind.to_string()),
                    err
                );
                let _ = self.events.send(ReconciliationEvent::Failed {
                    operation,
                    kind: err.failure_kind(),
                    entry_id: err.entry_id(),
                    message: err.to_string(),
                });
                if err.requires_resync() {
                    let _ = self.events.send(ReconciliationEvent::ResyncRequired {
                        operation,
                        entry_id: err.entry_id(),
                    });
                }
            }
        }
    }

    /// One store call bounded by timeout and retried per policy.
    async fn call<T, F, Fut>(&self, label: &'static str, call: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        self.call_with(self.config.retry, label, call).await
    }

    /// One store call bounded by timeout and attempted once. For calls that
    /// are unsafe to repeat when an earlier attempt may have committed.
    async fn call_once<T, F, Fut>(&self, label: &'static str, call: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        self.call_with(RetryPolicy::disabled(), label, call).await
    }

    async fn call_with<T, F, Fut>(
        &self,
        policy: RetryPolicy,
        label: &'static str,
        mut call: F,
    ) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let timeout = self.config.store_timeout;
        policy
            .run(label, || {
                let pending = call();
                async move {
                    match tokio::time::timeout(timeout, pending).await {
                        Ok(result) => result,
                        Err(_) => Err(StoreError::Transient(format!(
                            "{label} timed out after {}ms",
                            timeout.as_millis()
                        ))),
                    }
                }
            })
            .await
    }

    fn publish(&self, state: &SequenceState) {
        self.view.send_replace(state.entries.clone());
    }

    async fn move_entry(
        &self,
        state: &mut SequenceState,
        instruction: MoveInstruction,
    ) -> Result<ReorderOutcome, CoordinatorError> {
        let outcome = move_entry(&state.entries, instruction.source, instruction.destination)?;
        if outcome.is_noop() {
            debug!(
                "event=reorder_noop module=sequence sequence_id={} index={}",
                self.sequence_id, instruction.source
            );
            return Ok(outcome);
        }

        state.entries = outcome.entries.clone();
        self.publish(state);
        self.write_positions(state, OperationKind::Move, outcome.assignments.clone())
            .await?;
        Ok(outcome)
    }

    async fn apply_reorder(
        &self,
        state: &mut SequenceState,
        assignments: Vec<Assignment>,
    ) -> Result<Vec<EntryId>, CoordinatorError> {
        if let Some(unknown) = assignments
            .iter()
            .find(|assignment| !state.contains(assignment.entry_id))
        {
            return Err(CoordinatorError::UnknownEntry(unknown.entry_id));
        }

        state.entries = merge_assignments(&state.entries, &assignments)?;
        self.publish(state);

        let written = self
            .write_positions(state, OperationKind::ApplyReorder, assignments)
            .await?;
        Ok(written)
    }

    async fn add_entry(
        &self,
        state: &mut SequenceState,
        payload: EntryPayload,
    ) -> Result<OrderedEntry, CoordinatorError> {
        payload.validate()?;
        let position = state.append_position();
        let entry_id = self
            .call_once("create_entry", || {
                self.store.create_entry(self.sequence_id, &payload, position)
            })
            .await
            .map_err(|cause| ReconcileFailure::single(OperationKind::Add, None, cause))?;

        let entry = OrderedEntry::new(entry_id, position, payload);
        state.entries.push(entry.clone());
        state.persisted.insert(entry_id, position);
        self.publish(state);
        Ok(entry)
    }

    async fn update_entry(
        &self,
        state: &mut SequenceState,
        entry_id: EntryId,
        payload: EntryPayload,
    ) -> Result<OrderedEntry, CoordinatorError> {
        if !state.contains(entry_id) {
            return Err(CoordinatorError::UnknownEntry(entry_id));
        }
        payload.validate()?;
        self.call("write_entry_payload", || {
            self.store
                .write_entry_payload(self.sequence_id, entry_id, &payload)
        })
        .await
        .map_err(|cause| ReconcileFailure::single(OperationKind::Update, Some(entry_id), cause))?;

        let entry = state
            .entries
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or(CoordinatorError::UnknownEntry(entry_id))?;
        entry.payload = payload;
        let updated = entry.clone();
        self.publish(state);
        Ok(updated)
    }

    async fn remove_entry(
        &self,
        state: &mut SequenceState,
        entry_id: EntryId,
    ) -> Result<(), CoordinatorError> {
        if !state.contains(entry_id) {
            return Err(CoordinatorError::UnknownEntry(entry_id));
        }
        self.call("delete_entry", || {
            self.store.delete_entry(self.sequence_id, entry_id)
        })
        .await
        .map_err(|cause| ReconcileFailure::single(OperationKind::Remove, Some(entry_id), cause))?;

        state.entries.retain(|entry| entry.id != entry_id);
        state.persisted.remove(&entry_id);
        self.publish(state);
        Ok(())
    }

    async fn compact(&self, state: &mut SequenceState) -> Result<Vec<EntryId>, CoordinatorError> {
        let outcome = compact_positions(&state.entries);
        state.entries = outcome.entries;
        self.publish(state);
        let written = self
            .write_positions(state, OperationKind::Compact, outcome.assignments)
            .await?;
        Ok(written)
    }

    async fn flush_pending(
        &self,
        state: &mut SequenceState,
    ) -> Result<Vec<EntryId>, CoordinatorError> {
        let assignments = state.current_assignments();
        let written = self
            .write_positions(state, OperationKind::FlushPending, assignments)
            .await?;
        Ok(written)
    }

    async fn resync(
        &self,
        state: &mut SequenceState,
    ) -> Result<Vec<OrderedEntry>, CoordinatorError> {
        let entries = self
            .call("read_sequence", || {
                self.store.read_sequence(self.sequence_id)
            })
            .await
            .map_err(|cause| ReconcileFailure::single(OperationKind::Resync, None, cause))?;
        *state = SequenceState::from_store(entries);
        self.publish(state);
        Ok(state.entries.clone())
    }

    /// Persists assignments whose position differs from the persisted one,
    /// sequentially by ascending target position. Returns the written ids.
    async fn write_positions(
        &self,
        state: &mut SequenceState,
        operation: OperationKind,
        assignments: Vec<Assignment>,
    ) -> Result<Vec<EntryId>, ReconcileFailure> {
        let mut pending: Vec<Assignment> = assignments
            .into_iter()
            .filter(|assignment| {
                state.persisted.get(&assignment.entry_id) != Some(&assignment.position)
            })
            .collect();
        pending.sort_by_key(|assignment| assignment.position);

        let mut applied = Vec::with_capacity(pending.len());
        for (index, assignment) in pending.iter().enumerate() {
            let result = self
                .call("write_entry_position", || {
                    self.store.write_entry_position(
                        self.sequence_id,
                        assignment.entry_id,
                        assignment.position,
                    )
                })
                .await;
            match result {
                Ok(()) => {
                    state
                        .persisted
                        .insert(assignment.entry_id, assignment.position);
                    applied.push(assignment.entry_id);
                }
                Err(cause) => {
                    let unwritten: Vec<EntryId> = pending[index..]
                        .iter()
                        .map(|assignment| assignment.entry_id)
                        .collect();
                    warn!(
                        "event=position_write module=sequence status=aborted operation={} sequence_id={} entry_id={} applied={} unwritten={} error_kind={}",
                        operation,
                        self.sequence_id,
                        assignment.entry_id,
                        applied.len(),
                        unwritten.len(),
                        cause.kind()
                    );
                    return Err(ReconcileFailure {
                        operation,
                        entry_id: Some(assignment.entry_id),
                        cause,
                        applied,
                        unwritten,
                    });
                }
            }
        }

        debug!(
            "event=position_write module=sequence status=ok operation={} sequence_id={} written={}",
            operation,
            self.sequence_id,
            applied.len()
        );
        Ok(applied)
    }
}
