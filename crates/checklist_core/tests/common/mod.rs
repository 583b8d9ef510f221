#![allow(dead_code)]

use async_trait::async_trait;
use checklist_core::{
    EntryId, EntryPayload, OrderedEntry, SequenceId, SequenceStore, StoreError, StoreResult,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// One call observed by `ScriptedStore`, failed or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Read,
    WritePosition { entry_id: EntryId, position: i64 },
    WritePayload { entry_id: EntryId },
    Create { position: i64 },
    Delete { entry_id: EntryId },
}

#[derive(Default)]
struct Inner {
    sequences: HashMap<SequenceId, Vec<OrderedEntry>>,
    calls: Vec<StoreCall>,
    position_writes: usize,
    /// 1-based attempt index of `write_entry_position` -> injected error.
    position_failures: HashMap<usize, StoreError>,
    next_create_failure: Option<StoreError>,
    next_payload_failure: Option<StoreError>,
    next_delete_failure: Option<StoreError>,
    delay: Duration,
    /// Latency added after a create has committed.
    create_stall: Duration,
}

/// In-memory store with scripted failures and latency.
///
/// Clones share state, so a test keeps one handle for inspection while the
/// coordinator owns another.
#[derive(Clone, Default)]
pub struct ScriptedStore {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a sequence with `contents` at positions `0..n`.
    pub fn seed(&self, contents: &[&str]) -> (SequenceId, Vec<EntryId>) {
        let sequence_id = Uuid::new_v4();
        let entries: Vec<OrderedEntry> = contents
            .iter()
            .enumerate()
            .map(|(index, content)| {
                OrderedEntry::new(Uuid::new_v4(), index as i64, EntryPayload::new(*content))
            })
            .collect();
        let ids = entries.iter().map(|entry| entry.id).collect();
        self.lock().sequences.insert(sequence_id, entries);
        (sequence_id, ids)
    }

    /// Seeds a sequence with explicit positions.
    pub fn seed_positions(&self, items: &[(&str, i64)]) -> (SequenceId, Vec<EntryId>) {
        let sequence_id = Uuid::new_v4();
        let entries: Vec<OrderedEntry> = items
            .iter()
            .map(|(content, position)| {
                OrderedEntry::new(Uuid::new_v4(), *position, EntryPayload::new(*content))
            })
            .collect();
        let ids = entries.iter().map(|entry| entry.id).collect();
        self.lock().sequences.insert(sequence_id, entries);
        (sequence_id, ids)
    }

    pub fn fail_position_write(&self, attempt: usize, error: StoreError) {
        self.lock().position_failures.insert(attempt, error);
    }

    pub fn fail_next_create(&self, error: StoreError) {
        self.lock().next_create_failure = Some(error);
    }

    pub fn fail_next_payload_write(&self, error: StoreError) {
        self.lock().next_payload_failure = Some(error);
    }

    pub fn fail_next_delete(&self, error: StoreError) {
        self.lock().next_delete_failure = Some(error);
    }

    /// Adds latency to every call.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = delay;
    }

    /// Lets creates commit, then stall for `stall` before answering.
    pub fn stall_after_create(&self, stall: Duration) {
        self.lock().create_stall = stall;
    }

    /// Deletes an entry behind the coordinator's back.
    pub fn forget_entry(&self, sequence_id: SequenceId, entry_id: EntryId) {
        if let Some(entries) = self.lock().sequences.get_mut(&sequence_id) {
            entries.retain(|entry| entry.id != entry_id);
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Position writes in issue order, including failed ones.
    pub fn position_writes(&self) -> Vec<(EntryId, i64)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::WritePosition { entry_id, position } => Some((*entry_id, *position)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Stored ids ordered by position.
    pub fn stored_order(&self, sequence_id: SequenceId) -> Vec<EntryId> {
        let mut entries = self.stored(sequence_id);
        entries.sort_by_key(|entry| entry.position);
        entries.into_iter().map(|entry| entry.id).collect()
    }

    pub fn stored(&self, sequence_id: SequenceId) -> Vec<OrderedEntry> {
        self.lock()
            .sequences
            .get(&sequence_id)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("scripted store poisoned")
    }

    async fn pause(&self) {
        let delay = self.lock().delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SequenceStore for ScriptedStore {
    async fn read_sequence(&self, sequence_id: SequenceId) -> StoreResult<Vec<OrderedEntry>> {
        self.pause().await;
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Read);
        let mut entries = inner
            .sequences
            .get(&sequence_id)
            .cloned()
            .ok_or_else(|| StoreError::sequence_not_found(sequence_id))?;
        entries.sort_by_key(|entry| entry.position);
        Ok(entries)
    }

    async fn write_entry_position(
        &self,
        sequence_id: SequenceId,
        entry_id: EntryId,
        position: i64,
    ) -> StoreResult<()> {
        self.pause().await;
        let mut inner = self.lock();
        inner
            .calls
            .push(StoreCall::WritePosition { entry_id, position });
        inner.position_writes += 1;
        let attempt = inner.position_writes;
        if let Some(error) = inner.position_failures.remove(&attempt) {
            return Err(error);
        }
        let entry = inner
            .sequences
            .get_mut(&sequence_id)
            .and_then(|entries| entries.iter_mut().find(|entry| entry.id == entry_id))
            .ok_or_else(|| StoreError::entry_not_found(sequence_id, entry_id))?;
        entry.position = position;
        Ok(())
    }

    async fn write_entry_payload(
        &self,
        sequence_id: SequenceId,
        entry_id: EntryId,
        payload: &EntryPayload,
    ) -> StoreResult<()> {
        self.pause().await;
        let mut inner = self.lock();
        inner.calls.push(StoreCall::WritePayload { entry_id });
        if let Some(error) = inner.next_payload_failure.take() {
            return Err(error);
        }
        let entry = inner
            .sequences
            .get_mut(&sequence_id)
            .and_then(|entries| entries.iter_mut().find(|entry| entry.id == entry_id))
            .ok_or_else(|| StoreError::entry_not_found(sequence_id, entry_id))?;
        entry.payload = payload.clone();
        Ok(())
    }

    async fn create_entry(
        &self,
        sequence_id: SequenceId,
        payload: &EntryPayload,
        position: i64,
    ) -> StoreResult<EntryId> {
        self.pause().await;
        let (entry_id, stall) = {
            let mut inner = self.lock();
            inner.calls.push(StoreCall::Create { position });
            if let Some(error) = inner.next_create_failure.take() {
                return Err(error);
            }
            let stall = inner.create_stall;
            let entries = inner
                .sequences
                .get_mut(&sequence_id)
                .ok_or_else(|| StoreError::sequence_not_found(sequence_id))?;
            let entry_id = Uuid::new_v4();
            entries.push(OrderedEntry::new(entry_id, position, payload.clone()));
            (entry_id, stall)
        };
        if !stall.is_zero() {
            tokio::time::sleep(stall).await;
        }
        Ok(entry_id)
    }

    async fn delete_entry(&self, sequence_id: SequenceId, entry_id: EntryId) -> StoreResult<()> {
        self.pause().await;
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Delete { entry_id });
        if let Some(error) = inner.next_delete_failure.take() {
            return Err(error);
        }
        let entries = inner
            .sequences
            .get_mut(&sequence_id)
            .ok_or_else(|| StoreError::sequence_not_found(sequence_id))?;
        let before = entries.len();
        entries.retain(|entry| entry.id != entry_id);
        if entries.len() == before {
            return Err(StoreError::entry_not_found(sequence_id, entry_id));
        }
        Ok(())
    }
}

pub fn ids(entries: &[OrderedEntry]) -> Vec<EntryId> {
    entries.iter().map(|entry| entry.id).collect()
}

pub fn positions(entries: &[OrderedEntry]) -> Vec<i64> {
    entries.iter().map(|entry| entry.position).collect()
}
