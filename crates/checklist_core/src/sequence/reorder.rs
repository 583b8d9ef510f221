//! Pure reorder computations over in-memory sequences.
//!
//! # Responsibility
//! - Relocate one entry and renumber the whole sequence.
//! - Produce the full `(id, position)` assignment list to persist.
//!
//! # Invariants
//! - Input slices are in display order (ascending `position`).
//! - After a move or compaction, positions are exactly `0..len`.
//! - Invalid indices are rejected, never clamped.

use crate::model::entry::{EntryId, OrderedEntry};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Precondition violations for reorder requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderError {
    /// Index is not inside `0..len`.
    IndexOutOfRange { index: usize, len: usize },
    /// Signed index below zero.
    NegativeIndex(i64),
    /// The same entry appears twice in one assignment list.
    DuplicateAssignment(EntryId),
    /// An assigned position is below zero.
    NegativePosition { entry_id: EntryId, position: i64 },
    /// An assigned entry would share its position with another entry.
    DuplicatePosition { entry_id: EntryId, position: i64 },
}

impl Display for ReorderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for sequence of length {len}")
            }
            Self::NegativeIndex(index) => write!(f, "index must not be negative, got {index}"),
            Self::DuplicateAssignment(entry_id) => {
                write!(f, "entry {entry_id} is assigned more than once")
            }
            Self::NegativePosition { entry_id, position } => write!(
                f,
                "position must not be negative, got {position} for entry {entry_id}"
            ),
            Self::DuplicatePosition { entry_id, position } => write!(
                f,
                "position {position} of entry {entry_id} is already taken"
            ),
        }
    }
}

impl Error for ReorderError {}

/// One persisted position the caller should write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub entry_id: EntryId,
    pub position: i64,
}

/// Result of a reorder computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderOutcome {
    /// New sequence in display order.
    pub entries: Vec<OrderedEntry>,
    /// Position of every entry, unchanged ones included. Empty for no-ops.
    pub assignments: Vec<Assignment>,
}

impl ReorderOutcome {
    pub fn is_noop(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Move request expressed as display indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveInstruction {
    pub source: usize,
    pub destination: usize,
}

impl MoveInstruction {
    pub fn new(source: usize, destination: usize) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Builds an instruction from signed UI indices.
    ///
    /// # Errors
    /// - `NegativeIndex` when either index is below zero.
    pub fn from_signed(source: i64, destination: i64) -> Result<Self, ReorderError> {
        Ok(Self {
            source: non_negative(source)?,
            destination: non_negative(destination)?,
        })
    }

    /// Checks both indices against a sequence length.
    pub fn validate(&self, len: usize) -> Result<(), ReorderError> {
        for index in [self.source, self.destination] {
            if index >= len {
                return Err(ReorderError::IndexOutOfRange { index, len });
            }
        }
        Ok(())
    }
}

fn non_negative(index: i64) -> Result<usize, ReorderError> {
    usize::try_from(index).map_err(|_| ReorderError::NegativeIndex(index))
}

/// Moves the entry at `source` to `destination` and renumbers every entry.
///
/// `source == destination` is a no-op: entries come back untouched and no
/// assignments are produced.
///
/// # Errors
/// - `IndexOutOfRange` when either index is `>= entries.len()`.
pub fn move_entry(
    entries: &[OrderedEntry],
    source: usize,
    destination: usize,
) -> Result<ReorderOutcome, ReorderError> {
    MoveInstruction::new(source, destination).validate(entries.len())?;

    if source == destination {
        return Ok(ReorderOutcome {
            entries: entries.to_vec(),
            assignments: Vec::new(),
        });
    }

    let mut reordered = entries.to_vec();
    let moved = reordered.remove(source);
    reordered.insert(destination, moved);
    Ok(renumber(reordered))
}

/// Renumbers entries to `0..len` keeping their current order.
///
/// Used to close gaps left by deletions.
pub fn compact_positions(entries: &[OrderedEntry]) -> ReorderOutcome {
    renumber(entries.to_vec())
}

/// Applies externally computed assignments and returns the merged sequence
/// in display order.
///
/// Entries without an assignment keep their position. Assignments naming an
/// id outside `entries` are ignored; callers reject those first.
///
/// # Errors
/// - `DuplicateAssignment` when one id is assigned twice.
/// - `NegativePosition` when an assigned position is below zero.
/// - `DuplicatePosition` when an assigned entry ends up sharing a position.
///   Ties that existed before and involve no assigned entry are left alone.
pub fn merge_assignments(
    entries: &[OrderedEntry],
    assignments: &[Assignment],
) -> Result<Vec<OrderedEntry>, ReorderError> {
    let mut targets: HashMap<EntryId, i64> = HashMap::with_capacity(assignments.len());
    for assignment in assignments {
        if assignment.position < 0 {
            return Err(ReorderError::NegativePosition {
                entry_id: assignment.entry_id,
                position: assignment.position,
            });
        }
        if targets
            .insert(assignment.entry_id, assignment.position)
            .is_some()
        {
            return Err(ReorderError::DuplicateAssignment(assignment.entry_id));
        }
    }

    let mut merged = entries.to_vec();
    for entry in &mut merged {
        if let Some(position) = targets.get(&entry.id) {
            entry.position = *position;
        }
    }
    sort_for_display(&mut merged);

    for pair in merged.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        if left.position != right.position {
            continue;
        }
        if let Some(assigned) = [left, right]
            .into_iter()
            .find(|entry| targets.contains_key(&entry.id))
        {
            return Err(ReorderError::DuplicatePosition {
                entry_id: assigned.id,
                position: assigned.position,
            });
        }
    }
    Ok(merged)
}

/// Sorts entries into display order.
///
/// The sort is stable, so equal positions keep their incoming order (store
/// reads already break ties by creation time).
pub fn sort_for_display(entries: &mut [OrderedEntry]) {
    entries.sort_by_key(|entry| entry.position);
}

fn renumber(mut entries: Vec<OrderedEntry>) -> ReorderOutcome {
    let mut assignments = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.position = index as i64;
        assignments.push(Assignment {
            entry_id: entry.id,
            position: entry.position,
        });
    }
    ReorderOutcome {
        entries,
        assignments,
    }
}
