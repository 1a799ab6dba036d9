//! Reconciliation of imported candidates against the stored snapshot.
//!
//! Pure logic, no I/O: a candidate is "existing" when the snapshot holds a
//! configuration with the same id, otherwise it is "new". Names and payloads
//! are not compared.

use crate::model::configuration::id_set;
use crate::model::Configuration;

/// Candidates split by whether their id is already stored.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Candidates whose id is not in the snapshot.
    pub new: Vec<Configuration>,
    /// Candidates whose id is already in the snapshot.
    pub existing: Vec<Configuration>,
}

/// Partition `candidates` against `snapshot` by id.
///
/// Candidate order is preserved within each partition.
#[must_use]
pub fn classify(candidates: Vec<Configuration>, snapshot: &[Configuration]) -> Reconciliation {
    let stored = id_set(snapshot);
    let (existing, new): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|candidate| stored.contains(&candidate.id));

    Reconciliation { new, existing }
}
