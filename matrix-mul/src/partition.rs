//! Splits the left-hand rows between the coordinator and its workers.

use matmul_types::WorkAssignment;

use crate::Error;

/// One [`WorkAssignment`] per rank, indexed by rank.
///
/// Workers `1..participants` hold equal contiguous blocks starting at row 0,
/// in rank order. Rank 0 holds the residual: whatever rows remain at the
/// tail, possibly none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    rows_per_worker: usize,
    assignments: Vec<WorkAssignment>,
}

impl Plan {
    pub fn rows_per_worker(&self) -> usize {
        self.rows_per_worker
    }

    pub fn participants(&self) -> usize {
        self.assignments.len()
    }

    /// All assignments, rank 0 first.
    pub fn assignments(&self) -> &[WorkAssignment] {
        &self.assignments
    }

    /// The coordinator's own rows.
    pub fn residual(&self) -> &WorkAssignment {
        &self.assignments[0]
    }

    pub fn workers(&self) -> &[WorkAssignment] {
        &self.assignments[1..]
    }
}

/// Partitions `total_rows` across `participants` ranks.
///
/// With a single participant the coordinator keeps every row.
pub fn partition(total_rows: usize, participants: usize) -> Result<Plan, Error> {
    let invalid = Error::InvalidPartition {
        total_rows,
        participants,
    };
    let workers = match participants.checked_sub(1) {
        Some(workers) if total_rows >= workers => workers,
        _ => return Err(invalid),
    };

    let rows_per_worker = if workers == 0 { 0 } else { total_rows / workers };

    let mut assignments = Vec::with_capacity(participants);
    let assigned = rows_per_worker * workers;
    assignments.push(WorkAssignment {
        rank: 0,
        row_offset: assigned,
        row_count: total_rows - assigned,
    });
    assignments.extend((1..participants).map(|rank| WorkAssignment {
        rank,
        row_offset: (rank - 1) * rows_per_worker,
        row_count: rows_per_worker,
    }));

    Ok(Plan {
        rows_per_worker,
        assignments,
    })
}
