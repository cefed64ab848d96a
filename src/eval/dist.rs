//! Distributed primitives used by the reducer.
//!
//! The reducer never reaches for process-wide state: rank, barrier and
//! gather come from an explicit [`DistributedContext`]. [`SingleProcess`]
//! covers the non-distributed case and [`LocalGroup`] runs several workers
//! as threads of one process.
use super::task::EvaluationRecord;
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, warn};
use std::sync::{Arc, Barrier};

/// Rank of the worker that receives gathered records.
pub const COORDINATOR_RANK: usize = 0;

pub trait DistributedContext: Send {
    fn rank(&self) -> usize;

    fn world_size(&self) -> usize;

    fn is_coordinator(&self) -> bool {
        self.rank() == COORDINATOR_RANK
    }

    /// Blocks until every worker has reached the barrier.
    fn barrier(&self);

    /// Sends `records` to the coordinator. The coordinator receives every
    /// worker's list indexed by rank; other workers get `None`.
    fn gather_to_coordinator(
        &self,
        records: Vec<EvaluationRecord>,
    ) -> Option<Vec<Vec<EvaluationRecord>>>;
}

/// One worker, no synchronization.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcess;

impl DistributedContext for SingleProcess {
    fn rank(&self) -> usize {
        COORDINATOR_RANK
    }

    fn world_size(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn gather_to_coordinator(
        &self,
        records: Vec<EvaluationRecord>,
    ) -> Option<Vec<Vec<EvaluationRecord>>> {
        Some(vec![records])
    }
}

type Parcel = (usize, Vec<EvaluationRecord>);

/// Factory for in-process worker groups.
pub struct LocalGroup;

impl LocalGroup {
    /// Creates `world_size` connected workers, indexed by rank. Each worker
    /// is meant to be moved onto its own thread.
    pub fn spawn(world_size: usize) -> Vec<LocalWorker> {
        let barrier = Arc::new(Barrier::new(world_size.max(1)));
        let (tx, rx) = unbounded::<Parcel>();
        (0..world_size)
            .map(|rank| LocalWorker {
                rank,
                world_size,
                barrier: Arc::clone(&barrier),
                tx: tx.clone(),
                rx: (rank == COORDINATOR_RANK).then(|| rx.clone()),
            })
            .collect()
    }
}

/// One member of a [`LocalGroup`].
pub struct LocalWorker {
    rank: usize,
    world_size: usize,
    barrier: Arc<Barrier>,
    tx: Sender<Parcel>,
    rx: Option<Receiver<Parcel>>,
}

impl DistributedContext for LocalWorker {
    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.world_size
    }

    fn barrier(&self) {
        self.barrier.wait();
    }

    fn gather_to_coordinator(
        &self,
        records: Vec<EvaluationRecord>,
    ) -> Option<Vec<Vec<EvaluationRecord>>> {
        let Some(rx) = &self.rx else {
            if self.tx.send((self.rank, records)).is_err() {
                warn!("LocalWorker {}: coordinator is gone, records dropped", self.rank);
            }
            return None;
        };

        let mut slots: Vec<Option<Vec<EvaluationRecord>>> = vec![None; self.world_size];
        slots[self.rank] = Some(records);
        for _ in 1..self.world_size {
            // Blocks until every worker has sent; a missing worker stalls here.
            let Ok((rank, parcel)) = rx.recv() else {
                warn!("LocalWorker {}: gather channel closed early", self.rank);
                break;
            };
            debug!("LocalWorker {}: received {} record(s) from rank {rank}", self.rank, parcel.len());
            slots[rank] = Some(parcel);
        }
        Some(slots.into_iter().map(Option::unwrap_or_default).collect())
    }
}
