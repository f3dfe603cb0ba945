//! Transport seam between the protocol and the message-passing
//! runtime.
//!
//! The round driver only ever talks to a [`PipelineComm`]. The MPI
//! binding lives behind the `mpi` feature; [`MemoryComm`] wires a set
//! of logical ranks together with channels inside one address space so
//! the whole protocol can run under `cargo test`.

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use crate::error::SortError;

/// The five message primitives the protocol needs.
///
/// Sends to a fixed peer are delivered in program order, the "single
/// tag" guarantee every phase relies on. Sends may be buffered; a
/// matching receive is always eventually posted by the peer.
pub trait PipelineComm {
    fn rank(&self) -> usize;
    fn nprocs(&self) -> usize;

    /// Ship `buf` to `peer`.
    fn send(&mut self, peer: usize, buf: &[i32]) -> Result<(), SortError>;

    /// Block until the next message from `peer` arrives and fill `buf`
    /// with it. The message must carry exactly `buf.len()` elements.
    fn recv_into(&mut self, peer: usize, buf: &mut [i32]) -> Result<(), SortError>;

    /// Element count of the next pending message from `peer`, without
    /// consuming it.
    fn probe(&mut self, peer: usize) -> Result<usize, SortError>;

    /// One-to-all broadcast. On the root, `flag` is the value sent;
    /// everywhere else it is overwritten with the root's value.
    fn broadcast(&mut self, root: usize, flag: &mut u8) -> Result<(), SortError>;
}

/// Channel-backed transport for logical ranks sharing one process.
///
/// Each ordered rank pair gets its own unbounded channel, which gives
/// the per-pair FIFO ordering of the trait contract. Broadcast is a
/// fan-out from the root over the same links, so it interleaves with
/// point-to-point traffic exactly like single-tag MPI does.
pub struct MemoryComm {
    rank: usize,
    nprocs: usize,
    tx: Vec<Option<Sender<Vec<i32>>>>,
    rx: Vec<Option<Receiver<Vec<i32>>>>,
    /// Messages pulled off a link by `probe` but not yet consumed.
    pending: Vec<VecDeque<Vec<i32>>>,
}

impl MemoryComm {
    /// Build a fully connected mesh of `nprocs` transports, one per
    /// logical rank.
    pub fn mesh(nprocs: usize) -> Vec<MemoryComm> {
        let mut comms: Vec<MemoryComm> = (0..nprocs)
            .map(|rank| MemoryComm {
                rank,
                nprocs,
                tx: (0..nprocs).map(|_| None).collect(),
                rx: (0..nprocs).map(|_| None).collect(),
                pending: (0..nprocs).map(|_| VecDeque::new()).collect(),
            })
            .collect();

        for from in 0..nprocs {
            for to in 0..nprocs {
                if from != to {
                    let (tx, rx) = channel();
                    comms[from].tx[to] = Some(tx);
                    comms[to].rx[from] = Some(rx);
                }
            }
        }
        comms
    }

    fn link_down(&self, peer: usize) -> SortError {
        SortError::Disconnected {
            rank: self.rank,
            peer,
        }
    }

    /// Next message from `peer`, honouring anything already probed.
    fn take(&mut self, peer: usize) -> Result<Vec<i32>, SortError> {
        if let Some(msg) = self.pending[peer].pop_front() {
            return Ok(msg);
        }
        let rx = self.rx[peer].as_ref().ok_or_else(|| self.link_down(peer))?;
        rx.recv().map_err(|_| self.link_down(peer))
    }
}

impl PipelineComm for MemoryComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn nprocs(&self) -> usize {
        self.nprocs
    }

    fn send(&mut self, peer: usize, buf: &[i32]) -> Result<(), SortError> {
        let tx = self.tx[peer].as_ref().ok_or_else(|| self.link_down(peer))?;
        tx.send(buf.to_vec()).map_err(|_| self.link_down(peer))
    }

    fn recv_into(&mut self, peer: usize, buf: &mut [i32]) -> Result<(), SortError> {
        let msg = self.take(peer)?;
        if msg.len() != buf.len() {
            return Err(SortError::ShortMessage {
                rank: self.rank,
                peer,
                expected: buf.len(),
                got: msg.len(),
            });
        }
        buf.copy_from_slice(&msg);
        Ok(())
    }

    fn probe(&mut self, peer: usize) -> Result<usize, SortError> {
        if self.pending[peer].is_empty() {
            let rx = self.rx[peer].as_ref().ok_or_else(|| self.link_down(peer))?;
            let msg = rx.recv().map_err(|_| self.link_down(peer))?;
            self.pending[peer].push_back(msg);
        }
        Ok(self.pending[peer].front().map(|m| m.len()).unwrap_or(0))
    }

    fn broadcast(&mut self, root: usize, flag: &mut u8) -> Result<(), SortError> {
        if self.rank == root {
            let msg = [*flag as i32];
            for peer in 0..self.nprocs {
                if peer != self.rank {
                    self.send(peer, &msg)?;
                }
            }
        } else {
            let mut msg = [0i32];
            self.recv_into(root, &mut msg)?;
            *flag = msg[0] as u8;
        }
        Ok(())
    }
}

/// Run one closure per logical rank on its own thread and collect the
/// results in rank order. Panics in a rank propagate, so assertion
/// failures inside a rank fail the caller's test.
pub fn run_local<T, F>(nprocs: usize, f: F) -> Vec<T>
where
    F: Fn(MemoryComm) -> T + Sync,
    T: Send,
{
    let comms = MemoryComm::mesh(nprocs);
    thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let f = &f;
                scope.spawn(move || f(comm))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("rank thread panicked"))
            .collect()
    })
}
