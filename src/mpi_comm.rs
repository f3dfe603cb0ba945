use mpi::topology::SimpleCommunicator;
use mpi::traits::{Communicator, Destination, Equivalence, Root, Source};

use crate::comm::PipelineComm;
use crate::error::SortError;

/// MPI-backed transport. All point-to-point traffic travels on the
/// default tag, so messages between a fixed rank pair arrive in
/// program order.
pub struct MpiComm {
    world: SimpleCommunicator,
}

impl MpiComm {
    pub fn new(world: SimpleCommunicator) -> Self {
        MpiComm { world }
    }
}

impl PipelineComm for MpiComm {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn nprocs(&self) -> usize {
        self.world.size() as usize
    }

    fn send(&mut self, peer: usize, buf: &[i32]) -> Result<(), SortError> {
        self.world.process_at_rank(peer as i32).send(buf);
        Ok(())
    }

    fn recv_into(&mut self, peer: usize, buf: &mut [i32]) -> Result<(), SortError> {
        let status = self.world.process_at_rank(peer as i32).receive_into(buf);
        let got = status.count(i32::equivalent_datatype()) as usize;
        if got != buf.len() {
            return Err(SortError::ShortMessage {
                rank: self.rank(),
                peer,
                expected: buf.len(),
                got,
            });
        }
        Ok(())
    }

    fn probe(&mut self, peer: usize) -> Result<usize, SortError> {
        let status = self.world.process_at_rank(peer as i32).probe();
        Ok(status.count(i32::equivalent_datatype()) as usize)
    }

    fn broadcast(&mut self, root: usize, flag: &mut u8) -> Result<(), SortError> {
        self.world
            .process_at_rank(root as i32)
            .broadcast_into(flag);
        Ok(())
    }
}
