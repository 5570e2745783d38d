//! Every non-zero rank: multiply one row block and send it back.

use matmul_comm::{ROOT, Transport};
use matmul_types::{Rank, ShapeMessage, tag};
use tracing::debug;

use crate::error::{AtStep, Step};
use crate::{Error, kernel};

/// What a worker did during one multiply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub rank: Rank,
    pub shape: ShapeMessage,
}

pub struct Worker<'a, T> {
    transport: &'a T,
}

impl<'a, T: Transport> Worker<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Receives the shape, the row block and the broadcast right-hand
    /// matrix, multiplies, and returns the result to the coordinator.
    ///
    /// Any receive failure ends the run; nothing is retried.
    pub async fn run(&self) -> Result<WorkerReport, Error> {
        let rank = self.transport.rank();
        if rank == ROOT {
            return Err(Error::WrongRole(rank, "worker"));
        }

        let wire = self
            .transport
            .recv(ROOT, tag::shape(rank), ShapeMessage::WIRE_LEN)
            .await
            .at(Step::AwaitShape)?;
        let shape = ShapeMessage::from_wire(&wire)?;
        debug!(rank, ?shape, "received shape");

        let block = self
            .transport
            .recv(ROOT, tag::block(rank), shape.block_len())
            .await
            .at(Step::AwaitBlock)?;

        let mut rhs = vec![0; shape.rhs_len()];
        self.transport
            .broadcast(ROOT, &mut rhs)
            .await
            .at(Step::Broadcast)?;

        let result = kernel::multiply(&block, &rhs, shape)?;
        self.transport
            .send(ROOT, tag::result(self.transport.size(), rank), result)
            .await
            .at(Step::SendResult)?;
        debug!(rank, rows = shape.rows, "sent result");

        Ok(WorkerReport { rank, shape })
    }
}
