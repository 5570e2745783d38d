//! Rank 0: validates, dispatches, computes the residual and gathers.

use std::time::Instant;

use matmul_comm::{ROOT, Transport};
use matmul_types::{Matrix, ShapeMessage, tag};
use tracing::{debug, info};

use crate::error::{AtStep, Step};
use crate::partition::{Plan, partition};
use crate::{Config, Error, kernel};

/// Checks the inputs against the group size and partitions the rows.
///
/// Everything rejected here is rejected before any message is sent.
pub fn plan(lhs: &Matrix, rhs: &Matrix, participants: usize, config: &Config) -> Result<Plan, Error> {
    if lhs.cols() != rhs.rows() {
        return Err(Error::ShapeMismatch(
            lhs.rows(),
            lhs.cols(),
            rhs.rows(),
            rhs.cols(),
        ));
    }

    let required = config.min_rows_per_participant.saturating_mul(participants);
    if lhs.rows() < required {
        return Err(Error::MatrixTooSmall {
            rows: lhs.rows(),
            participants,
            required,
        });
    }

    partition(lhs.rows(), participants)
}

/// Drives one distributed multiply from rank 0.
///
/// The coordinator owns both inputs. Workers get a [`ShapeMessage`] and
/// their slice of the left-hand rows; the right-hand matrix is broadcast
/// once to everyone. Rows left over after the even split are computed here,
/// then each worker's block is gathered in rank order.
pub struct Coordinator<'a, T> {
    transport: &'a T,
    config: &'a Config,
}

impl<'a, T: Transport> Coordinator<'a, T> {
    pub fn new(transport: &'a T, config: &'a Config) -> Self {
        Self { transport, config }
    }

    pub fn plan(&self, lhs: &Matrix, rhs: &Matrix) -> Result<Plan, Error> {
        plan(lhs, rhs, self.transport.size(), self.config)
    }

    /// Computes `lhs * rhs` across the group and returns the full product.
    pub async fn multiply(&self, lhs: &Matrix, rhs: &Matrix) -> Result<Matrix, Error> {
        if self.transport.rank() != ROOT {
            return Err(Error::WrongRole(self.transport.rank(), "coordinator"));
        }

        let started = Instant::now();
        let plan = self.plan(lhs, rhs)?;
        debug!(
            rows = lhs.rows(),
            shared = lhs.cols(),
            columns = rhs.cols(),
            participants = plan.participants(),
            rows_per_worker = plan.rows_per_worker(),
            residual = plan.residual().row_count,
            "partitioned"
        );

        let mut result = Matrix::zeros(lhs.rows(), rhs.cols());
        self.dispatch(&plan, lhs, rhs).await?;
        self.compute_residual(&plan, lhs, rhs, &mut result)?;
        self.gather(&plan, &mut result).await?;

        info!(
            rows = result.rows(),
            columns = result.cols(),
            participants = plan.participants(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "multiply complete"
        );
        Ok(result)
    }

    async fn dispatch(&self, plan: &Plan, lhs: &Matrix, rhs: &Matrix) -> Result<(), Error> {
        for assignment in plan.workers() {
            let shape = ShapeMessage::new(assignment.row_count, lhs.cols(), rhs.cols());
            let block = lhs.row_block(assignment.row_offset, assignment.row_count)?;

            self.transport
                .send(assignment.rank, tag::shape(assignment.rank), shape.to_wire()?)
                .await
                .at(Step::Dispatch)?;
            self.transport
                .send(assignment.rank, tag::block(assignment.rank), block.to_vec())
                .await
                .at(Step::Dispatch)?;
            debug!(
                worker = assignment.rank,
                offset = assignment.row_offset,
                rows = assignment.row_count,
                "dispatched block"
            );
        }

        let mut shared = rhs.as_slice().to_vec();
        self.transport
            .broadcast(ROOT, &mut shared)
            .await
            .at(Step::Broadcast)?;
        debug!(len = shared.len(), "broadcast right-hand matrix");
        Ok(())
    }

    fn compute_residual(
        &self,
        plan: &Plan,
        lhs: &Matrix,
        rhs: &Matrix,
        result: &mut Matrix,
    ) -> Result<(), Error> {
        let residual = plan.residual();
        if residual.is_empty() {
            return Ok(());
        }

        let shape = ShapeMessage::new(residual.row_count, lhs.cols(), rhs.cols());
        let block = lhs.row_block(residual.row_offset, residual.row_count)?;
        let out = result.row_block_mut(residual.row_offset, residual.row_count)?;
        kernel::multiply_into(out, block, rhs.as_slice(), shape)?;
        debug!(
            offset = residual.row_offset,
            rows = residual.row_count,
            "computed residual"
        );
        Ok(())
    }

    async fn gather(&self, plan: &Plan, result: &mut Matrix) -> Result<(), Error> {
        let participants = self.transport.size();
        let columns = result.cols();
        for assignment in plan.workers() {
            let partial = self
                .transport
                .recv(
                    assignment.rank,
                    tag::result(participants, assignment.rank),
                    assignment.row_count * columns,
                )
                .await
                .at(Step::Gather)?;
            result
                .row_block_mut(assignment.row_offset, assignment.row_count)?
                .copy_from_slice(&partial);
            debug!(worker = assignment.rank, "gathered block");
        }
        Ok(())
    }
}
