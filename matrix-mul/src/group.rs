//! Runs participants and tears the group down on fatal faults.

use std::collections::HashMap;
use std::sync::Arc;

use matmul_comm::{LocalGroup, ROOT, Transport};
use matmul_types::Matrix;
use tokio::task::JoinSet;
use tracing::{error, warn};

use crate::coordinator::{Coordinator, plan};
use crate::worker::{Worker, WorkerReport};
use crate::{Config, Error};

/// What one participant produced.
#[derive(Debug)]
pub enum Outcome {
    /// The coordinator's assembled product.
    Product(Matrix),
    Worked(WorkerReport),
}

/// Runs the coordinator on rank 0 and a worker everywhere else.
///
/// `inputs` are only read on rank 0. On a fatal error the whole group is
/// aborted before the error is returned, so no peer is left waiting.
pub async fn run_participant<T: Transport>(
    transport: &T,
    inputs: Option<(&Matrix, &Matrix)>,
    config: &Config,
) -> Result<Outcome, Error> {
    let rank = transport.rank();
    let outcome = if rank == ROOT {
        match inputs {
            Some((lhs, rhs)) => Coordinator::new(transport, config)
                .multiply(lhs, rhs)
                .await
                .map(Outcome::Product),
            None => Err(Error::Usage("the coordinator needs both input matrices".into())),
        }
    } else {
        Worker::new(transport).run().await.map(Outcome::Worked)
    };

    if let Err(e) = &outcome {
        if e.is_fatal() {
            error!(rank, error = %e, "fatal fault, aborting participant group");
            transport.abort(e.exit_code()).await;
        }
    }
    outcome
}

/// Runs one multiply with every rank in this process.
pub async fn run_local(
    lhs: Matrix,
    rhs: Matrix,
    participants: usize,
    config: &Config,
) -> Result<Matrix, Error> {
    run_group(LocalGroup::new(participants), lhs, rhs, config).await
}

/// Runs one multiply over an already connected group, one task per rank.
///
/// Input checks happen before any task starts. If a participant fails, the
/// error of the participant that detected the fault is returned rather than
/// the abort notices its peers observed afterwards.
pub async fn run_group<T>(
    transports: Vec<T>,
    lhs: Matrix,
    rhs: Matrix,
    config: &Config,
) -> Result<Matrix, Error>
where
    T: Transport + 'static,
{
    plan(&lhs, &rhs, transports.len(), config)?;

    let inputs = Arc::new((lhs, rhs));
    let mut tasks = JoinSet::new();
    let mut ranks = HashMap::new();
    for transport in transports {
        let rank = transport.rank();
        let inputs = Arc::clone(&inputs);
        let config = config.clone();
        let handle = tasks.spawn(async move {
            let (lhs, rhs) = (&inputs.0, &inputs.1);
            (rank, run_participant(&transport, Some((lhs, rhs)), &config).await)
        });
        ranks.insert(handle.id(), rank);
    }

    let mut product = None;
    let mut failure: Option<Error> = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(Outcome::Product(matrix)))) => product = Some(matrix),
            Ok((_, Ok(Outcome::Worked(_)))) => {}
            Ok((rank, Err(e))) => {
                if !e.is_fatal() {
                    // nobody aborted the group, so peers may still be waiting
                    tasks.abort_all();
                }
                warn!(rank, error = %e, "participant failed");
                failure = Some(match failure {
                    Some(first) if !first.is_abort_notice() || e.is_abort_notice() => first,
                    _ => e,
                });
            }
            Err(join_error) if join_error.is_cancelled() => {}
            Err(join_error) => {
                tasks.abort_all();
                let rank = ranks.get(&join_error.id()).copied().unwrap_or(ROOT);
                failure = Some(Error::Participant {
                    rank,
                    reason: join_error.to_string(),
                });
            }
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }
    product.ok_or_else(|| Error::Participant {
        rank: ROOT,
        reason: "coordinator produced no result".into(),
    })
}
