//! Error types for matrix-mul operations.

use std::fmt;

use matmul_types::Rank;
use thiserror::Error;

/// Protocol step during which a transport fault was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Connect,
    Dispatch,
    AwaitShape,
    AwaitBlock,
    Broadcast,
    SendResult,
    Gather,
}

impl Step {
    /// Process exit code reported when a fault at this step aborts the group.
    pub fn exit_code(self) -> i32 {
        match self {
            Step::AwaitShape => 1,
            Step::AwaitBlock => 2,
            Step::Broadcast => 3,
            Step::Gather => 5,
            Step::Dispatch => 6,
            Step::SendResult => 7,
            Step::Connect => 13,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Connect => "joining the participant group",
            Step::Dispatch => "dispatching blocks",
            Step::AwaitShape => "awaiting shape",
            Step::AwaitBlock => "awaiting row block",
            Step::Broadcast => "broadcasting right-hand matrix",
            Step::SendResult => "sending result",
            Step::Gather => "gathering results",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport fault while {step}: {source}")]
    TransportFault {
        step: Step,
        #[source]
        source: matmul_comm::Error,
    },

    #[error("protocol violation: {0}")]
    Protocol(#[from] matmul_types::Error),

    #[error("matrix dimension mismatch: A is {0}x{1}, B is {2}x{3}")]
    ShapeMismatch(usize, usize, usize, usize),

    #[error("matrix is too small: {rows} rows for {participants} participants, need at least {required}")]
    MatrixTooSmall {
        rows: usize,
        participants: usize,
        required: usize,
    },

    #[error("cannot partition {total_rows} rows across {participants} participants")]
    InvalidPartition {
        total_rows: usize,
        participants: usize,
    },

    #[error("rank {0} cannot act as {1}")]
    WrongRole(Rank, &'static str),

    #[error("participant {rank} did not finish: {reason}")]
    Participant { rank: Rank, reason: String },

    #[error("matrix file error at byte {offset}: {message}")]
    MatrixFile { offset: usize, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("usage: {0}")]
    Usage(String),
}

impl Error {
    /// Fatal errors leave peers waiting on messages that will never come,
    /// so the whole group has to be torn down.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::TransportFault { .. } | Error::Protocol(_) | Error::Participant { .. }
        )
    }

    /// Returns `true` if this participant only failed because another one
    /// aborted the group first.
    pub fn is_abort_notice(&self) -> bool {
        matches!(
            self,
            Error::TransportFault {
                source: matmul_comm::Error::Aborted { .. },
                ..
            }
        )
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Error::TransportFault { step, .. } => step.exit_code(),
            Error::MatrixTooSmall { .. } => 4,
            Error::Protocol(_) => 8,
            Error::ShapeMismatch(..) => 9,
            Error::InvalidPartition { .. } => 10,
            Error::WrongRole(..) | Error::Participant { .. } => 11,
            Error::MatrixFile { .. } | Error::Io(_) => 12,
            Error::Config(_) | Error::Usage(_) => 64,
        }
    }
}

/// Tags a transport result with the protocol step it belongs to.
pub trait AtStep<T> {
    fn at(self, step: Step) -> Result<T, Error>;
}

impl<T> AtStep<T> for Result<T, matmul_comm::Error> {
    fn at(self, step: Step) -> Result<T, Error> {
        self.map_err(|source| Error::TransportFault { step, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatality() {
        let fault: Result<(), _> = Err(matmul_comm::Error::Disconnected(2));
        let fault = fault.at(Step::Gather).unwrap_err();
        assert!(fault.is_fatal());
        assert!(!fault.is_abort_notice());
        assert_eq!(fault.exit_code(), 5);

        let small = Error::MatrixTooSmall {
            rows: 4,
            participants: 2,
            required: 20,
        };
        assert!(!small.is_fatal());
        assert_eq!(small.exit_code(), 4);
        assert!(!Error::ShapeMismatch(2, 3, 4, 5).is_fatal());
    }

    #[test]
    fn abort_notice() {
        let notice: Result<(), _> = Err(matmul_comm::Error::Aborted { code: 5 });
        assert!(notice.at(Step::AwaitShape).unwrap_err().is_abort_notice());
    }
}
