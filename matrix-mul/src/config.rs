//! Run configuration.

use std::env;

use matmul_comm::ConnectOptions;

use crate::Error;

/// Minimum left-hand rows per participant accepted by the coordinator.
pub const DEFAULT_MIN_ROWS_PER_PARTICIPANT: usize = 10;

/// Overrides [`Config::min_rows_per_participant`] when set.
pub const MIN_ROWS_ENV: &str = "MATRIX_MUL_MIN_ROWS";

#[derive(Debug, Clone)]
pub struct Config {
    /// The coordinator refuses a multiply unless the left-hand matrix has at
    /// least this many rows per participant.
    pub min_rows_per_participant: usize,
    /// Peer connection policy for TCP groups.
    pub connect: ConnectOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_rows_per_participant: DEFAULT_MIN_ROWS_PER_PARTICIPANT,
            connect: ConnectOptions::default(),
        }
    }
}

impl Config {
    /// Defaults, overridden by [`MIN_ROWS_ENV`] if present.
    pub fn from_env() -> Result<Self, Error> {
        let config = Self::default();
        match env::var(MIN_ROWS_ENV) {
            Ok(value) => {
                let rows = value.trim().parse().map_err(|_| {
                    Error::Config(format!("{} must be a row count, got {:?}", MIN_ROWS_ENV, value))
                })?;
                Ok(config.with_min_rows_per_participant(rows))
            }
            Err(_) => Ok(config),
        }
    }

    pub fn with_min_rows_per_participant(mut self, rows: usize) -> Self {
        self.min_rows_per_participant = rows;
        self
    }

    pub fn with_connect_options(mut self, connect: ConnectOptions) -> Self {
        self.connect = connect;
        self
    }
}
