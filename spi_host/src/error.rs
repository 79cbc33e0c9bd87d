use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("invalid bus timing: {0}")]
    Timing(#[from] spi_core::StimulusError),

    #[error("transaction file '{0}' has no transactions")]
    Empty(String),

    // rendered rhdl report
    #[error("simulation failed:\n{0}")]
    Simulation(String),
}

pub type Result<T> = std::result::Result<T, HostError>;
