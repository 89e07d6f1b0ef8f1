use thiserror::Error;

#[derive(Error, Debug)]
pub enum BeamtraceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Frame number {number} outside source range {first}..={last}")]
    FrameOutOfRange {
        number: usize,
        first: usize,
        last: usize,
    },

    #[error("No frames above dark threshold {threshold} in range {first}..={last}")]
    NoValidFrames {
        threshold: f64,
        first: usize,
        last: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, BeamtraceError>;
