use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("parse error at byte {pos}: {msg}")]
    Parse { msg: String, pos: usize },

    #[error("unknown taxon label '{label}'")]
    UnknownTaxon { label: String },

    #[error("splits {first} and {second} are incompatible")]
    IncompatibleSplits { first: usize, second: usize },

    #[error("invalid split: {reason}")]
    InvalidSplit { reason: &'static str },

    #[error("invalid cycle: {reason}")]
    InvalidCycle { reason: &'static str },

    #[error("split system is empty")]
    EmptySystem,
}

pub type SplitResult<T> = Result<T, SplitError>;
