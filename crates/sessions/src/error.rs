use thiserror::Error;

/// Why a reply failed to resolve to an option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("reply is not a number")]
    NotANumber,

    #[error("{got} is not between 1 and {max}")]
    OutOfRange { got: i64, max: usize },
}
