use std::num::ParseIntError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Unable to parse expression: {0}")]
    BadExpression(String),
    #[error("Bad integer: {0}; {1}")]
    BadInteger(String, ParseIntError),
    #[error("Unknown roll type: {0}")]
    UnknownRollType(char),
    #[error("Expression needs at least one die of at least one side: {0}")]
    NonPositive(String),
    #[error("Expression total does not fit in 32 bits: {0}")]
    Overflow(String),
    #[error(transparent)]
    Source(#[from] chance::Error),
}
