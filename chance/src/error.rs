#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Empty range: {min}..{max}")]
    InvalidRange { min: i32, max: i32 },
    #[error("Found {items} items but {weights} weights")]
    LengthMismatch { items: usize, weights: usize },
    #[error("Cannot pick from an empty collection")]
    EmptyCollection,
    #[error("Total weight exceeds {}", i32::MAX)]
    WeightOverflow,
    #[error("Collection too large to sample: {0} elements")]
    TooLarge(usize),
}
