//! Seedable random sources.
//!
//! [`RandomSource`] is the contract every consumer codes against; [`SeededSource`] is the
//! shipped implementation. A source can spawn children whose streams are independent of the
//! parent's subsequent draws, which keeps one subsystem's consumption from disturbing another.

mod error;
mod seed;
mod seeded;
mod source;

pub use error::Error;
pub use seed::{hash_text, RawSeed};
pub use seeded::SeededSource;
pub use source::{Odds, RandomSource, Variants};

pub type Result<T, E = Error> = std::result::Result<T, E>;
