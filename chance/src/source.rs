use tracing::{debug, trace};

use crate::{Error, RawSeed, Result};

/// A value paired with its relative weight for [`RandomSource::pick_weighted_pairs`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Odds<T> {
    pub value: T,
    pub weight: u32,
}

impl<T> Odds<T> {
    pub fn new(value: T, weight: u32) -> Self {
        Self { value, weight }
    }
}

impl<T> From<(T, u32)> for Odds<T> {
    fn from((value, weight): (T, u32)) -> Self {
        Odds { value, weight }
    }
}

/// A type with a fixed, statically known set of values, usually a fieldless enum.
pub trait Variants: Sized + 'static {
    const ALL: &'static [Self];
}

/// A seedable stream of random values.
///
/// Implementors supply the two primitives (`next_int` and `next_f64`) along with seed
/// introspection; every sampling helper is written in terms of those. A source is stateful:
/// each draw advances it, and the order of calls is part of what makes a run reproducible.
///
/// Sources are not synchronized. To hand independent streams to other threads, derive the
/// children on one thread with [`derive_child`](RandomSource::derive_child) and move them.
pub trait RandomSource {
    /// The integer seed actually fed to the generator.
    fn seed(&self) -> i64;

    /// The seed as originally supplied.
    fn raw_seed(&self) -> &RawSeed;

    /// Uniform integer in `[min, max)`.
    ///
    /// Fails with [`Error::InvalidRange`] if `max <= min`.
    fn next_int(&mut self, min: i32, max: i32) -> Result<i32>;

    /// Uniform float in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Creates a fresh source of the same kind.
    fn from_raw_seed(seed: RawSeed) -> Self
    where
        Self: Sized;

    fn next_below(&mut self, max: i32) -> Result<i32> {
        self.next_int(0, max)
    }

    /// Uniform float in `[min, max)`.
    fn next_float(&mut self, min: f64, max: f64) -> f64 {
        self.next_f64() * (max - min) + min
    }

    fn next_bool(&mut self) -> Result<bool> {
        self.with_odds(1, 2)
    }

    /// True `chance` times out of `out_of`.
    ///
    /// A `chance` of zero or less is never true and one of `out_of` or more is always true;
    /// either way a value is drawn. `out_of` must be positive.
    fn with_odds(&mut self, chance: i32, out_of: i32) -> Result<bool> {
        Ok(self.next_int(0, out_of)? < chance)
    }

    /// True with probability `p`, where `p` is a fraction in `[0, 1]`.
    fn with_percent_chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T> {
        if items.is_empty() {
            return Err(Error::EmptyCollection);
        }

        let index = self.next_below(draw_bound(items.len())?)?;
        Ok(&items[index as usize])
    }

    /// Picks one item, favoring those with higher weights.
    ///
    /// `items` and `weights` are parallel slices. Items with zero weight are never chosen
    /// unless every weight is zero, in which case the first item is returned without drawing.
    /// An empty slice yields `None`.
    fn pick_weighted<'a, T>(&mut self, items: &'a [T], weights: &[u32]) -> Result<Option<&'a T>> {
        if items.len() != weights.len() {
            return Err(Error::LengthMismatch {
                items: items.len(),
                weights: weights.len(),
            });
        }

        let index = weighted_index(self, weights.iter().copied())?;
        Ok(index.map(|index| &items[index]))
    }

    /// As [`pick_weighted`](RandomSource::pick_weighted), over value/weight pairs.
    fn pick_weighted_pairs<'a, T>(&mut self, pairs: &'a [Odds<T>]) -> Result<Option<&'a T>> {
        let index = weighted_index(self, pairs.iter().map(|pair| pair.weight))?;
        Ok(index.map(|index| &pairs[index].value))
    }

    /// Selects up to `amount` items from distinct positions in a single pass, preserving
    /// their relative order.
    ///
    /// Each item is kept with probability `(amount - kept) / remaining`, so every subset of
    /// positions is equally likely. Equal values at different positions may both be kept.
    /// When `amount` covers the whole input, everything is returned and nothing is drawn.
    fn pick_distinct<I>(&mut self, items: I, amount: usize) -> Result<Vec<I::Item>>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        let total = items.len();

        if amount >= total {
            return Ok(items.collect());
        }

        let mut selected = Vec::with_capacity(amount);
        for (index, item) in items.enumerate() {
            if selected.len() == amount {
                break;
            }

            let needed = draw_bound(amount - selected.len())?;
            let remaining = draw_bound(total - index)?;
            if self.with_odds(needed, remaining)? {
                selected.push(item);
            }
        }

        Ok(selected)
    }

    fn pick_variant<T: Variants>(&mut self) -> Result<&'static T> {
        self.pick(T::ALL)
    }

    /// Fisher-Yates shuffle.
    fn shuffle<T>(&mut self, items: &mut [T]) -> Result<()> {
        for i in (1..items.len()).rev() {
            let j = self.next_below(draw_bound(i + 1)?)?;
            items.swap(i, j as usize);
        }
        Ok(())
    }

    /// Creates an independent source seeded from this one.
    ///
    /// Derivation consumes exactly one draw from `self`, so interleaving it with other draws
    /// changes everything downstream. Children are reproduced only by repeating the same
    /// sequence of calls on an identically seeded parent.
    fn derive_child(&mut self) -> Result<Self>
    where
        Self: Sized,
    {
        let seed = self.next_int(0, i32::MAX)?;
        debug!(parent = self.seed(), child = seed, "derived child source");
        Ok(Self::from_raw_seed(RawSeed::Integer(seed.into())))
    }
}

fn draw_bound(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::TooLarge(len))
}

fn weighted_index<R, I>(source: &mut R, weights: I) -> Result<Option<usize>>
where
    R: RandomSource + ?Sized,
    I: Iterator<Item = u32> + Clone,
{
    let mut total = 0i32;
    let mut len = 0;
    for weight in weights.clone() {
        total = i32::try_from(weight)
            .ok()
            .and_then(|weight| total.checked_add(weight))
            .ok_or(Error::WeightOverflow)?;
        len += 1;
    }

    if len == 0 {
        return Ok(None);
    }

    if total < 1 {
        trace!(len, "all weights zero; taking first item");
        return Ok(Some(0));
    }

    let n = i64::from(source.next_int(0, total)?);
    let mut cumulative = 0i64;
    for (index, weight) in weights.enumerate() {
        cumulative += i64::from(weight);
        if cumulative > n {
            return Ok(Some(index));
        }
    }

    // n < total, so the scan always returns above.
    Ok(Some(len - 1))
}
