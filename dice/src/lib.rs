use std::{cmp, fmt, str::FromStr};

mod error;
mod result;

use chance::RandomSource;
pub use error::Error;
use once_cell::sync::Lazy;
use regex::Regex;
pub use result::{DiceResult, Highlight, SingleRoll};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use tracing::trace;

pub type Result<T, E = Error> = std::result::Result<T, E>;

static PARSER: Lazy<DiceParser> = Lazy::new(DiceParser::new);

/// Parses expressions of the form `2d20a+5`.
///
/// The grammar is `<count>d<sides>[A|H|D|L][<modifier>]`, case-insensitive, with whitespace
/// ignored. `A` or `H` rolls with advantage, `D` or `L` with disadvantage. The modifier is a
/// signed integer added once to the total.
pub struct DiceParser {
    expression: Regex,
}

impl DiceParser {
    pub fn new() -> Self {
        DiceParser {
            expression: Regex::new(r#"^(\d+)[Dd](\d+)([[:alpha:]])?([+-]\d+)?$"#).unwrap(),
        }
    }

    pub fn parse(&self, expr: &str) -> Result<Dice> {
        let compact: String = expr.split_whitespace().collect();
        let captures = self
            .expression
            .captures(&compact)
            .ok_or_else(|| Error::BadExpression(expr.into()))?;

        let count = parse_integer(&captures[1])?;
        let sides = parse_integer(&captures[2])?;
        let roll_type = match captures.get(3) {
            Some(group) => group
                .as_str()
                .chars()
                .next()
                .map(RollType::from_letter)
                .unwrap_or(Ok(RollType::Standard))?,
            None => RollType::Standard,
        };
        let modifier = match captures.get(4) {
            Some(group) => parse_integer(group.as_str())?,
            None => 0,
        };

        Dice::new(count, sides, roll_type, modifier)
    }

    /// Parses `expr`, falling back to `default` if it is not a valid expression.
    pub fn parse_or(&self, expr: &str, default: Dice) -> Dice {
        self.parse(expr).unwrap_or(default)
    }
}

impl Default for DiceParser {
    fn default() -> Self {
        DiceParser::new()
    }
}

/// A dice roll specification: `count` dice of `sides` faces plus a flat modifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dice {
    count: i32,
    sides: i32,
    roll_type: RollType,
    modifier: i32,
}

impl Dice {
    /// Builds a roll specification.
    ///
    /// `count` and `sides` must be positive, and the largest possible total must fit in an
    /// `i32`.
    pub fn new(count: i32, sides: i32, roll_type: RollType, modifier: i32) -> Result<Self> {
        let dice = Dice {
            count,
            sides,
            roll_type,
            modifier,
        };

        if count < 1 || sides < 1 {
            return Err(Error::NonPositive(dice.to_string()));
        }

        let in_bounds = count
            .checked_mul(sides)
            .and_then(|max| max.checked_add(modifier))
            .and_then(|_| count.checked_add(modifier))
            .is_some();

        if in_bounds {
            Ok(dice)
        } else {
            Err(Error::Overflow(dice.to_string()))
        }
    }

    pub fn count(&self) -> i32 {
        self.count
    }

    pub fn sides(&self) -> i32 {
        self.sides
    }

    pub fn roll_type(&self) -> RollType {
        self.roll_type
    }

    pub fn modifier(&self) -> i32 {
        self.modifier
    }

    pub fn min_roll(&self) -> i32 {
        self.count + self.modifier
    }

    pub fn max_roll(&self) -> i32 {
        self.count * self.sides + self.modifier
    }

    /// The mean total, accounting for advantage and disadvantage.
    pub fn expected_value(&self) -> f64 {
        let n = f64::from(self.sides);
        // E[max of two dn] = (n + 1)(4n - 1) / 6n; the minimum mirrors it around (n + 1) / 2.
        let advantage = (n + 1.0) * (4.0 * n - 1.0) / (6.0 * n);
        let per_die = match self.roll_type {
            RollType::Standard => (n + 1.0) / 2.0,
            RollType::Advantage => advantage,
            RollType::Disadvantage => n + 1.0 - advantage,
        };
        f64::from(self.count) * per_die + f64::from(self.modifier)
    }

    /// Rolls and returns only the total.
    pub fn roll<R: RandomSource>(&self, source: &mut R) -> Result<i32> {
        let mut total = self.modifier;
        for _ in 0..self.count {
            let value = match self.roll_type {
                RollType::Standard => self.face(source)?,
                RollType::Advantage => cmp::max(self.face(source)?, self.face(source)?),
                RollType::Disadvantage => cmp::min(self.face(source)?, self.face(source)?),
            };
            total += value;
        }
        Ok(total)
    }

    /// Rolls and keeps every face consulted.
    pub fn roll_detailed<R: RandomSource>(&self, source: &mut R) -> Result<DiceResult> {
        let rolls = (0..self.count)
            .map(|_| self.roll_single(source))
            .collect::<Result<SmallVec<_>>>()?;
        let result = DiceResult::new(*self, rolls);
        trace!(dice = %self, total = result.total(), "rolled");
        Ok(result)
    }

    fn roll_single<R: RandomSource>(&self, source: &mut R) -> Result<SingleRoll> {
        let first = self.face(source)?;
        let roll = match self.roll_type {
            RollType::Standard => SingleRoll::new(first, smallvec![first]),
            RollType::Advantage => {
                let second = self.face(source)?;
                SingleRoll::new(cmp::max(first, second), smallvec![first, second])
            }
            RollType::Disadvantage => {
                let second = self.face(source)?;
                SingleRoll::new(cmp::min(first, second), smallvec![first, second])
            }
        };
        Ok(roll)
    }

    fn face<R: RandomSource>(&self, source: &mut R) -> Result<i32> {
        Ok(source.next_int(0, self.sides)? + 1)
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}{}", self.count, self.sides, self.roll_type)?;
        match self.modifier {
            0 => Ok(()),
            x => write!(f, "{:+}", x),
        }
    }
}

impl FromStr for Dice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PARSER.parse(s)
    }
}

impl TryFrom<String> for Dice {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dice> for String {
    fn from(dice: Dice) -> Self {
        dice.to_string()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RollType {
    Standard,
    Advantage,
    Disadvantage,
}

impl RollType {
    fn from_letter(letter: char) -> Result<Self> {
        match letter.to_ascii_uppercase() {
            'A' | 'H' => Ok(RollType::Advantage),
            'D' | 'L' => Ok(RollType::Disadvantage),
            _ => Err(Error::UnknownRollType(letter)),
        }
    }
}

impl Default for RollType {
    fn default() -> Self {
        RollType::Standard
    }
}

impl fmt::Display for RollType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollType::Standard => Ok(()),
            RollType::Advantage => f.write_str("A"),
            RollType::Disadvantage => f.write_str("D"),
        }
    }
}

fn parse_integer(text: &str) -> Result<i32> {
    text.parse()
        .map_err(|e| Error::BadInteger(text.into(), e))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use chance::{RandomSource, RawSeed, SeededSource};
    use proptest::prelude::*;

    use crate::{Dice, DiceParser, Error, Highlight, RollType};

    #[test]
    fn standard_expression() {
        let dice = parse("3d6");
        assert_eq!(dice, Dice::new(3, 6, RollType::Standard, 0).unwrap());
        assert_eq!(dice.min_roll(), 3);
        assert_eq!(dice.max_roll(), 18);
    }

    #[test]
    fn advantage_with_modifier() {
        let dice = parse("2d20A+5");
        assert_eq!(dice.count(), 2);
        assert_eq!(dice.sides(), 20);
        assert_eq!(dice.roll_type(), RollType::Advantage);
        assert_eq!(dice.modifier(), 5);
        assert_eq!(dice.min_roll(), 7);
        assert_eq!(dice.max_roll(), 45);
    }

    #[test]
    fn roll_type_letters() {
        assert_eq!(parse("1d20a").roll_type(), RollType::Advantage);
        assert_eq!(parse("1d20h").roll_type(), RollType::Advantage);
        assert_eq!(parse("1D20D").roll_type(), RollType::Disadvantage);
        assert_eq!(parse("1d20l").roll_type(), RollType::Disadvantage);
    }

    #[test]
    fn whitespace_and_case_are_ignored() {
        let expected = Dice::new(4, 10, RollType::Disadvantage, -1).unwrap();
        assert_eq!(parse(" 4 D 10 L - 1 "), expected);
        assert_eq!(parse("4d10d-1"), expected);
    }

    #[test]
    fn bad_expressions() {
        let parser = DiceParser::new();
        assert!(matches!(parser.parse("bogus"), Err(Error::BadExpression(_))));
        assert!(matches!(parser.parse("d20"), Err(Error::BadExpression(_))));
        assert!(matches!(parser.parse("2d6+"), Err(Error::BadExpression(_))));
        assert!(matches!(parser.parse(""), Err(Error::BadExpression(_))));
        assert_eq!(parser.parse("1d6x"), Err(Error::UnknownRollType('x')));
        assert!(matches!(
            parser.parse("99999999999d6"),
            Err(Error::BadInteger(..))
        ));
        assert!(matches!(parser.parse("0d6"), Err(Error::NonPositive(_))));
        assert!(matches!(parser.parse("2d0"), Err(Error::NonPositive(_))));
        assert!(matches!(
            parser.parse("100000d100000"),
            Err(Error::Overflow(_))
        ));
    }

    #[test]
    fn parse_or_falls_back() {
        let parser = DiceParser::new();
        let default = parse("1d20");
        assert_eq!(parser.parse_or("bogus", default), default);
        assert_eq!(parser.parse_or("2d4", default), parse("2d4"));
    }

    #[test]
    fn display_matches_notation() {
        assert_eq!(parse("3d6").to_string(), "3d6");
        assert_eq!(parse("2d20h+5").to_string(), "2d20A+5");
        assert_eq!(parse("1d8l-2").to_string(), "1d8D-2");
        assert_eq!(parse("2d20h+5").to_string().parse::<Dice>(), Ok(parse("2d20A+5")));
    }

    #[test]
    fn from_str_shares_one_parser() {
        assert!(std::ptr::eq(&*super::PARSER, &*super::PARSER));
        let parser = DiceParser::new();
        for text in ["1d4", "2d6+1", "3d8h-2", "bogus"] {
            assert_eq!(text.parse::<Dice>(), parser.parse(text));
        }
    }

    #[test]
    fn realize_standard() {
        let mut source = MockSource::new(vec![2, 3]);
        assert_eq!(parse("2d6").roll(&mut source), Ok(5));
    }

    #[test]
    fn realize_advantage() {
        let mut source = MockSource::new(vec![2, 20]);
        assert_eq!(parse("1d20a").roll(&mut source), Ok(20));
    }

    #[test]
    fn realize_disadvantage() {
        let mut source = MockSource::new(vec![20, 2]);
        assert_eq!(parse("1d20d").roll(&mut source), Ok(2));
    }

    #[test]
    fn detailed_advantage() {
        let mut source = MockSource::new(vec![3, 5, 6, 1]);
        let result = parse("2d20A+5").roll_detailed(&mut source).unwrap();

        let rolls = result.rolls();
        assert_eq!(rolls.len(), 2);
        assert_eq!(rolls[0].raw(), &[3, 5]);
        assert_eq!(rolls[0].value(), 5);
        assert_eq!(rolls[1].raw(), &[6, 1]);
        assert_eq!(rolls[1].value(), 6);
        assert_eq!(result.total(), 16);
        assert_eq!(result.to_string(), "( (3, [5]) + ([6], 1) ) + 5");
    }

    #[test]
    fn detailed_disadvantage_brackets_first_of_equal_faces() {
        let mut source = MockSource::new(vec![4, 4]);
        let result = parse("1d6d").roll_detailed(&mut source).unwrap();
        assert_eq!(result.total(), 4);
        assert_eq!(result.to_string(), "([4], 4)");
    }

    #[test]
    fn single_die_displays_its_value() {
        let mut source = MockSource::new(vec![4]);
        let result = parse("1d6").roll_detailed(&mut source).unwrap();
        assert_eq!(result.to_string(), "4");
    }

    #[test]
    fn negative_modifier_display() {
        let mut source = MockSource::new(vec![1, 2]);
        let result = parse("2d4-3").roll_detailed(&mut source).unwrap();
        assert_eq!(result.total(), 0);
        assert_eq!(result.to_string(), "( 1 + 2 ) - 3");
    }

    #[test]
    fn highlights() {
        let mut source = MockSource::new(vec![1, 3, 6]);
        let result = parse("3d6").roll_detailed(&mut source).unwrap();
        let highlights: Vec<_> = result.results().map(|(highlight, _)| highlight).collect();
        assert_eq!(
            highlights,
            vec![Highlight::Low, Highlight::Normal, Highlight::High]
        );
        assert!(!result.is_critical());

        let mut source = MockSource::new(vec![20]);
        assert!(parse("1d20").roll_detailed(&mut source).unwrap().is_critical());
    }

    #[test]
    fn expected_values() {
        assert_eq!(parse("2d6+1").expected_value(), 8.0);
        assert!((parse("1d20a").expected_value() - 13.825).abs() < 1e-9);
        assert!((parse("1d20d").expected_value() - 7.175).abs() < 1e-9);
        assert_eq!(parse("1d2a").expected_value(), 1.75);
    }

    #[test]
    fn seeded_advantage_keeps_higher_face() {
        let dice = parse("2d20A+5");
        let a = dice.roll_detailed(&mut SeededSource::from_int(12)).unwrap();
        let b = dice.roll_detailed(&mut SeededSource::from_int(12)).unwrap();
        assert_eq!(a, b);

        for roll in a.rolls() {
            assert_eq!(roll.raw().len(), 2);
            assert_eq!(roll.value(), roll.raw()[0].max(roll.raw()[1]));
        }
        let sum: i32 = a.rolls().iter().map(|roll| roll.value()).sum();
        assert_eq!(a.total(), sum + 5);
    }

    #[test]
    fn fast_and_detailed_rolls_agree() {
        for text in ["4d6", "3d8a-2", "2d12d+7"] {
            let dice = parse(text);
            let total = dice.roll(&mut SeededSource::from_int(99)).unwrap();
            let detailed = dice.roll_detailed(&mut SeededSource::from_int(99)).unwrap();
            assert_eq!(total, detailed.total());
        }
    }

    #[test]
    fn source_errors_propagate() {
        let mut source = MockSource::new(None);
        source.fail = true;
        assert!(matches!(
            parse("1d6").roll(&mut source),
            Err(Error::Source(chance::Error::EmptyCollection))
        ));
    }

    proptest! {
        #[test]
        fn rolls_stay_within_bounds(
            seed in any::<i64>(),
            count in 1i32..10,
            sides in 1i32..30,
            modifier in -20i32..20,
            roll_type in prop_oneof![
                Just(RollType::Standard),
                Just(RollType::Advantage),
                Just(RollType::Disadvantage)
            ]
        ) {
            let dice = Dice::new(count, sides, roll_type, modifier).unwrap();
            let total = dice.roll(&mut SeededSource::from_int(seed)).unwrap();
            prop_assert!(dice.min_roll() <= total && total <= dice.max_roll());
        }
    }

    fn parse(s: &str) -> Dice {
        DiceParser::new().parse(s).unwrap()
    }

    /// Plays back die faces in order, regardless of the range requested.
    struct MockSource {
        faces: VecDeque<i32>,
        raw_seed: RawSeed,
        fail: bool,
    }

    impl MockSource {
        fn new(faces: impl IntoIterator<Item = i32>) -> Self {
            Self {
                faces: faces.into_iter().collect(),
                raw_seed: RawSeed::Integer(0),
                fail: false,
            }
        }
    }

    impl RandomSource for MockSource {
        fn seed(&self) -> i64 {
            0
        }

        fn raw_seed(&self) -> &RawSeed {
            &self.raw_seed
        }

        fn next_int(&mut self, _min: i32, _max: i32) -> chance::Result<i32> {
            if self.fail {
                return Err(chance::Error::EmptyCollection);
            }
            Ok(self.faces.pop_front().unwrap() - 1)
        }

        fn next_f64(&mut self) -> f64 {
            0.0
        }

        fn from_raw_seed(raw_seed: RawSeed) -> Self {
            Self {
                faces: VecDeque::new(),
                raw_seed,
                fail: false,
            }
        }
    }
}
