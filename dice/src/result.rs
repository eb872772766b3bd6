use std::fmt::{self, Display};

use smallvec::SmallVec;

use crate::Dice;

/// The outcome of one die.
///
/// Advantage and disadvantage consult two faces; both are kept in `raw` even though only
/// `value` counts toward the total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleRoll {
    value: i32,
    raw: SmallVec<[i32; 2]>,
}

impl SingleRoll {
    pub(crate) fn new(value: i32, raw: SmallVec<[i32; 2]>) -> Self {
        Self { value, raw }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn raw(&self) -> &[i32] {
        &self.raw
    }
}

impl Display for SingleRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw.len() == 1 {
            return write!(f, "{}", self.value);
        }

        let kept = self.raw.iter().position(|&x| x == self.value);
        f.write_str("(")?;
        for (idx, face) in self.raw.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            if Some(idx) == kept {
                write!(f, "[{}]", face)?;
            } else {
                write!(f, "{}", face)?;
            }
        }
        f.write_str(")")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiceResult {
    dice: Dice,
    rolls: SmallVec<[SingleRoll; 4]>,
    total: i32,
}

impl DiceResult {
    pub(crate) fn new(dice: Dice, rolls: SmallVec<[SingleRoll; 4]>) -> Self {
        let total = rolls.iter().map(SingleRoll::value).sum::<i32>() + dice.modifier();
        Self { dice, rolls, total }
    }

    pub fn dice(&self) -> &Dice {
        &self.dice
    }

    pub fn rolls(&self) -> &[SingleRoll] {
        &self.rolls
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    pub fn modifier(&self) -> i32 {
        self.dice.modifier()
    }

    pub fn results(&'_ self) -> impl Iterator<Item = (Highlight, &SingleRoll)> + '_ {
        let sides = self.dice.sides();
        self.rolls.iter().map(move |roll| match roll.value {
            1 => (Highlight::Low, roll),
            x if x == sides => (Highlight::High, roll),
            _ => (Highlight::Normal, roll),
        })
    }

    /// A single die that came up on its highest face.
    pub fn is_critical(&self) -> bool {
        self.rolls.len() == 1 && self.rolls[0].value == self.dice.sides()
    }
}

impl Display for DiceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rolls.as_slice() {
            [roll] => write!(f, "{}", roll)?,
            rolls => {
                f.write_str("(")?;
                for (idx, roll) in rolls.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" +")?;
                    }
                    write!(f, " {}", roll)?;
                }
                f.write_str(" )")?;
            }
        }

        match self.modifier() {
            0 => Ok(()),
            x if x.is_negative() => write!(f, " - {}", x.unsigned_abs()),
            x => write!(f, " + {}", x),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Highlight {
    High,
    Low,
    Normal,
}
