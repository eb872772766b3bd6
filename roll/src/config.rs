use std::{fs::File, path::Path, slice};

use chance::RawSeed;
use dice::Dice;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seed: Option<RawSeed>,
    #[serde(default)]
    formulas: HashMap<String, Formula>,
}

impl Config {
    /// Reads a profile, treating a missing file as an empty one.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Default::default());
        }

        let config = serde_json::from_reader(File::open(path)?)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        serde_json::to_writer_pretty(File::create(path)?, self)?;
        Ok(())
    }

    #[inline]
    pub fn get_alias(&self, name: &str) -> Option<&Formula> {
        self.formulas.get(name)
    }

    #[inline]
    pub fn set_alias(&mut self, name: String, formula: Formula) -> Option<Formula> {
        self.formulas.insert(name, formula)
    }

    #[inline]
    pub fn remove(&mut self, name: &str) -> Option<Formula> {
        self.formulas.remove(name)
    }

    /// Aliases in name order.
    pub fn aliases(&self) -> impl Iterator<Item = (&String, &Formula)> {
        let mut aliases: Vec<_> = self.formulas.iter().collect();
        aliases.sort_unstable_by_key(|&(name, _)| name);
        aliases.into_iter()
    }

    pub fn seed(&self) -> Option<&RawSeed> {
        self.seed.as_ref()
    }

    pub fn set_seed(&mut self, seed: Option<RawSeed>) {
        self.seed = seed;
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Formula {
    pub comment: Option<String>,
    pub expressions: Vec<StoredExpression>,
}

impl<'a> IntoIterator for &'a Formula {
    type Item = &'a StoredExpression;

    type IntoIter = slice::Iter<'a, StoredExpression>;

    fn into_iter(self) -> Self::IntoIter {
        self.expressions.iter()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StoredExpression {
    pub text: String,
    pub dice: Dice,
}

impl StoredExpression {
    pub fn new(text: impl Into<String>, dice: Dice) -> Self {
        Self {
            text: text.into(),
            dice,
        }
    }
}
