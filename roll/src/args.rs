use std::{io, path::PathBuf};

use chance::RawSeed;
use clap::{Parser, Subcommand};
use directories::BaseDirs;

use crate::Result;

static PROFILE_BASE: &str = ".roll";

#[derive(Clone, Debug, Parser)]
#[clap(author, about, version)]
pub struct Args {
    /// dice to roll, or saved aliases
    ///
    /// Dice are written 2d6, 1d20a+5 (advantage) or 1d20d (disadvantage); h and l work as
    /// well as a and d. Append *N or xN to roll the same dice N times, e.g. 1d8x3.
    expressions: Vec<String>,

    /// print expected values instead of rolling
    #[clap(short = 'a', long = "show-average")]
    average: bool,

    /// integer or text seed for repeatable rolls
    ///
    /// Text is hashed into a seed. Overrides the seed stored in the profile. The seed in use
    /// is printed after the rolls.
    #[clap(short, long)]
    seed: Option<String>,

    /// use the named profile, stored as ~/.roll.<name>
    #[clap(short = 'c', long = "config")]
    profile: Option<String>,

    #[clap(subcommand)]
    command: Option<Command>,

    /// log seeding and derived streams to stderr
    #[clap(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Save expressions under an alias
    Add {
        alias: String,
        /// A note printed whenever the alias is rolled
        #[clap(short, long)]
        comment: Option<String>,
        #[clap(required = true)]
        expressions: Vec<String>,
    },
    /// Forget an alias
    Rm { alias: String },
    /// Show the profile's seed and aliases
    List,
    /// Store a default seed for the profile, or clear it when none is given
    Seed { seed: Option<String> },
}

/// What a single invocation asks for.
#[derive(Clone, Debug, PartialEq)]
pub enum Request<'a> {
    Roll(&'a [String]),
    Average(&'a [String]),
    Save {
        alias: &'a str,
        comment: Option<&'a str>,
        expressions: &'a [String],
    },
    Forget(&'a str),
    List,
    StoreSeed(Option<RawSeed>),
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn request(&self) -> Request {
        match &self.command {
            None if self.average => Request::Average(&self.expressions),
            None => Request::Roll(&self.expressions),
            Some(Command::Add {
                alias,
                comment,
                expressions,
            }) => Request::Save {
                alias,
                comment: comment.as_deref(),
                expressions,
            },
            Some(Command::Rm { alias }) => Request::Forget(alias),
            Some(Command::List) => Request::List,
            Some(Command::Seed { seed }) => Request::StoreSeed(seed.as_deref().map(RawSeed::parse)),
        }
    }

    /// The seed given on the command line, if any.
    pub fn seed(&self) -> Option<RawSeed> {
        self.seed.as_deref().map(RawSeed::parse)
    }

    pub fn profile_path(&self) -> Result<PathBuf> {
        let dirs = BaseDirs::new()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?;
        Ok(dirs.home_dir().join(profile_file(self.profile.as_deref())))
    }
}

/// Profile names are reduced to lowercase ASCII letters and digits; an empty name means the
/// default profile.
fn profile_file(profile: Option<&str>) -> String {
    let suffix: String = profile
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();

    if suffix.is_empty() {
        PROFILE_BASE.into()
    } else {
        format!("{PROFILE_BASE}.{suffix}")
    }
}
