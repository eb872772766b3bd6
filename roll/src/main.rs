mod args;
mod config;

use std::{fmt::Display, io, iter, process};

use args::{Args, Request};
use chance::{RandomSource, RawSeed, SeededSource};
use config::{Config, Formula, StoredExpression};
use dice::{DiceParser, DiceResult, Highlight};
use either::Either;
use hashbrown::HashSet;
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to parse expression: {0}")]
    Expr(#[from] dice::Error),
    #[error(transparent)]
    Rng(#[from] chance::Error),
    #[error("Unable to read profile: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    IO(#[from] std::io::Error),
}

struct ResultFormatter<'a> {
    text: &'a str,
    result: &'a DiceResult,
}

impl<'a> ResultFormatter<'a> {
    fn new(text: &'a str, result: &'a DiceResult) -> Self {
        Self { text, result }
    }
}

impl<'a> Display for ResultFormatter<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = self.result.total();
        let rolls = self.result.rolls();
        if self.result.is_critical() {
            write!(f, "{:>2}  ::  {}  ::  ", total.bright_green(), self.text)?;
        } else if rolls.len() == 1 && rolls[0].value() == 1 {
            write!(f, "{:>2}  ::  {}  ::  ", total.bright_red(), self.text)?;
        } else {
            write!(f, "{:>2}  ::  {}  ::  ", total, self.text)?;
        }

        for (idx, (highlight, roll)) in self.result.results().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            match highlight {
                Highlight::High => write!(f, "{:>2}", roll.bright_green())?,
                Highlight::Low => write!(f, "{:>2}", roll.bright_red())?,
                Highlight::Normal => write!(f, "{:>2}", roll)?,
            }
        }

        match self.result.modifier() {
            0 => Ok(()),
            x if x.is_negative() => write!(f, " (-{})", x.unsigned_abs()),
            x => write!(f, "   +{}", x),
        }
    }
}

fn main() -> Result<()> {
    let opts = Args::parse();
    init_logging(opts.verbose);

    let path = opts.profile_path()?;
    let mut config = Config::load(&path)?;

    match opts.request() {
        Request::Roll(expressions) => execute_expressions(&config, opts.seed(), expressions),
        Request::Average(expressions) => print_averages(&config, expressions),
        Request::Save {
            alias,
            comment,
            expressions,
        } => {
            let formula = compile_formula(comment, expressions)?;
            config.set_alias(alias.into(), formula);
            config.save(&path)
        }
        Request::Forget(alias) => {
            config.remove(alias);
            config.save(&path)
        }
        Request::List => {
            list(&config);
            Ok(())
        }
        Request::StoreSeed(seed) => {
            config.set_seed(seed);
            config.save(&path)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "roll=debug,chance=debug,dice=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Expands counted expressions: `2d6*3` or `2d6x3` stands for three rolls of `2d6`.
///
/// Saved aliases and anything without a numeric count pass through whole, so an alias named
/// `axe` stays `axe`.
fn expand_expressions<'a, I>(config: &'a Config, candidates: I) -> impl Iterator<Item = &'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .flat_map(move |candidate| match split_count(config, candidate) {
            Some((expr, count)) => Either::Left(iter::repeat(expr).take(count)),
            None => Either::Right(iter::once(candidate)),
        })
}

fn split_count<'a>(config: &Config, candidate: &'a str) -> Option<(&'a str, usize)> {
    if config.get_alias(candidate).is_some() {
        return None;
    }

    let (expr, count) = candidate.rsplit_once(|u: char| matches!(u, '*' | 'x' | 'X'))?;
    let count = count.parse().ok()?;
    (!expr.is_empty()).then(|| (expr, count))
}

fn print_averages(config: &Config, expressions: &[String]) -> Result<()> {
    let parser = DiceParser::new();
    let mut unique_filter = HashSet::new();

    println!();

    for expression in expand_expressions(config, expressions.iter().map(String::as_str)) {
        let stored = match config.get_alias(expression) {
            Some(formula) => formula.expressions.clone(),
            None => vec![StoredExpression::new(expression, parser.parse(expression)?)],
        };

        for StoredExpression { text, dice } in stored {
            if unique_filter.insert(dice) {
                println!("{:>6.02}  ::  {}", dice.expected_value(), text);
            }
        }
    }

    println!();

    Ok(())
}

fn execute_expressions(
    config: &Config,
    seed: Option<RawSeed>,
    expressions: &[String],
) -> Result<()> {
    let parser = DiceParser::new();

    let mut source: SeededSource = match seed.or_else(|| config.seed().cloned()) {
        Some(seed) => SeededSource::with_raw_seed(seed),
        None => SeededSource::new(),
    };
    debug!(seed = %source.raw_seed(), "rolling");

    println!();

    for expression in expand_expressions(config, expressions.iter().map(String::as_str)) {
        if let Some(formula) = config.get_alias(expression) {
            println!("# {}", expression);
            if let Some(comment) = &formula.comment {
                println!("# {}", comment);
            }

            // Each alias rolls from its own stream; editing one formula leaves the rolls after
            // it unchanged.
            let mut formula_source = source.derive_child()?;
            for stored in formula {
                let result = stored.dice.roll_detailed(&mut formula_source)?;
                println!("  {}", ResultFormatter::new(&stored.text, &result));
            }
        } else {
            match parser.parse(expression) {
                Ok(compiled) => {
                    let result = compiled.roll_detailed(&mut source)?;
                    println!("  {}", ResultFormatter::new(expression, &result));
                }

                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(1);
                }
            }
        }
    }

    println!();
    println!("  seed  ::  {}", source.raw_seed());
    println!();
    Ok(())
}

fn compile_formula(comment: Option<&str>, expressions: &[String]) -> dice::Result<Formula> {
    let parser = DiceParser::new();
    let expressions = expressions
        .iter()
        .map(|text| parser.parse(text).map(|dice| StoredExpression::new(text, dice)))
        .collect::<dice::Result<_>>()?;

    Ok(Formula {
        comment: comment.map(Into::into),
        expressions,
    })
}

fn list(config: &Config) {
    if let Some(seed) = config.seed() {
        println!("# seed: {}", seed);
    }

    for (alias, formula) in config.aliases() {
        println!("# {}", alias);
        if let Some(comment) = &formula.comment {
            println!("# {}", comment);
        }
        for expression in formula {
            println!("  {}", expression.text);
        }
    }
}
