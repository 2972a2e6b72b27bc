//! Retry loop around the pipeline
//!
//! A [`MazeShuffle`] keeps trying fresh attempts for one level until one
//! succeeds or the attempt budget runs out. Each attempt gets its own fork
//! of the caller's generator.

use core::fmt;

use log::{debug, error, info};

#[cfg(not(feature = "std"))]
use crate::compat::*;

use super::attempt::Attempt;
use super::strategy::CaveStrategy;
use crate::catalog::Tileset;
use crate::config::ShuffleConfig;
use crate::error::{Failure, ShuffleError, Step};
use crate::layout::Layout;
use crate::maze::{Grid, Pos};
use crate::rng::ShuffleRng;
use crate::survey::Survey;

/// A successful shuffle.
#[derive(Debug, Clone)]
pub struct ShuffleOutcome {
    pub layout: Layout,
    /// The grid the layout was inferred from.
    pub grid: Grid,
    /// Attempts spent, including the successful one.
    pub attempts: usize,
    /// `(over, under)` screen pairs joined by stairs, for paired levels.
    pub stair_links: Vec<(Pos, Pos)>,
}

/// Run a single attempt on a fork of `rng`.
pub fn run_attempt(
    strategy: &dyn CaveStrategy,
    survey: &Survey,
    tileset: &Tileset<'_>,
    config: &ShuffleConfig,
    rng: &mut ShuffleRng,
    number: usize,
) -> Step<ShuffleOutcome> {
    let mut a = Attempt::new(survey, tileset, config, strategy.tuning(), rng.fork(), number);
    strategy.init(&mut a);
    let layout = strategy.build(&mut a)?;
    let stair_links = strategy.stair_links(&a);
    Ok(ShuffleOutcome {
        layout,
        grid: a.grid,
        attempts: number,
        stair_links,
    })
}

/// One level's shuffle: a strategy, the survey it must match, and the
/// result of the last run.
pub struct MazeShuffle {
    strategy: Box<dyn CaveStrategy>,
    survey: Survey,
    config: ShuffleConfig,
    attempt: usize,
    outcome: Option<ShuffleOutcome>,
}

impl MazeShuffle {
    pub fn new(strategy: Box<dyn CaveStrategy>, survey: Survey) -> Self {
        Self::with_config(strategy, survey, ShuffleConfig::default())
    }

    pub fn with_config(strategy: Box<dyn CaveStrategy>, survey: Survey, config: ShuffleConfig) -> Self {
        Self {
            strategy,
            survey,
            config,
            attempt: 0,
            outcome: None,
        }
    }

    pub fn strategy(&self) -> &dyn CaveStrategy {
        self.strategy.as_ref()
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    pub fn config(&self) -> &ShuffleConfig {
        &self.config
    }

    /// Attempts used by the most recent run.
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    pub fn outcome(&self) -> Option<&ShuffleOutcome> {
        self.outcome.as_ref()
    }

    pub fn into_outcome(self) -> Option<ShuffleOutcome> {
        self.outcome
    }

    pub fn max_attempts(&self) -> usize {
        self.config.max_attempts.unwrap_or_else(|| self.strategy.max_attempts())
    }

    /// Fraction of the attempt budget the last run used.
    pub fn badness(&self) -> f64 {
        match self.max_attempts() {
            0 => 1.0,
            max => self.attempt as f64 / max as f64,
        }
    }

    /// Retry until an attempt succeeds or the budget is spent.
    pub fn shuffle(&mut self, tileset: &Tileset<'_>, rng: &mut ShuffleRng) -> Result<&ShuffleOutcome, ShuffleError> {
        self.config.validate()?;
        let max = self.max_attempts();
        if max == 0 {
            return Err(ShuffleError::Config(format!("{}: attempt budget is zero", self.survey.level)));
        }
        self.outcome = None;
        let mut number = 0;
        loop {
            number += 1;
            self.attempt = number;
            match run_attempt(self.strategy.as_ref(), &self.survey, tileset, &self.config, rng, number) {
                Ok(outcome) => {
                    info!("{self}");
                    return Ok(self.outcome.insert(outcome));
                }
                Err(failure) if number < max => {
                    debug!("{} attempt {number}: {failure}", self.survey.level);
                }
                Err(last) => return Err(self.exhausted(last)),
            }
        }
    }

    fn exhausted(&self, last: Failure) -> ShuffleError {
        error!("{}: gave up after {} attempts ({last})", self.strategy.name(), self.attempt);
        ShuffleError::Exhausted {
            level: self.survey.level.clone(),
            attempts: self.attempt,
            last,
        }
    }
}

impl fmt::Debug for MazeShuffle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MazeShuffle")
            .field("strategy", &self.strategy.name())
            .field("level", &self.survey.level)
            .field("attempt", &self.attempt)
            .field("done", &self.outcome.is_some())
            .finish()
    }
}

impl fmt::Display for MazeShuffle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}): {}/{}",
            self.strategy.name(),
            self.survey.level,
            self.attempt,
            self.max_attempts()
        )
    }
}

/// A batch of level shuffles sharing one generator.
#[derive(Debug, Default)]
pub struct MazeShuffles {
    shuffles: Vec<MazeShuffle>,
}

impl MazeShuffles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, shuffle: MazeShuffle) {
        self.shuffles.push(shuffle);
    }

    pub fn len(&self) -> usize {
        self.shuffles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shuffles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MazeShuffle> {
        self.shuffles.iter()
    }

    /// Run every shuffle in insertion order, collecting the failures.
    pub fn shuffle_all(&mut self, tileset: &Tileset<'_>, rng: &mut ShuffleRng) -> Vec<ShuffleError> {
        let mut errors = Vec::new();
        for shuffle in &mut self.shuffles {
            if let Err(err) = shuffle.shuffle(tileset, rng) {
                errors.push(err);
            }
        }
        errors
    }
}

/// Worst first.
impl fmt::Display for MazeShuffles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sorted: Vec<&MazeShuffle> = self.shuffles.iter().collect();
        sorted.sort_by(|a, b| b.badness().total_cmp(&a.badness()));
        for s in sorted {
            writeln!(f, "{s}")?;
        }
        Ok(())
    }
}
