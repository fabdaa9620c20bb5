//! Operator combinators.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::types::Mutation;
use super::util::roulette_select;
use crate::error::{Error, Result};
use crate::state::StateMut;

/// What [`Conditional`] does on epochs its predicate rejects.
pub enum Fallback {
    /// Report this result without touching the state.
    Report(bool),
    /// Run another operator instead.
    Run(Box<dyn Mutation>),
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Report(result) => f.debug_tuple("Report").field(result).finish(),
            Self::Run(other) => f.debug_tuple("Run").field(&other.name()).finish(),
        }
    }
}

/// Runs `inner` on epochs accepted by `predicate`, the fallback on the rest.
pub struct Conditional<M, P> {
    inner: M,
    predicate: P,
    fallback: Fallback,
}

impl<M, P> Conditional<M, P>
where
    M: Mutation,
    P: Fn(usize) -> bool + Send + Sync,
{
    /// Skipped epochs report `true`.
    pub fn new(inner: M, predicate: P) -> Self {
        Self {
            inner,
            predicate,
            fallback: Fallback::Report(true),
        }
    }

    pub fn otherwise(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }
}

impl<M, P> Mutation for Conditional<M, P>
where
    M: Mutation,
    P: Fn(usize) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn mutate(&self, state: &mut StateMut<'_>, epoch: usize, rng: &mut dyn RngCore) -> bool {
        if (self.predicate)(epoch) {
            return self.inner.mutate(state, epoch, rng);
        }
        match &self.fallback {
            Fallback::Report(result) => *result,
            Fallback::Run(other) => other.mutate(state, epoch, rng),
        }
    }
}

impl<M: Mutation, P> fmt::Debug for Conditional<M, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conditional")
            .field("inner", &self.inner.name())
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// How [`Concat`] folds its parts' results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessPolicy {
    #[default]
    Always,
    Any,
    All,
}

impl SuccessPolicy {
    fn fold(self, results: &[bool]) -> bool {
        match self {
            Self::Always => true,
            Self::Any => results.iter().any(|&r| r),
            Self::All => results.iter().all(|&r| r),
        }
    }
}

impl FromStr for SuccessPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "always" => Ok(Self::Always),
            "any" => Ok(Self::Any),
            "all" => Ok(Self::All),
            other => Err(Error::Invalid(format!("unknown success policy: {other}"))),
        }
    }
}

/// Runs every part in order. Each part runs regardless of earlier results.
pub struct Concat {
    parts: Vec<Box<dyn Mutation>>,
    policy: SuccessPolicy,
    name: String,
}

impl Concat {
    pub fn new(parts: Vec<Box<dyn Mutation>>) -> Self {
        let name = parts
            .iter()
            .map(|part| part.name())
            .collect::<Vec<_>>()
            .join("+");
        Self {
            parts,
            policy: SuccessPolicy::Always,
            name,
        }
    }

    pub fn with_policy(mut self, policy: SuccessPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl fmt::Debug for Concat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Concat")
            .field("parts", &part_names(&self.parts))
            .field("policy", &self.policy)
            .finish()
    }
}

impl Mutation for Concat {
    fn name(&self) -> &str {
        &self.name
    }

    fn mutate(&self, state: &mut StateMut<'_>, epoch: usize, rng: &mut dyn RngCore) -> bool {
        let mut results = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            results.push(part.mutate(state, epoch, rng));
        }
        self.policy.fold(&results)
    }
}

/// Draws `k` parts (with replacement, by weight) and runs them in order.
/// Always succeeds.
pub struct Randomize {
    parts: Vec<Box<dyn Mutation>>,
    weights: Vec<f64>,
    k: usize,
}

impl Randomize {
    /// Every part equally likely.
    ///
    /// # Errors
    ///
    /// [`Error::Invalid`] if `parts` is empty.
    pub fn uniform(parts: Vec<Box<dyn Mutation>>, k: usize) -> Result<Self> {
        let weights = vec![1.0; parts.len()];
        Self::weighted(parts, weights, k)
    }

    /// Part `i` drawn with probability `weights[i] / sum(weights)`.
    ///
    /// # Errors
    ///
    /// [`Error::Invalid`] if `parts` is empty, the lengths differ, or the
    /// weights are not non-negative with a positive sum.
    pub fn weighted(parts: Vec<Box<dyn Mutation>>, weights: Vec<f64>, k: usize) -> Result<Self> {
        if parts.is_empty() {
            return Err(Error::Invalid("randomize needs at least one mutation".into()));
        }
        if parts.len() != weights.len() {
            return Err(Error::Invalid(format!(
                "{} mutations but {} weights",
                parts.len(),
                weights.len()
            )));
        }
        let valid = weights.iter().all(|w| w.is_finite() && *w >= 0.0);
        if !valid || weights.iter().sum::<f64>() <= 0.0 {
            return Err(Error::Invalid(format!(
                "mutation weights must be non-negative with a positive sum, got {weights:?}"
            )));
        }
        Ok(Self { parts, weights, k })
    }
}

impl fmt::Debug for Randomize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Randomize")
            .field("parts", &part_names(&self.parts))
            .field("weights", &self.weights)
            .field("k", &self.k)
            .finish()
    }
}

impl Mutation for Randomize {
    fn name(&self) -> &str {
        "randomize"
    }

    fn mutate(&self, state: &mut StateMut<'_>, epoch: usize, rng: &mut dyn RngCore) -> bool {
        for _ in 0..self.k {
            let part = roulette_select(&self.weights, rng);
            self.parts[part].mutate(state, epoch, rng);
        }
        true
    }
}

fn part_names(parts: &[Box<dyn Mutation>]) -> Vec<&str> {
    parts.iter().map(|part| part.name()).collect()
}
