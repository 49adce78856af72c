//! Bayesian posterior sampling interface
//!
//! The sampler itself is external; see [`sampler::PosteriorSampler`].

pub mod sampler;

pub use sampler::{
    Criterion, FixedScoreSampler, PosteriorSampler, PosteriorSummary, PriorBounds, Score,
};
