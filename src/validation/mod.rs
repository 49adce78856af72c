//! Cross-validation of candidate models

pub mod loo;

pub use loo::{loo, LeaveOneOut, LooEstimate};
