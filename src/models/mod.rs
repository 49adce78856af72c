//! Linear model building blocks: design matrices and the least-squares solver

pub mod design;
pub mod ols;

pub use design::{build, DesignMatrix};
pub use ols::{solve, OlsSolver};
