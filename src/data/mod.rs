//! Input data: observations, basis vectors and synthetic scenarios

pub mod basis;
pub mod series;
pub mod synthetic;

pub use basis::{BasisCollection, BasisVector};
pub use series::ObservationSeries;
pub use synthetic::{linspace, SyntheticScenario};
