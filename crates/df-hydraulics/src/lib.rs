//! df-hydraulics: pressure balancing of sized duct networks.
//!
//! Pipeline:
//! 1. classify every node as a fitting and attach loss coefficients
//! 2. build a pipe-network model (Darcy–Weisbach + local losses)
//! 3. Newton-solve with a finite-difference Jacobian
//! 4. shift the source pressure until the weakest node holds the margin

pub mod balance;
pub mod error;
pub mod fitting;
pub mod jacobian;
pub mod loss;
pub mod model;
pub mod newton;
pub mod segment;

pub use balance::{
    BalanceConfig, BalanceResult, DEFAULT_CORRECTION_PASSES, DEFAULT_SAFETY_MARGIN_PA, PressureUnit,
    balance_network,
};
pub use error::{HydraulicError, HydraulicResult};
pub use fitting::{Fitting, FittingKind, classify_fittings};
pub use model::{HydraulicModel, HydraulicSolution};
pub use newton::{NewtonResult, SolverConfig, newton_solve};
pub use segment::{AirProperties, DuctSegment};
