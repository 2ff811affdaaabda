//! df-thermo: thermodynamic closures for detonflow.
//!
//! Provides:
//! - Equations of state in Mie–Grüneisen form (ideal gas, stiffened gas, JWL,
//!   Doan–Nickel) with analytic Γ and Π derivatives
//! - Caloric models and temperature inversion
//! - `Material` (EOS + caloric) and the progress-variable `BlendedThermo`
//! - `LookupTable1D` with log/exp column transforms
//!
//! # Example
//!
//! ```
//! use df_thermo::{CaloricModel, EquationOfState, Material};
//!
//! let air = Material::new(
//!     "air",
//!     28.97,
//!     EquationOfState::IdealGas { gamma: 1.4 },
//!     CaloricModel::ConstantCv { cv: 718.0, e_ref: 0.0 },
//! )
//! .unwrap();
//! let p = air.pressure(1.2, 2.0e5);
//! assert!((p - 0.4 * 1.2 * 2.0e5).abs() < 1e-9);
//! ```

pub mod blend;
pub mod caloric;
pub mod eos;
pub mod error;
pub mod lookup;
pub mod material;
pub mod pack;

// Re-exports for ergonomics
pub use blend::{BlendedThermo, PhaseThermo, blend, blend_sqr};
pub use caloric::CaloricModel;
pub use eos::{Departure, DoanNickelCoeffs, EquationOfState, JwlCoeffs};
pub use error::{ThermoError, ThermoResult};
pub use lookup::{LookupTable1D, TableData, TableMod};
pub use material::Material;
pub use pack::ThermoPropertyPack;
