//! Explicit multi-stage integration of reacting two-phase flow.
//!
//! Provides:
//! - The `IntegrationSystem` stage contract and per-stage slot storage
//! - Shu–Osher form time schemes (Euler through RK4, or a custom tableau)
//! - Upwind and Rusanov face flux schemes
//! - Reaction-progress model with detonation points and rate limiting
//! - Two-phase volume fraction / phase mass system with an equilibrium closure
//! - Fixed-step run driver

pub mod activation;
pub mod error;
pub mod flux;
pub mod scheme;
pub mod sim;
pub mod slots;
pub mod system;
pub mod two_phase;

// Re-exports for public API
pub use activation::{
    ActivationInputs, ActivationLaw, ActivationModel, ActivationSettings, DetonationPoint,
    DetonationPointDef, LambdaSeed,
};
pub use error::{SimError, SimResult};
pub use flux::{CellPrimitives, FaceFluxes, FluxKind, FluxScheme, Rusanov, Upwind};
pub use scheme::{Stage, TimeScheme};
pub use sim::{SimOptions, SimProgress, SimSummary, run_sim, run_sim_with_progress};
pub use slots::{Slot, SlotArena, StagedField};
pub use system::{IntegrationSystem, StepTime};
pub use two_phase::{DomainDiagnostics, TwoPhaseInit, TwoPhaseSettings, TwoPhaseSystem};
