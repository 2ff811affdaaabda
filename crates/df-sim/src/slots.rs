//! Per-stage storage for multi-stage explicit schemes.
//!
//! A stage combines the current value, stored stage-start values and stored
//! rates:
//!
//! ```text
//! q ← (1 − Σ aᵢ)·q + Σ_{j<i} aᵢ[j]·old[j] + dt·(Σ_{j<i} bᵢ[j]·Δ[j] + bᵢ[i]·Δ)
//! ```
//!
//! Only stages a later stage actually reads get storage.

use rayon::prelude::*;

use crate::error::{SimError, SimResult};

/// State of one stage slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// No storage; the scheme never reads this stage.
    Unallocated,
    /// Storage reserved but not yet written during the current step.
    Empty,
    /// Written during the current step.
    Filled(Vec<f64>),
}

/// Slots for one field, indexed by stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotArena {
    field: &'static str,
    slots: Vec<Slot>,
}

impl SlotArena {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            slots: Vec::new(),
        }
    }

    /// Reserve slots for the flagged stages; every other stage stays unallocated.
    pub fn allocate(&mut self, flags: &[bool]) {
        self.slots = flags
            .iter()
            .map(|&f| if f { Slot::Empty } else { Slot::Unallocated })
            .collect();
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Number of stages the arena was sized for.
    pub fn n_steps(&self) -> usize {
        self.slots.len()
    }

    pub fn n_allocated(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| !matches!(s, Slot::Unallocated))
            .count()
    }

    pub fn is_allocated(&self, stage: usize) -> bool {
        matches!(self.slots.get(stage), Some(Slot::Empty | Slot::Filled(_)))
    }

    /// Start of a new step: every written slot becomes empty again.
    pub fn mark_empty(&mut self) {
        for slot in &mut self.slots {
            if matches!(slot, Slot::Filled(_)) {
                *slot = Slot::Empty;
            }
        }
    }

    /// Write `values` into `stage` if it is allocated.
    pub fn store(&mut self, stage: usize, values: &[f64]) {
        if let Some(slot) = self.slots.get_mut(stage) {
            match slot {
                Slot::Unallocated => {}
                Slot::Empty => *slot = Slot::Filled(values.to_vec()),
                Slot::Filled(buf) => {
                    buf.clear();
                    buf.extend_from_slice(values);
                }
            }
        }
    }

    pub fn get(&self, stage: usize) -> SimResult<&[f64]> {
        match self.slots.get(stage) {
            Some(Slot::Filled(v)) => Ok(v),
            Some(Slot::Empty) => Err(SimError::EmptySlot {
                field: self.field,
                stage,
            }),
            Some(Slot::Unallocated) | None => Err(SimError::UnallocatedSlot {
                field: self.field,
                stage,
            }),
        }
    }

    /// Mutable access to a written slot; `None` if the stage has no storage.
    fn filled_mut(&mut self, stage: usize) -> Option<&mut Vec<f64>> {
        match self.slots.get_mut(stage) {
            Some(Slot::Filled(v)) => Some(v),
            _ => None,
        }
    }
}

/// Check stage index and coefficient lengths against the configured step count.
pub fn check_stage(stepi: usize, ai: &[f64], bi: &[f64], n_steps: usize) -> SimResult<()> {
    if n_steps == 0 {
        return Err(SimError::Config {
            what: "ODE fields have not been set",
        });
    }
    if stepi >= n_steps {
        return Err(SimError::Config {
            what: "stage index exceeds the configured number of steps",
        });
    }
    if ai.len() != stepi {
        return Err(SimError::Config {
            what: "ai must have one entry per previous stage",
        });
    }
    if bi.len() != stepi + 1 {
        return Err(SimError::Config {
            what: "bi must have one entry per stage up to the current one",
        });
    }
    Ok(())
}

/// Stored old values and rates for one named cell field.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedField {
    old: SlotArena,
    delta: SlotArena,
}

impl StagedField {
    pub fn new(field: &'static str) -> Self {
        Self {
            old: SlotArena::new(field),
            delta: SlotArena::new(field),
        }
    }

    pub fn set_ode_fields(
        &mut self,
        n_steps: usize,
        store_fields: &[bool],
        store_deltas: &[bool],
    ) -> SimResult<()> {
        if store_fields.len() != n_steps || store_deltas.len() != n_steps {
            return Err(SimError::Config {
                what: "store flags must have one entry per step",
            });
        }
        self.old.allocate(store_fields);
        self.delta.allocate(store_deltas);
        Ok(())
    }

    pub fn clear_ode_fields(&mut self) {
        self.old.clear();
        self.delta.clear();
    }

    pub fn n_steps(&self) -> usize {
        self.old.n_steps()
    }

    pub fn old(&self) -> &SlotArena {
        &self.old
    }

    pub fn delta(&self) -> &SlotArena {
        &self.delta
    }

    /// Apply stage `stepi` to `current` given this stage's rate `fresh`.
    ///
    /// `current` and `fresh` are stored first (if this stage is flagged), so
    /// later stages see the stage-start value and its rate.
    pub fn advance(
        &mut self,
        stepi: usize,
        ai: &[f64],
        bi: &[f64],
        dt: f64,
        current: &mut [f64],
        fresh: &[f64],
    ) -> SimResult<()> {
        check_stage(stepi, ai, bi, self.n_steps())?;
        if current.len() != fresh.len() {
            return Err(SimError::InvalidArg {
                what: "field and rate lengths differ",
            });
        }
        if stepi == 0 {
            self.old.mark_empty();
            self.delta.mark_empty();
        }
        self.old.store(stepi, current);
        self.delta.store(stepi, fresh);

        let mut olds: Vec<(f64, &[f64])> = Vec::new();
        let mut deltas: Vec<(f64, &[f64])> = Vec::new();
        for j in 0..stepi {
            if ai[j] != 0.0 {
                olds.push((ai[j], self.old.get(j)?));
            }
            if bi[j] != 0.0 {
                deltas.push((bi[j], self.delta.get(j)?));
            }
        }
        let c0 = 1.0 - ai.iter().sum::<f64>();
        let b_fresh = bi[stepi];

        current.par_iter_mut().enumerate().for_each(|(i, q)| {
            let mut value = c0 * *q;
            for (w, old) in &olds {
                value += w * old[i];
            }
            let mut rate = b_fresh * fresh[i];
            for (w, delta) in &deltas {
                rate += w * delta[i];
            }
            *q = value + dt * rate;
        });
        Ok(())
    }

    /// Fold a post-update correction of the current stage into its stored rate.
    ///
    /// Later stages then see Δ + correction/(dt·bᵢ[i]). A zero weight or an
    /// unallocated slot leaves nothing to fold.
    pub fn fold_correction(
        &mut self,
        stepi: usize,
        bi: &[f64],
        dt: f64,
        correction: &[f64],
    ) -> SimResult<()> {
        let b = *bi.get(stepi).ok_or(SimError::Config {
            what: "bi must have one entry per stage up to the current one",
        })?;
        if b == 0.0 || dt <= 0.0 {
            return Ok(());
        }
        if let Some(delta) = self.delta.filled_mut(stepi) {
            let scale = 1.0 / (dt * b);
            delta
                .par_iter_mut()
                .zip(correction.par_iter())
                .for_each(|(d, c)| *d += c * scale);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_only_flagged() {
        let mut arena = SlotArena::new("q");
        arena.allocate(&[true, false, true]);
        assert_eq!(arena.n_steps(), 3);
        assert_eq!(arena.n_allocated(), 2);
        assert!(!arena.is_allocated(1));
    }

    #[test]
    fn empty_and_unallocated_reads_error() {
        let mut arena = SlotArena::new("q");
        arena.allocate(&[true, false]);
        assert!(matches!(arena.get(0), Err(SimError::EmptySlot { stage: 0, .. })));
        assert!(matches!(arena.get(1), Err(SimError::UnallocatedSlot { stage: 1, .. })));
        arena.store(0, &[1.0, 2.0]);
        assert_eq!(arena.get(0).unwrap(), &[1.0, 2.0]);
        arena.mark_empty();
        assert!(arena.get(0).is_err());
    }

    #[test]
    fn euler_stage() {
        let mut f = StagedField::new("q");
        f.set_ode_fields(1, &[false], &[false]).unwrap();
        let mut q = vec![1.0, 2.0];
        f.advance(0, &[], &[1.0], 0.5, &mut q, &[2.0, -2.0]).unwrap();
        assert_eq!(q, vec![2.0, 1.0]);
    }

    #[test]
    fn zero_weight_never_reads() {
        let mut f = StagedField::new("q");
        // SSP-RK2 reads old[0] but never Δ[0]
        f.set_ode_fields(2, &[true, false], &[false, false]).unwrap();
        let mut q = vec![1.0];
        f.advance(0, &[], &[1.0], 0.1, &mut q, &[1.0]).unwrap();
        f.advance(1, &[0.5], &[0.0, 0.5], 0.1, &mut q, &[1.0]).unwrap();
        assert!((q[0] - 1.1).abs() < 1e-14);
    }

    #[test]
    fn nonzero_weight_on_missing_slot_errors() {
        let mut f = StagedField::new("q");
        f.set_ode_fields(2, &[false, false], &[false, false]).unwrap();
        let mut q = vec![1.0];
        f.advance(0, &[], &[1.0], 0.1, &mut q, &[1.0]).unwrap();
        let err = f.advance(1, &[1.0], &[0.5, 0.5], 0.1, &mut q, &[1.0]);
        assert!(matches!(err, Err(SimError::UnallocatedSlot { .. })));
    }

    #[test]
    fn skipping_stage_zero_reads_empty_slot() {
        let mut f = StagedField::new("q");
        f.set_ode_fields(2, &[true, true], &[true, true]).unwrap();
        let mut q = vec![1.0];
        let err = f.advance(1, &[1.0], &[0.5, 0.5], 0.1, &mut q, &[1.0]);
        assert!(matches!(err, Err(SimError::EmptySlot { .. })));
    }

    #[test]
    fn config_errors() {
        let mut f = StagedField::new("q");
        let mut q = vec![1.0];
        assert!(matches!(
            f.advance(0, &[], &[1.0], 0.1, &mut q, &[0.0]),
            Err(SimError::Config { .. })
        ));
        assert!(f.set_ode_fields(2, &[true], &[true, true]).is_err());
        f.set_ode_fields(1, &[false], &[false]).unwrap();
        assert!(matches!(
            f.advance(1, &[1.0], &[0.5, 0.5], 0.1, &mut q, &[0.0]),
            Err(SimError::Config { .. })
        ));
        assert!(matches!(
            f.advance(0, &[1.0], &[1.0], 0.1, &mut q, &[0.0]),
            Err(SimError::Config { .. })
        ));
    }

    #[test]
    fn fold_correction_rescales_rate() {
        let mut f = StagedField::new("q");
        f.set_ode_fields(2, &[true, true], &[true, true]).unwrap();
        let mut q = vec![0.0];
        f.advance(0, &[], &[1.0], 0.5, &mut q, &[1.0]).unwrap();
        f.fold_correction(0, &[1.0], 0.5, &[-0.25]).unwrap();
        assert!((f.delta().get(0).unwrap()[0] - 0.5).abs() < 1e-14);
    }

    #[test]
    fn set_then_clear_restores_state() {
        let fresh = StagedField::new("q");
        let mut f = fresh.clone();
        f.set_ode_fields(3, &[true, true, false], &[true, false, true]).unwrap();
        f.clear_ode_fields();
        assert_eq!(f, fresh);
        // idempotent
        f.clear_ode_fields();
        assert_eq!(f, fresh);
    }
}
