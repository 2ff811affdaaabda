//! Case validation logic.

use df_core::ensure_positive;

use crate::schema::{CASE_VERSION, CaseDef, MeshDef, RegionShape, RunDef, StateDef};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    ensure_positive(value, field)
        .map(|_| ())
        .map_err(|e| invalid(field, value, e.to_string()))
}

pub fn validate_case(case: &CaseDef) -> Result<(), ValidationError> {
    if case.version > CASE_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: case.version,
        });
    }
    validate_mesh(&case.mesh)?;

    case.phases
        .phase1
        .validate()
        .map_err(|e| invalid("phases.phase1", case.phases.phase1.name(), e.to_string()))?;
    case.phases
        .phase2
        .validate()
        .map_err(|e| invalid("phases.phase2", case.phases.phase2.name(), e.to_string()))?;
    if case.phases.phase2.is_detonating() {
        return Err(ValidationError::Unsupported {
            feature: "detonating phase2".to_string(),
            reason: "only phase1 may react".to_string(),
        });
    }

    if let Some(activation) = &case.activation {
        if !case.phases.phase1.is_detonating() {
            return Err(ValidationError::Unsupported {
                feature: "activation".to_string(),
                reason: "phase1 must be a detonating blend".to_string(),
            });
        }
        activation
            .validate()
            .map_err(|e| invalid("activation", activation.law.name(), e.to_string()))?;
        for (i, point) in activation.detonation_points.iter().enumerate() {
            if !inside(&case.mesh, point.position) {
                return Err(invalid(
                    format!("activation.detonation_points[{i}].position"),
                    format!("{:?}", point.position),
                    "outside the mesh box",
                ));
            }
            if !point.delay.is_finite() || point.radius < 0.0 || !point.radius.is_finite() {
                return Err(invalid(
                    format!("activation.detonation_points[{i}]"),
                    format!("delay={}, radius={}", point.delay, point.radius),
                    "delay must be finite and radius non-negative",
                ));
            }
        }
    }

    case.numerics
        .validate()
        .map_err(|e| invalid("numerics", format!("{:?}", case.numerics), e.to_string()))?;
    case.scheme
        .validate()
        .map_err(|e| invalid("scheme", case.scheme.name(), e.to_string()))?;

    validate_state("initial.default", &case.initial.default)?;
    for (i, region) in case.initial.regions.iter().enumerate() {
        validate_shape(i, &region.shape)?;
        validate_state(&format!("initial.regions[{i}].state"), &region.state)?;
    }

    validate_run(&case.run)
}

fn inside(mesh: &MeshDef, point: [f64; 3]) -> bool {
    (0..3).all(|i| point[i] >= mesh.lower[i] && point[i] <= mesh.upper[i])
}

fn validate_mesh(mesh: &MeshDef) -> Result<(), ValidationError> {
    if mesh.cells.contains(&0) {
        return Err(invalid(
            "mesh.cells",
            format!("{:?}", mesh.cells),
            "every direction needs at least one cell",
        ));
    }
    for i in 0..3 {
        if !(mesh.upper[i] > mesh.lower[i]) {
            return Err(invalid(
                "mesh.upper",
                format!("{:?}", mesh.upper),
                "upper corner must exceed lower corner",
            ));
        }
    }
    Ok(())
}

fn validate_state(field: &str, state: &StateDef) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&state.alpha) {
        return Err(invalid(format!("{field}.alpha"), state.alpha, "must lie in [0, 1]"));
    }
    for (name, rho) in [("rho1", state.rho1), ("rho2", state.rho2)] {
        if !rho.is_finite() || rho <= 0.0 {
            return Err(invalid(format!("{field}.{name}"), rho, "must be positive"));
        }
    }
    if !state.p.is_finite() {
        return Err(invalid(format!("{field}.p"), state.p, "must be finite"));
    }
    if let Some(t) = state.t {
        if ensure_positive(t, "temperature").is_err() {
            return Err(invalid(format!("{field}.t"), t, "must be positive"));
        }
    }
    if state.velocity.iter().any(|v| !v.is_finite()) {
        return Err(invalid(
            format!("{field}.velocity"),
            format!("{:?}", state.velocity),
            "must be finite",
        ));
    }
    Ok(())
}

fn validate_shape(index: usize, shape: &RegionShape) -> Result<(), ValidationError> {
    let ok = match shape {
        RegionShape::Box { lower, upper } => (0..3).all(|i| upper[i] >= lower[i]),
        RegionShape::Sphere { radius, .. } => radius.is_finite() && *radius >= 0.0,
    };
    if ok {
        Ok(())
    } else {
        Err(invalid(
            format!("initial.regions[{index}].shape"),
            format!("{shape:?}"),
            "empty or inverted region",
        ))
    }
}

fn validate_run(run: &RunDef) -> Result<(), ValidationError> {
    positive("run.dt", run.dt)?;
    if !run.t_end.is_finite() || run.t_end < 0.0 {
        return Err(invalid("run.t_end", run.t_end, "must be non-negative"));
    }
    if run.max_steps == 0 {
        return Err(invalid("run.max_steps", run.max_steps, "must be positive"));
    }
    if run.record_every == 0 {
        return Err(invalid("run.record_every", run.record_every, "must be positive"));
    }
    if let Some(c) = run.max_courant {
        positive("run.max_courant", c)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_case;
    use crate::schema::RegionDef;

    #[test]
    fn sample_case_is_valid() {
        validate_case(&test_case()).unwrap();
    }

    #[test]
    fn future_version_is_rejected() {
        let mut case = test_case();
        case.version = CASE_VERSION + 1;
        assert!(matches!(
            validate_case(&case),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn zero_cells_rejected() {
        let mut case = test_case();
        case.mesh.cells[1] = 0;
        let err = validate_case(&case).unwrap_err();
        assert!(err.to_string().contains("mesh.cells"));
    }

    #[test]
    fn detonation_point_must_be_in_mesh() {
        let mut case = test_case();
        if let Some(act) = &mut case.activation {
            act.detonation_points[0].position = [5.0, 0.0, 0.0];
        }
        let err = validate_case(&case).unwrap_err();
        assert!(err.to_string().contains("outside the mesh box"));
    }

    #[test]
    fn activation_needs_detonating_phase() {
        let mut case = test_case();
        case.phases.phase1 = case.phases.phase2.clone();
        assert!(matches!(
            validate_case(&case),
            Err(ValidationError::Unsupported { .. })
        ));
    }

    #[test]
    fn bad_region_state_is_located() {
        let mut case = test_case();
        let mut state = case.initial.default.clone();
        state.alpha = 1.5;
        case.initial.regions.push(RegionDef {
            shape: RegionShape::Sphere {
                center: [0.0; 3],
                radius: 0.1,
            },
            state,
        });
        let err = validate_case(&case).unwrap_err();
        assert!(err.to_string().contains("initial.regions[0].state.alpha"));
    }

    #[test]
    fn non_positive_temperature_rejected() {
        let mut case = test_case();
        case.initial.default.t = Some(0.0);
        let err = validate_case(&case).unwrap_err();
        assert!(err.to_string().contains("initial.default.t"));
    }

    #[test]
    fn non_positive_dt_rejected() {
        let mut case = test_case();
        case.run.dt = 0.0;
        let err = validate_case(&case).unwrap_err();
        assert!(err.to_string().contains("run.dt"));
    }
}
