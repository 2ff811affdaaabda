use df_project::{build_case, load_case};
use df_sim::{SimOptions, run_sim};
use std::path::Path;

#[test]
fn sample_cases_load_build_and_step() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../cases");
    let cases = ["tube_ignition.yaml", "advected_interface.yaml"];

    for name in cases {
        let path = root.join(name);
        let def = load_case(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        let mut case =
            build_case(&def).unwrap_or_else(|e| panic!("Failed to build {}: {}", name, e));

        // a few steps only; the full runs belong to the CLI
        let opts = SimOptions {
            t_end: 5.0 * case.options.dt,
            ..case.options.clone()
        };
        let summary = run_sim(&mut case.system, &case.scheme, &opts)
            .unwrap_or_else(|e| panic!("Failed to run {}: {}", name, e));
        assert!(summary.steps >= 5, "{name}");
        assert!(case.system.p().iter().all(|p| p.is_finite() && *p > 0.0), "{name}");
    }
}

#[test]
fn ignition_region_starts_reacted() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../cases/tube_ignition.yaml");
    let case = build_case(&load_case(&path).unwrap()).unwrap();
    let lambda = case.system.lambda().unwrap();
    assert_eq!(&lambda[..2], &[1.0, 1.0]);
    assert!(lambda[2..].iter().all(|&l| l == 0.0));
}

#[test]
fn interface_region_is_applied() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../cases/advected_interface.yaml");
    let case = build_case(&load_case(&path).unwrap()).unwrap();
    let alpha = case.system.alpha();
    assert!((alpha[30] - 0.99).abs() < 1e-12);
    assert!((alpha[60] - 0.01).abs() < 1e-12);
    assert!(case.system.lambda().is_none());
}
