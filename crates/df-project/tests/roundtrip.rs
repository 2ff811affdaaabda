use df_project::{CaseDef, load_case, load_json, load_yaml, save_json, save_yaml};
use std::path::Path;

fn sample() -> CaseDef {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../cases/tube_ignition.yaml");
    load_yaml(&path).unwrap()
}

#[test]
fn roundtrip_yaml_sample_case() {
    let case = sample();
    let path = std::env::temp_dir().join("df_project_roundtrip.yaml");
    save_yaml(&path, &case).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(case, loaded);
}

#[test]
fn roundtrip_json_sample_case() {
    let case = sample();
    let path = std::env::temp_dir().join("df_project_roundtrip.json");
    save_json(&path, &case).unwrap();
    let loaded = load_json(&path).unwrap();
    assert_eq!(case, loaded);
    assert_eq!(load_case(&path).unwrap(), case);
}

#[test]
fn defaults_fill_omitted_sections() {
    let case = sample();
    let activation = case.activation.as_ref().unwrap();
    assert_eq!(activation.lambda_exponent, 1.0);
    assert!(activation.limit);
    assert!(!activation.advect);
    assert_eq!(case.run.max_steps, 1_000_000);
}

#[test]
fn invalid_case_is_not_saved() {
    let mut case = sample();
    case.run.dt = 0.0;
    let path = std::env::temp_dir().join("df_project_invalid.yaml");
    assert!(save_yaml(&path, &case).is_err());
}

#[test]
fn unknown_law_type_fails_to_parse() {
    let text = std::fs::read_to_string(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../cases/tube_ignition.yaml"),
    )
    .unwrap()
    .replace("type: PressureBased", "type: Quadratic");
    assert!(serde_yaml::from_str::<CaseDef>(&text).is_err());
}
