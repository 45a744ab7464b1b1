//! Loading user dialect files next to the built-in one
use gcode_unextruder::dialect::{DialectRegistry, ParameterType, DIALECT_FILE_SUFFIX};
use gcode_unextruder::validation::validate_text;
use gcode_unextruder::Error;
use tempfile::TempDir;

const KLIPPER: &str = r#"
[dialect]
name = "klipper"
version = "0.1"

[[commands]]
name = "G1"
description_short = "Linear move"

[[commands.parameters]]
name = "X"
type = "float"
description = "X position"

[[commands]]
name = "SET_PRESSURE_ADVANCE"
"#;

const BAMBU_EXTRA: &str = r#"
[dialect]
name = "bambu"

[[commands]]
name = "M9999"
description_short = "Site-specific macro"

[[commands.parameters]]
name = "S"
type = "string"
description = "Mode"
constraints = { enum_values = ["1", "2"] }
"#;

#[test]
fn test_load_dir_adds_dialects() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(format!("klipper{DIALECT_FILE_SUFFIX}")), KLIPPER).unwrap();
    std::fs::write(dir.path().join("notes.toml"), "not a dialect").unwrap();

    let mut registry = DialectRegistry::with_builtin();
    let loaded = registry.load_dir(dir.path()).unwrap();

    assert_eq!(loaded, vec!["klipper".to_string()]);
    assert_eq!(registry.list_dialects(), vec!["bambu", "klipper"]);
    assert_eq!(registry.get_active_dialect().unwrap().name, "bambu");

    assert!(registry.set_active_dialect("klipper"));
    let g1 = registry.get_command("g1").unwrap();
    assert_eq!(g1.parameters.as_ref().unwrap()[0].param_type, ParameterType::Float);
    assert!(registry.get_command("M624").is_none());
}

#[test]
fn test_same_name_overlays_builtin() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(format!("site{DIALECT_FILE_SUFFIX}")), BAMBU_EXTRA).unwrap();

    let mut registry = DialectRegistry::with_builtin();
    registry.load_dir(dir.path()).unwrap();

    assert!(registry.get_command("M9999").is_some());
    assert!(registry.get_command("M624").is_some());

    assert!(validate_text("M9999 S2\n", &registry).is_valid());
    assert!(!validate_text("M9999 S3\n", &registry).is_valid());
}

#[test]
fn test_missing_dir_is_empty() {
    let dir = TempDir::new().unwrap();
    let mut registry = DialectRegistry::new();

    let loaded = registry.load_dir(&dir.path().join("nope")).unwrap();
    assert!(loaded.is_empty());
}

#[test]
fn test_invalid_dialect_file_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(format!("broken{DIALECT_FILE_SUFFIX}"));
    std::fs::write(&path, "[dialect]\nversion = 1\n").unwrap();

    let mut registry = DialectRegistry::with_builtin();
    match registry.load_dir(dir.path()) {
        Err(Error::Dialect { name, .. }) => assert!(name.ends_with("broken.gcode-dialect.toml")),
        other => panic!("expected dialect error, got {other:?}"),
    }
}
