//! Validating complete plate files against the built-in dialect
use gcode_unextruder::validation::{validate_text, Severity};
use gcode_unextruder::{validate_document, DialectRegistry, Document};

const SAMPLE: &str = include_str!("fixtures/bambu_sample.gcode");
const START_GCODE: &str = include_str!("fixtures/bambu_start_gcode.gcode");

#[test]
fn test_sample_has_no_errors() {
    let registry = DialectRegistry::with_builtin();
    let result = validate_document(&Document::parse(SAMPLE), &registry);

    let errors: Vec<_> = result.errors().collect();
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}

#[test]
fn test_machine_start_script_is_clean() {
    let registry = DialectRegistry::with_builtin();
    let result = validate_text(START_GCODE, &registry);

    assert!(
        result.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        result.diagnostics
    );
}

#[test]
fn test_temperature_flag_takes_no_value() {
    let registry = DialectRegistry::with_builtin();

    assert!(validate_text("M109 S220 A\n", &registry).is_valid());
    assert!(!validate_text("M109 S220 A1\n", &registry).is_valid());
}

#[test]
fn test_broken_blocks_are_reported() {
    let registry = DialectRegistry::with_builtin();
    let text = SAMPLE.replace("; CONFIG_BLOCK_END\n", "");
    let result = validate_text(&text, &registry);

    assert!(!result.is_valid());
    assert!(result
        .errors()
        .any(|d| d.message.contains("EXECUTABLE_BLOCK_START inside CONFIG_BLOCK")));
}

#[test]
fn test_config_problems() {
    let registry = DialectRegistry::with_builtin();
    let text = SAMPLE.replace(
        "; wipe_distance = 2\n",
        "; wipe_distance = 2\n; layer_height = 0.28\n; this line is not a setting\n",
    );
    let result = validate_text(&text, &registry);

    let duplicate = result
        .warnings()
        .find(|d| d.message.contains("Duplicate parameter 'layer_height'"))
        .expect("duplicate warning");
    assert_eq!(duplicate.line, 23);
    assert!(result.errors().any(|d| d.line == 24 && d.message.contains("key = value")));
}

#[test]
fn test_command_problems_carry_line_numbers() {
    let registry = DialectRegistry::with_builtin();
    let text = SAMPLE
        .replace("M106 P3 S200", "M106 P3 S300")
        .replace("M109 S220", "M109 S220\nM9999");
    let result = validate_text(&text, &registry);

    let range_error = result.errors().next().expect("range error");
    assert_eq!(range_error.line, 51);
    assert!(result
        .warnings()
        .any(|d| d.line == 48 && d.message.contains("Unknown command 'M9999'")));
}

#[test]
fn test_label_problems() {
    let registry = DialectRegistry::with_builtin();
    let text = SAMPLE.replacen(
        "; stop printing object, unique label id: 87\n",
        "",
        1,
    );
    let result = validate_text(&text, &registry);

    assert!(result.errors().any(|d| d.line == 71 && d.message.contains("'87'")));
}

#[test]
fn test_diagnostics_are_ordered() {
    let registry = DialectRegistry::with_builtin();
    let result = validate_text("G1\nM9999\nM106 S999\n", &registry);

    let lines: Vec<usize> = result.diagnostics.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![1, 2, 3]);
    assert_eq!(result.diagnostics[2].severity, Severity::Error);
}
