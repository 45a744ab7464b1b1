//! Settings file and command-line precedence
use clap::Parser;
use gcode_unextruder::config::{Args, Command, Config};
use tempfile::TempDir;

fn write_settings(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("unextruder.toml");
    std::fs::write(&path, content).unwrap();
    path.display().to_string()
}

#[test]
fn test_settings_file_is_applied() {
    let dir = TempDir::new().unwrap();
    let settings = write_settings(
        &dir,
        r#"
dialect = "bambu"
plate_entry = "Metadata/plate_3.gcode"
end_marker = "; END_OF_BODY"
residual_extrusion = ".05"
"#,
    );

    let args = Args::try_parse_from(["gcode-unextruder", "--config", settings.as_str(), "a.3mf"]).unwrap();
    let config = Config::from_args(&args).unwrap();

    assert_eq!(config.plate_entry, "Metadata/plate_3.gcode");
    assert_eq!(config.options.end_marker, "; END_OF_BODY");
    assert_eq!(config.options.start_marker, "; MACHINE_START_GCODE_END");
    assert_eq!(config.options.residual_extrusion, ".05");
    assert!(config.config_path.is_some());

    let job = config.job_settings(true);
    assert!(job.dry_run);
    assert_eq!(job.plate_entry, "Metadata/plate_3.gcode");
}

#[test]
fn test_command_line_wins() {
    let dir = TempDir::new().unwrap();
    let settings = write_settings(&dir, "plate_entry = \"Metadata/plate_3.gcode\"\n");

    let args = Args::try_parse_from([
        "gcode-unextruder",
        "unextrude",
        "a.3mf",
        "--plate",
        "2",
        "--config",
        settings.as_str(),
    ])
    .unwrap();
    let config = Config::from_args(&args).unwrap();

    assert!(matches!(args.command, Some(Command::Unextrude(_))));
    assert_eq!(config.plate_entry, "Metadata/plate_2.gcode");
}

#[test]
fn test_bad_settings_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let settings = write_settings(&dir, "plate = 2\n");

    let args = Args::try_parse_from(["gcode-unextruder", "--config", settings.as_str()]).unwrap();
    let error = Config::from_args(&args).unwrap_err();

    assert!(format!("{error:#}").contains("parsing settings file"));
}

#[test]
fn test_missing_settings_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml").display().to_string();

    let args = Args::try_parse_from(["gcode-unextruder", "--config", missing.as_str()]).unwrap();
    assert!(Config::from_args(&args).is_err());
}

#[test]
fn test_subcommands_parse() {
    let args = Args::try_parse_from(["gcode-unextruder", "inspect", "x.gcode", "--json"]).unwrap();
    assert!(matches!(args.command, Some(Command::Inspect { json: true, .. })));

    let args = Args::try_parse_from(["gcode-unextruder", "watch", "/tmp/plates"]).unwrap();
    assert!(matches!(args.command, Some(Command::Watch { .. })));

    assert!(Args::try_parse_from(["gcode-unextruder", "inspect"]).is_err());
}
