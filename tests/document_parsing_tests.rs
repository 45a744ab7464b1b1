//! Parsing a complete BambuStudio plate file
use gcode_unextruder::document::{parse_duration, BlockKind, Document, Section};
use std::time::Duration;

const SAMPLE: &str = include_str!("fixtures/bambu_sample.gcode");

#[test]
fn test_blocks_and_sections() {
    let doc = Document::parse(SAMPLE);

    assert_eq!(doc.lines.len(), 87);
    assert_eq!(doc.blocks.len(), 3);
    assert_eq!(doc.block(BlockKind::Header).unwrap().end_line, Some(10));
    assert_eq!(doc.block(BlockKind::Config).unwrap().start_line, 12);
    assert_eq!(doc.block(BlockKind::Executable).unwrap().end_line, Some(87));

    assert_eq!(doc.line(11).unwrap().section, Section::Outside);
    assert_eq!(doc.line(17).unwrap().section, Section::Config);
    assert_eq!(doc.line(63).unwrap().section, Section::Executable);
}

#[test]
fn test_header_statistics() {
    let doc = Document::parse(SAMPLE);
    let header = &doc.header;

    assert_eq!(header.generator(), Some("BambuStudio 01.09.07.52"));
    assert_eq!(header.total_layers(), Some(3));
    assert_eq!(header.filament_weight(), Some(1.23));
    assert_eq!(header.get("max_z_height"), Some("0.60"));
    assert_eq!(
        header.estimated_time().and_then(parse_duration),
        Some(Duration::from_secs(18 * 60 + 41))
    );
    assert_eq!(
        header.model_printing_time().and_then(parse_duration),
        Some(Duration::from_secs(12 * 60 + 5))
    );
}

#[test]
fn test_slicer_parameters() {
    let doc = Document::parse(SAMPLE);
    let config = &doc.config;

    assert_eq!(config.len(), 10);
    assert!(config.malformed.is_empty());
    assert!(config.duplicates().is_empty());
    assert_eq!(config.get("bed_type"), Some("Textured PEI Plate"));
    assert_eq!(config.get_unquoted("curr_bed_type"), Some("Textured PEI Plate"));
    assert_eq!(config.get_f64("layer_height"), Some(0.2));
    assert_eq!(config.get_bool("enable_support"), Some(false));
    assert_eq!(config.get_list("printable_area").map(|l| l.len()), Some(4));
    assert_eq!(config.get("missing_key"), None);
}

#[test]
fn test_object_labels() {
    let doc = Document::parse(SAMPLE);

    assert!(doc.label_problems.is_empty());
    assert_eq!(doc.labels.len(), 2);
    let first = &doc.labels[0];
    assert_eq!(first.id, "87");
    assert_eq!(first.tag_line, Some(56));
    assert_eq!((first.start_line, first.end_line), (57, Some(66)));

    assert_eq!(doc.labels_for_line(63).len(), 1);
    assert!(doc.labels_for_line(68).is_empty());
}

#[test]
fn test_summary_counts_program_commands() {
    let summary = Document::parse(SAMPLE).summary();

    assert_eq!(summary.line_count, 87);
    assert_eq!(summary.parameter_count, 10);
    assert_eq!(summary.command_counts.get("M624"), Some(&2));
    assert_eq!(summary.command_counts.get("G2"), Some(&1));
    assert_eq!(summary.labels.len(), 2);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["generator"], "BambuStudio 01.09.07.52");
}

#[test]
fn test_round_trip_is_byte_exact() {
    assert_eq!(Document::parse(SAMPLE).to_text(), SAMPLE);

    let crlf = SAMPLE.replace('\n', "\r\n");
    let doc = Document::parse(&crlf);
    assert_eq!(doc.to_text(), crlf);
    assert_eq!(doc.header.total_layers(), Some(3));
    assert_eq!(doc.labels.len(), 2);
}

#[test]
fn test_plain_gcode_without_blocks() {
    let doc = Document::parse("G28\nG1 X10 Y10 E1\n");

    assert!(!doc.has_blocks());
    assert_eq!(doc.program_lines().count(), 2);
    assert!(doc.header.entries.is_empty());
}
