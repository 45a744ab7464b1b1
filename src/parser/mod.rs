//! GCode Parser
//!
//! Clean, fast parsing of GCode lines.
//! Focused solely on tokenization and AST construction.

pub mod ast;
pub mod lexer;

pub use ast::{Command, Comment, Parameter, ParsedLine};
pub use lexer::{tokenize_line, Token, TokenKind};

/// Parse a single line of GCode into structured data
///
/// This is the main entry point for parsing. It tokenizes the line
/// and constructs a simple AST representation.
pub fn parse_line(line: &str) -> ParsedLine {
    let tokens = lexer::tokenize_line(line);
    ast::tokens_to_parsed_line(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extrusion_move_keeps_field_spans() {
        let line = "G1 X137.796 Y118.204 E.72975";
        let cmd = parse_line(line).as_command().cloned().expect("command");

        assert_eq!(cmd.name, "G1");
        let e = cmd.get('E').expect("E field");
        assert_eq!(e.value, ".72975");
        assert_eq!(&line[e.start..e.end], "E.72975");
        assert_eq!(e.as_f64(), Some(0.72975));
    }

    #[test]
    fn test_move_with_trailing_comment() {
        let ParsedLine::Command(cmd) = parse_line("G1 X10 Y10 E.5 ; outer wall") else {
            panic!("Expected command");
        };
        assert_eq!(cmd.parameters.len(), 3);
        assert_eq!(cmd.comment.map(|c| c.text), Some(" outer wall".to_string()));
    }

    #[test]
    fn test_block_delimiter_is_a_comment() {
        let ParsedLine::Comment(comment) = parse_line("; CONFIG_BLOCK_START\r") else {
            panic!("Expected comment");
        };
        assert_eq!(comment.text, " CONFIG_BLOCK_START");
    }

    #[test]
    fn test_object_tag_payload_is_verbatim() {
        let result = parse_line("M624 AQAAAAAAAAA=");
        let cmd = result.as_command().expect("command");

        assert_eq!(cmd.mnemonic(), "M624");
        assert_eq!(cmd.get('A').unwrap().value, "QAAAAAAAAA=");
        assert!(!cmd.get('A').unwrap().is_numeric());
    }

    #[test]
    fn test_blank_and_indented_lines() {
        assert!(matches!(parse_line("   "), ParsedLine::Empty));
        assert!(matches!(parse_line("\r"), ParsedLine::Empty));
        assert_eq!(
            parse_line("    G29.2 S0").as_command().map(Command::mnemonic),
            Some("G29.2".to_string())
        );
    }

    #[test]
    fn test_vendor_calibration_command() {
        let result = parse_line("M983 F3.333 A0.3 H0.4 ; extrusion cali");
        let cmd = result.as_command().expect("command");
        assert_eq!(cmd.mnemonic(), "M983");
        assert_eq!(cmd.parameters.len(), 3);
        assert_eq!(cmd.get('H').unwrap().value, "0.4");
    }
}
