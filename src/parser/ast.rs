//! Abstract Syntax Tree for GCode
//!
//! Clean, minimal types representing parsed GCode structure.
//! No validation logic - pure data representation.

use std::sync::LazyLock;

use regex::Regex;

use crate::parser::lexer::{Token, TokenKind};

static NUMERIC_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)$").expect("valid numeric regex"));

/// A parsed line of GCode
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// A GCode command with parameters and optional comment
    Command(Command),
    /// A comment-only line
    Comment(Comment),
    /// An empty or whitespace-only line
    Empty,
}

impl ParsedLine {
    pub fn as_command(&self) -> Option<&Command> {
        match self {
            ParsedLine::Command(cmd) => Some(cmd),
            _ => None,
        }
    }

    pub fn as_comment_only(&self) -> Option<&Comment> {
        match self {
            ParsedLine::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    /// The comment carried by this line, whether comment-only or trailing a command
    pub fn comment(&self) -> Option<&Comment> {
        match self {
            ParsedLine::Command(cmd) => cmd.comment.as_ref(),
            ParsedLine::Comment(comment) => Some(comment),
            ParsedLine::Empty => None,
        }
    }
}

/// A GCode command like "G1" or "M104"
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Command name as written (e.g., "G1", "M104")
    pub name: String,
    /// Command parameters (e.g., X10, Y20)
    pub parameters: Vec<Parameter>,
    /// Optional trailing comment
    pub comment: Option<Comment>,
}

impl Command {
    /// Upper-cased command name used for dialect lookups
    pub fn mnemonic(&self) -> String {
        self.name.to_ascii_uppercase()
    }

    /// First parameter with the given letter (case-sensitive)
    pub fn get(&self, letter: char) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.letter == letter)
    }

    /// Whether the command is a `G` code ("G1", "G92", "G29.1")
    pub fn is_g_code(&self) -> bool {
        self.name.starts_with(['G', 'g'])
    }
}

/// A command parameter like "X10" or "S255"
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter letter (e.g., 'X', 'Y', 'S')
    pub letter: char,
    /// Parameter value as string (parsing to numbers happens on demand)
    pub value: String,
    /// Byte span of the whole field ("E1.25") within the line
    pub start: usize,
    pub end: usize,
}

impl Parameter {
    /// Whether the value is a plain decimal number such as "10", "-2.5" or ".01"
    pub fn is_numeric(&self) -> bool {
        NUMERIC_VALUE.is_match(&self.value)
    }

    pub fn as_f64(&self) -> Option<f64> {
        if self.is_numeric() {
            self.value.parse().ok()
        } else {
            None
        }
    }
}

/// A comment (semicolon or parenthetical)
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Comment text (without the delimiters)
    pub text: String,
}

/// Convert tokens into a parsed line
pub fn tokens_to_parsed_line(tokens: Vec<Token>) -> ParsedLine {
    if tokens.is_empty() {
        return ParsedLine::Empty;
    }

    // Find command token
    let command_token = tokens.iter().find(|t| t.kind == TokenKind::Command);

    if let Some(cmd_token) = command_token {
        // Parameters only count after the command word; later command-like
        // words ("M60" in "M1006 ... M60 E37") are parameters too
        let parameters: Vec<Parameter> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Comment && t.start > cmd_token.start)
            .filter_map(parse_parameter_token)
            .collect();

        // Extract comment
        let comment = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Comment)
            .map(|t| Comment {
                text: extract_comment_text(&t.text),
            });

        ParsedLine::Command(Command {
            name: cmd_token.text.clone(),
            parameters,
            comment,
        })
    } else if let Some(comment_token) = tokens.iter().find(|t| t.kind == TokenKind::Comment) {
        ParsedLine::Comment(Comment {
            text: extract_comment_text(&comment_token.text),
        })
    } else {
        ParsedLine::Empty
    }
}

/// Parse a parameter token like "X10.5" into a Parameter
fn parse_parameter_token(token: &Token) -> Option<Parameter> {
    let mut chars = token.text.chars();
    let letter = chars.next()?;

    if !letter.is_ascii_alphabetic() {
        return None;
    }

    Some(Parameter {
        letter,
        value: chars.as_str().to_string(),
        start: token.start,
        end: token.end,
    })
}

/// Extract comment text, removing delimiters
fn extract_comment_text(text: &str) -> String {
    if let Some(stripped) = text.strip_prefix(';') {
        stripped.to_string()
    } else if text.starts_with('(') && text.ends_with(')') && text.len() >= 2 {
        text[1..text.len() - 1].to_string()
    } else if let Some(stripped) = text.strip_prefix('(') {
        stripped.to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize_line;

    fn token(kind: TokenKind, text: &str, start: usize) -> Token {
        Token {
            kind,
            text: text.to_string(),
            start,
            end: start + text.len(),
        }
    }

    #[test]
    fn test_parse_parameter_token() {
        let param = parse_parameter_token(&token(TokenKind::Parameter, "X10.5", 3)).unwrap();
        assert_eq!(param.letter, 'X');
        assert_eq!(param.value, "10.5");
        assert_eq!((param.start, param.end), (3, 8));
    }

    #[test]
    fn test_bare_letter_is_a_parameter_without_value() {
        let param = parse_parameter_token(&token(TokenKind::Parameter, "X", 4)).unwrap();
        assert_eq!(param.value, "");
        assert!(!param.is_numeric());
    }

    #[test]
    fn test_extract_semicolon_comment() {
        let text = extract_comment_text("; this is a comment");
        assert_eq!(text, " this is a comment");
    }

    #[test]
    fn test_extract_paren_comment() {
        let text = extract_comment_text("(this is a comment)");
        assert_eq!(text, "this is a comment");
    }

    #[test]
    fn test_tokens_to_command() {
        let tokens = vec![
            token(TokenKind::Command, "G1", 0),
            token(TokenKind::Parameter, "X10", 3),
            token(TokenKind::Parameter, "Y20", 7),
        ];

        let result = tokens_to_parsed_line(tokens);

        if let ParsedLine::Command(cmd) = result {
            assert_eq!(cmd.name, "G1");
            assert_eq!(cmd.parameters.len(), 2);
            assert_eq!(cmd.parameters[0].letter, 'X');
            assert_eq!(cmd.parameters[0].value, "10");
        } else {
            panic!("Expected command");
        }
    }

    #[test]
    fn test_numeric_values() {
        let ParsedLine::Command(cmd) = tokens_to_parsed_line(tokenize_line(
            "G1 X.5 Y-10 Z+2. E1.25 F3e2 A=",
        )) else {
            panic!("Expected command");
        };

        assert_eq!(cmd.get('X').and_then(Parameter::as_f64), Some(0.5));
        assert_eq!(cmd.get('Y').and_then(Parameter::as_f64), Some(-10.0));
        assert_eq!(cmd.get('Z').and_then(Parameter::as_f64), Some(2.0));
        assert_eq!(cmd.get('E').and_then(Parameter::as_f64), Some(1.25));
        assert_eq!(cmd.get('F').and_then(Parameter::as_f64), None);
        assert!(!cmd.get('A').unwrap().is_numeric());
    }

    #[test]
    fn test_words_before_command_are_not_parameters() {
        let ParsedLine::Command(cmd) = tokens_to_parsed_line(tokenize_line("N10 G1 X1")) else {
            panic!("Expected command");
        };
        assert_eq!(cmd.parameters.len(), 1);
        assert_eq!(cmd.parameters[0].letter, 'X');
    }

    #[test]
    fn test_command_like_words_after_command_are_parameters() {
        let line = "M1006 A0 B10 L100 C37 D10 M60 E37 F10 N60";
        let ParsedLine::Command(cmd) = tokens_to_parsed_line(tokenize_line(line)) else {
            panic!("Expected command");
        };
        assert_eq!(cmd.name, "M1006");
        assert_eq!(cmd.parameters.len(), 9);
        assert_eq!(cmd.get('M').unwrap().value, "60");
    }
}
