//! GCode Lexer
//!
//! Fast, simple tokenization of GCode lines.
//! Tokens carry their byte span so rewrites can splice the original text.

/// Token types in GCode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// Command like "G1", "M104", "G29.1"
    Command,
    /// Parameter like "X10", "S255", or a vendor word like "AQAAAAAAAAA="
    Parameter,
    /// Comment (semicolon or parenthetical)
    Comment,
}

/// A token with its text content and byte span within the line
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize, // byte offset
    pub end: usize,   // byte offset (exclusive)
}

/// Tokenize a line of GCode into tokens
pub fn tokenize_line(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some((start_idx, ch)) = chars.next() {
        match ch {
            // Skip whitespace
            ' ' | '\t' | '\r' | '\n' => continue,

            // Semicolon comment: consume rest of line
            ';' => {
                let text = line[start_idx..].trim_end_matches(['\r', '\n']);
                tokens.push(Token {
                    kind: TokenKind::Comment,
                    text: text.to_string(),
                    start: start_idx,
                    end: start_idx + text.len(),
                });
                break; // Rest of line is comment
            }

            // Parenthetical comment
            '(' => {
                let mut end_idx = line.len();

                for (idx, ch) in chars.by_ref() {
                    if ch == ')' {
                        end_idx = idx + 1;
                        break;
                    }
                }

                tokens.push(Token {
                    kind: TokenKind::Comment,
                    text: line[start_idx..end_idx].to_string(),
                    start: start_idx,
                    end: end_idx,
                });
            }

            // Letter starts command or parameter
            c if c.is_ascii_alphabetic() => {
                let mut end_idx = start_idx + 1;

                // Numbers, signs, and the base64/identifier characters vendor codes use
                while let Some(&(idx, next_ch)) = chars.peek() {
                    if next_ch.is_ascii_alphanumeric()
                        || matches!(next_ch, '.' | '-' | '+' | '_' | '/' | '=')
                    {
                        end_idx = idx + 1;
                        chars.next();
                    } else {
                        break;
                    }
                }

                let text = &line[start_idx..end_idx];
                let kind = if is_command(text) {
                    TokenKind::Command
                } else {
                    TokenKind::Parameter
                };

                tokens.push(Token {
                    kind,
                    text: text.to_string(),
                    start: start_idx,
                    end: end_idx,
                });
            }

            // Skip other characters (vendor syntax such as "M1002 gcode_claim_action : 2")
            _ => continue,
        }
    }

    tokens
}

/// Determine if a token is a command
///
/// G/M/T followed by a number ("G1", "M970.3", "T1000"). Words like
/// "g29_before_print_flag" in vendor arguments are parameters.
fn is_command(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first_char) = chars.next() else {
        return false;
    };
    if !matches!(first_char.to_ascii_uppercase(), 'G' | 'M' | 'T') {
        return false;
    }

    let rest = chars.as_str();
    rest.starts_with(|c: char| c.is_ascii_digit())
        && rest.chars().all(|c| c.is_ascii_digit() || c == '.')
}
