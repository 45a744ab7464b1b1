//! Prompt for file paths when none were given on the command line.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const PROMPT: &str = "Enter .3mf file path (or 'q' to quit): ";
const RULE: &str = "------------------------------------------------------------";

/// Strip whitespace and the quotes file managers add around dropped paths
pub fn clean_path(input: &str) -> Option<PathBuf> {
    let trimmed = input.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed)
        .trim();

    if unquoted.is_empty() {
        None
    } else {
        Some(PathBuf::from(unquoted))
    }
}

/// Keep asking for paths until the user quits or input ends.
///
/// `process` returns whether the file was handled; after a success the user is
/// asked whether to continue.
pub fn prompt_loop<R, W>(
    input: &mut R,
    output: &mut W,
    mut process: impl FnMut(&Path) -> bool,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let Some(line) = read_line(input)? else {
            break;
        };
        if line.trim().eq_ignore_ascii_case("q") {
            writeln!(output, "Exiting...")?;
            break;
        }

        let Some(path) = clean_path(&line) else {
            writeln!(output, "No file path entered. Please try again.")?;
            continue;
        };

        if process(&path) {
            writeln!(output, "\n{RULE}")?;
            write!(output, "Process another file? (y/n): ")?;
            output.flush()?;
            match read_line(input)? {
                Some(answer) if answer.trim().eq_ignore_ascii_case("y") => {
                    writeln!(output)?;
                }
                _ => break,
            }
        } else {
            writeln!(output, "\nPlease try again with a valid file.")?;
        }
    }
    Ok(())
}

/// Keep the window open until Enter is pressed
pub fn pause_before_exit<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<()> {
    write!(output, "\nPress Enter to exit...")?;
    output.flush()?;
    read_line(input)?;
    Ok(())
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}
