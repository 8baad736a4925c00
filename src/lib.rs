#![allow(clippy::module_inception)]

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::errors::errors::{Diagnostic, ErrorTip, Severity};

pub mod ast;
pub mod config;
pub mod errors;
pub mod macros;
pub mod type_checker;

extern crate regex;

/// Byte offset into a named source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::null()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Returns the 1-based line number, the text of the line and the column of
/// `position` within it, or `None` when `position` lies past the end of `content`.
pub fn get_line_at_position(content: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;

    if pos >= content.len() {
        return None;
    }

    let mut start = 0;
    let mut line_number = 1;

    for line in content.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            let line_pos = pos - start;
            return Some((line_number, line.to_string(), line_pos));
        }

        start = end;
        line_number += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    const CONTENT: &str = "Hello, world!\ncontract C {\n\n    uint x;\n}\n";

    #[test]
    fn test_get_line_at_position() {
        let (line_number, line, line_pos) = super::get_line_at_position(CONTENT, 10).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "Hello, world!\n");
        assert_eq!(line_pos, 10);

        let (line_number, line, line_pos) = super::get_line_at_position(CONTENT, 33).unwrap();
        assert_eq!(line_number, 4);
        assert_eq!(line, "    uint x;\n");
        assert_eq!(line_pos, 5);
    }

    #[test]
    fn test_get_line_past_end() {
        assert!(super::get_line_at_position(CONTENT, 400).is_none());
    }

    #[test]
    fn test_remove_starting_whitespace() {
        assert_eq!(super::remove_starting_whitespace("    uint x;"), (String::from("uint x;"), 4));
    }
}

/// Renders a diagnostic the way the command line driver prints it:
///
/// ```text
/// Error: TypeMismatch (Type bool is not implicitly convertible to expected type uint256.)
/// -> token.sol
///    |
/// 20 | uint a = true;
///    | ---------^
/// ```
///
/// The line excerpt is only shown when the source text is available.
pub fn display_error(diagnostic: &Diagnostic, file: &str, source: Option<&str>) -> String {
    let mut output = String::new();
    let label = match diagnostic.severity {
        Severity::Error => "Error",
        Severity::Warning => "Warning",
    };

    if let ErrorTip::None = diagnostic.error.get_tip() {
        output.push_str(&format!("{}: {}\n", label, diagnostic.error.get_error_name()));
    } else {
        output.push_str(&format!(
            "{}: {} ({})\n",
            label,
            diagnostic.error.get_error_name(),
            diagnostic.error.get_tip()
        ));
    }
    output.push_str(&format!("-> {}\n", file));

    let excerpt = source.and_then(|source| get_line_at_position(source, diagnostic.span.start.0));
    let Some((line, line_text, line_pos)) = excerpt else {
        return output;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    output.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    output.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim()));

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;
    output.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));

    output
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}
