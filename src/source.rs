//! Source normalization: comments and blank lines are dropped, and the
//! mandatory `ORG` header is checked and consumed.

use crate::asm::AsmError;
use crate::parse::parse_hex;
use crate::word::Word;

/// A trimmed, comment-free source line and its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub text: String,
}

/// Strips `;` comments, trims, and drops empty lines.
pub fn strip(src: &str) -> Vec<Line> {
    src.lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let code = raw.split(';').next().unwrap_or("").trim();
            (!code.is_empty()).then(|| Line { number: i + 1, text: code.to_string() })
        })
        .collect()
}

/// Normalizes `src` and checks that its first line is `ORG x<origin>`. The
/// header line is not part of the result.
pub fn normalize(src: &str, origin: Word) -> Result<Vec<Line>, AsmError> {
    let mut lines = strip(src);
    if lines.is_empty() {
        return Err(AsmError::EmptyProgram);
    }
    let first = lines.remove(0);
    if header_origin(&first.text) != Some(origin) {
        return Err(AsmError::MissingOrigin { line: first.number, origin });
    }
    tracing::debug!(lines = lines.len(), origin = format_args!("{origin:#06x}"), "normalized source");
    Ok(lines)
}

fn header_origin(text: &str) -> Option<Word> {
    let mut tokens = text.split_whitespace();
    let mnemonic = tokens.next()?;
    let literal = tokens.next()?;
    if !mnemonic.eq_ignore_ascii_case("ORG") || tokens.next().is_some() {
        return None;
    }
    // the header must spell the address in hex
    if !literal.starts_with(|c: char| c == 'x' || c == 'X') {
        return None;
    }
    let value = parse_hex(literal)?;
    Word::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_comments_and_blanks() {
        let src = "; header\n  ORG x3000 ; start\n\n\tADD R1, R1, R0;sum\n   ;\nEND";
        let lines = strip(src);
        assert_eq!(
            lines,
            vec![
                Line { number: 2, text: "ORG x3000".into() },
                Line { number: 4, text: "ADD R1, R1, R0".into() },
                Line { number: 6, text: "END".into() },
            ]
        );
    }

    #[test]
    fn header_is_case_insensitive() {
        let lines = normalize("org X3000\nHALT", 0x3000).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "HALT");
    }

    #[test]
    fn header_must_match_origin() {
        assert_eq!(
            normalize("ORG x4000\nHALT", 0x3000),
            Err(AsmError::MissingOrigin { line: 1, origin: 0x3000 })
        );
        assert_eq!(
            normalize("\n\nHALT\nORG x3000", 0x3000),
            Err(AsmError::MissingOrigin { line: 3, origin: 0x3000 })
        );
        assert_eq!(normalize("ORG 3000\nHALT", 0x3000).unwrap_err(), AsmError::MissingOrigin { line: 1, origin: 0x3000 });
    }

    #[test]
    fn comment_only_source_is_empty() {
        assert_eq!(normalize(" ; nothing\n\n", 0x3000), Err(AsmError::EmptyProgram));
        assert_eq!(normalize("", 0x3000), Err(AsmError::EmptyProgram));
    }
}
