//! Decoder for the matcher's `<path>:<line>:<content>` output.
//!
//! Match content is arbitrary text and may contain colons, so only the first two
//! delimiters are significant. Lines that do not fit the shape are skipped, never fatal.

use std::num::NonZeroU64;

use trawl_types::Match;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParsedLine {
    Match(Match),
    Skip,
}

/// Parse every match line in `raw`, in output order.
pub(crate) fn parse_output(raw: &str) -> Vec<Match> {
    raw.lines()
        .filter_map(|line| match parse_line(line) {
            ParsedLine::Match(m) => Some(m),
            ParsedLine::Skip => None,
        })
        .collect()
}

pub(crate) fn parse_line(line: &str) -> ParsedLine {
    if line.trim().is_empty() {
        return ParsedLine::Skip;
    }
    let Some(path_end) = path_delimiter(line) else {
        return ParsedLine::Skip;
    };
    let path = &line[..path_end];
    let rest = &line[path_end + 1..];
    let Some(number_end) = rest.find(':') else {
        return ParsedLine::Skip;
    };
    let Some(line_number) = parse_line_number(&rest[..number_end]) else {
        return ParsedLine::Skip;
    };
    if path.is_empty() {
        return ParsedLine::Skip;
    }
    ParsedLine::Match(Match {
        file_path: path.to_string(),
        line_number,
        line_text: rest[number_end + 1..].to_string(),
    })
}

/// Index of the colon that ends the file path.
fn path_delimiter(line: &str) -> Option<usize> {
    let skip = if cfg!(windows) && has_drive_prefix(line) {
        2
    } else {
        0
    };
    line[skip..].find(':').map(|idx| idx + skip)
}

fn has_drive_prefix(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() > 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes[2], b'\\' | b'/')
}

fn parse_line_number(field: &str) -> Option<NonZeroU64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<u64>().ok().and_then(NonZeroU64::new)
}

#[cfg(test)]
mod tests {
    use super::{ParsedLine, has_drive_prefix, parse_line, parse_output};

    fn parsed(line: &str) -> (String, u64, String) {
        match parse_line(line) {
            ParsedLine::Match(m) => (m.file_path, m.line_number.get(), m.line_text),
            ParsedLine::Skip => panic!("expected match for {line:?}"),
        }
    }

    #[test]
    fn parses_simple_line() {
        assert_eq!(
            parsed("/a/b.txt:3:a foo bar"),
            ("/a/b.txt".to_string(), 3, "a foo bar".to_string())
        );
    }

    #[test]
    fn keeps_colons_in_content() {
        assert_eq!(
            parsed("/src/main.rs:12:    let url = \"http://x:80\";"),
            (
                "/src/main.rs".to_string(),
                12,
                "    let url = \"http://x:80\";".to_string()
            )
        );
    }

    #[test]
    fn keeps_surrounding_whitespace_in_content() {
        let (_, _, text) = parsed("/a.txt:1:\t  indented  ");
        assert_eq!(text, "\t  indented  ");
    }

    #[test]
    fn empty_content_is_a_match() {
        assert_eq!(
            parsed("/a.txt:7:"),
            ("/a.txt".to_string(), 7, String::new())
        );
    }

    #[test]
    fn skips_malformed_lines() {
        assert_eq!(parse_line("no delimiters at all"), ParsedLine::Skip);
        assert_eq!(parse_line("/a.txt:12"), ParsedLine::Skip);
        assert_eq!(parse_line("/a.txt:twelve:foo"), ParsedLine::Skip);
        assert_eq!(parse_line("/a.txt::foo"), ParsedLine::Skip);
        assert_eq!(parse_line("/a.txt:-3:foo"), ParsedLine::Skip);
        assert_eq!(parse_line("/a.txt:+3:foo"), ParsedLine::Skip);
        assert_eq!(parse_line("/a.txt:0:foo"), ParsedLine::Skip);
        assert_eq!(parse_line(":3:foo"), ParsedLine::Skip);
        assert_eq!(parse_line("   "), ParsedLine::Skip);
    }

    #[test]
    fn malformed_lines_do_not_disturb_neighbours() {
        let raw = "/a.txt:1:first\n/a.txt:x:bad\n\n/b.txt:2:second:with:colons\ngarbage\n";
        let matches = parse_output(raw);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].file_path, "/a.txt");
        assert_eq!(matches[0].line_text, "first");
        assert_eq!(matches[1].file_path, "/b.txt");
        assert_eq!(matches[1].line_number.get(), 2);
        assert_eq!(matches[1].line_text, "second:with:colons");
    }

    #[test]
    fn handles_crlf_terminators() {
        let matches = parse_output("/a.txt:1:one\r\n/a.txt:2:two\r\n");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].line_text, "one");
        assert_eq!(matches[1].line_text, "two");
    }

    #[test]
    fn preserves_discovery_order() {
        let matches = parse_output("/a/b.txt:3:a foo bar\n/a/b.txt:1:foo at start\n");
        let lines: Vec<u64> = matches.iter().map(|m| m.line_number.get()).collect();
        assert_eq!(lines, vec![3, 1]);
    }

    #[test]
    fn detects_drive_prefix() {
        assert!(has_drive_prefix(r"C:\src\a.rs:1:x"));
        assert!(has_drive_prefix("d:/src/a.rs:1:x"));
        assert!(!has_drive_prefix("/src/a.rs:1:x"));
        assert!(!has_drive_prefix("ab:1:x"));
    }

    #[cfg(windows)]
    #[test]
    fn windows_drive_letter_is_part_of_path() {
        assert_eq!(
            parsed(r"C:\src\a.rs:4:fn main()"),
            (r"C:\src\a.rs".to_string(), 4, "fn main()".to_string())
        );
    }
}
