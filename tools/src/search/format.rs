//! Report rendering for aggregated search results.

use std::collections::HashMap;

use trawl_types::{AggregatedResult, Match, SearchOutcome, SearchRequest, SearchResponse};

const BLOCK_DELIMITER: &str = "\n---\n\n";

/// Render `result` as a grouped report plus a short status line.
#[must_use]
pub fn format_response(
    request: &SearchRequest,
    result: &AggregatedResult,
    total_cap: usize,
) -> SearchResponse {
    let filter = request
        .include()
        .map(|glob| format!(" matching \"{glob}\""))
        .unwrap_or_default();
    let scope = request.scope_description();

    if result.is_empty() {
        return SearchResponse {
            report: format!(
                "No matches found for \"{}\" in {scope}{filter}.",
                request.pattern
            ),
            status: "No matches found".to_string(),
            outcome: SearchOutcome::NoMatches,
        };
    }

    let count = result.len();
    let unit = if count == 1 { "match" } else { "matches" };
    let capped = if result.truncated {
        format!(" (results capped at {total_cap}; refine the pattern or narrow the scope)")
    } else {
        String::new()
    };

    let blocks: Vec<String> = group_by_file(&result.matches)
        .into_iter()
        .map(|(path, matches)| render_block(path, &matches))
        .collect();

    let report = format!(
        "Found {count} {unit} for \"{}\" in {scope}{filter}{capped}:\n\n{}",
        request.pattern,
        blocks.join(BLOCK_DELIMITER)
    );
    let status = if result.truncated {
        format!("Found {count} {unit} (limited)")
    } else {
        format!("Found {count} {unit}")
    };

    SearchResponse {
        report,
        status,
        outcome: SearchOutcome::Matches,
    }
}

/// Group matches by file in first-seen order; each group sorted by line number.
fn group_by_file(matches: &[Match]) -> Vec<(&str, Vec<&Match>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&Match>)> = Vec::new();
    for m in matches {
        let slot = *index.entry(m.file_path.as_str()).or_insert_with(|| {
            groups.push((m.file_path.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(m);
    }
    for (_, group) in &mut groups {
        group.sort_by_key(|m| m.line_number);
    }
    groups
}

fn render_block(path: &str, matches: &[&Match]) -> String {
    let mut out = format!("File: {path}\n");
    for m in matches {
        out.push_str(&format!("L{}: {}\n", m.line_number, m.line_text.trim()));
    }
    out.trim_end().to_string()
}
