//! Boundary-aware shortening of oversized diffs.
//!
//! A plain head cut drops the file headers and the end of the diff, which is
//! where a message generator finds most of its signal. Instead the budget is
//! split into a verbatim head (40%), the diff-structural lines from the
//! middle (30%), and a verbatim tail (30%), separated by [`TRUNCATION_MARKER`].
//! Lengths are counted in chars.

/// Inserted wherever text was dropped.
pub const TRUNCATION_MARKER: &str = "\n[... truncated ...]\n";

/// Below this many chars of content there is no room for three segments.
const MIN_SEGMENTED_BUDGET: usize = 60;

const STRUCTURAL_PREFIXES: [&str; 4] = ["diff --git", "+++ ", "--- ", "@@"];

/// Shorten `diff` to at most `max_length` chars.
///
/// Input that already fits is returned unchanged. Otherwise the result holds
/// at least one marker and is never longer than `max_length`, except when
/// `max_length` is smaller than the marker itself.
pub fn smart_truncate_diff(diff: &str, max_length: usize) -> String {
    let total = diff.chars().count();
    if total <= max_length {
        return diff.to_string();
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    let available = max_length.saturating_sub(2 * marker_len);

    if available < MIN_SEGMENTED_BUDGET {
        let head = take_chars(diff, max_length.saturating_sub(marker_len));
        return format!("{head}{TRUNCATION_MARKER}");
    }

    let head_budget = available * 4 / 10;
    let middle_budget = available * 3 / 10;
    let tail_budget = available - head_budget - middle_budget;

    let head = take_chars(diff, head_budget);
    let tail = skip_chars(diff, total - tail_budget);
    let middle_source = take_chars(skip_chars(diff, head_budget), total - head_budget - tail_budget);
    let middle = structural_lines(middle_source, !head.ends_with('\n'), middle_budget);

    if middle.is_empty() {
        format!("{head}{TRUNCATION_MARKER}{tail}")
    } else {
        format!("{head}{TRUNCATION_MARKER}{middle}{TRUNCATION_MARKER}{tail}")
    }
}

/// File and hunk headers from `source`, joined by newlines, within `budget` chars.
fn structural_lines(source: &str, skip_partial_first: bool, budget: usize) -> String {
    let mut out = String::new();
    let mut used = 0;

    let lines = source.lines().skip(usize::from(skip_partial_first));
    for line in lines.filter(|l| STRUCTURAL_PREFIXES.iter().any(|p| l.starts_with(p))) {
        let separator = usize::from(!out.is_empty());
        let cost = line.chars().count() + separator;
        if used + cost > budget {
            break;
        }
        if separator == 1 {
            out.push('\n');
        }
        out.push_str(line);
        used += cost;
    }

    out
}

fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn skip_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[idx..],
        None => "",
    }
}
