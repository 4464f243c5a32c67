use crate::types::{Annotation, AnnotationLevel};
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

/// One flake8 finding: `path:line:col: CODE description`
///
/// Groups: path (non-greedy), line, column, rule code, description.
/// The description class stops at punctuation, so `line too long (88 > 79)`
/// is captured as `line too long `.
static FINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?):([0-9]+):([0-9]+): ([A-Za-z0-9_][0-9]+) ([\s|A-Za-z0-9_]*)")
        .expect("finding pattern is valid")
});

const LOCAL_DIR_PREFIX: &str = "./";

/// Parse raw flake8 output into annotations, one per matching line, in input order
pub fn parse(raw: &str) -> Vec<Annotation> {
    raw.split('\n').filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<Annotation> {
    let Some(caps) = FINDING.captures(line) else {
        trace!("Skipping line: {:?}", line);
        return None;
    };

    let line_number = parse_number(&caps[2]);
    let column = parse_number(&caps[3]);

    Some(Annotation {
        path: normalize_path(&caps[1]),
        start_line: line_number,
        end_line: line_number,
        start_column: Some(column),
        end_column: Some(column),
        annotation_level: AnnotationLevel::Failure,
        message: format!("[{}] {}", &caps[4], &caps[5]),
        title: None,
    })
}

/// Digit runs only fail to parse on overflow, which saturates
fn parse_number(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

/// Remove the first `./` so GitHub can resolve the path
fn normalize_path(path: &str) -> String {
    path.replacen(LOCAL_DIR_PREFIX, "", 1)
}
