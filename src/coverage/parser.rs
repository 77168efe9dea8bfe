//! Extract a coverage percentage from raw job log text.
//!
//! Each supported tool prints its summary in a recognisable shape; the parser
//! scans line by line and keeps the last match, since test runners frequently
//! print intermediate per-package figures before the final total.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageTool {
    Istanbul,
    CoveragePy,
    Go,
    Lcov,
    Tarpaulin,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub tool: CoverageTool,
    pub percent: f64,
    /// The cleaned log line the figure came from
    pub line: String,
}

// ANSI colour codes first, then the Actions timestamp prefix.
static CLEANERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\x1b\[[0-9;]*[A-Za-z]",
        r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z\s?",
    ]
    .into_iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

// Tried in order on each line; the generic pattern must stay last.
static PATTERNS: LazyLock<Vec<(CoverageTool, Regex)>> = LazyLock::new(|| {
    [
        (CoverageTool::Istanbul, r"^All files\s*\|\s*(\d+(?:\.\d+)?)\s*\|"),
        (CoverageTool::CoveragePy, r"^TOTAL(?:\s+\d+)+\s+(\d+(?:\.\d+)?)%\s*$"),
        (CoverageTool::Go, r"coverage:\s*(\d+(?:\.\d+)?)%\s+of statements"),
        (CoverageTool::Lcov, r"^lines\.+:\s*(\d+(?:\.\d+)?)%"),
        (
            CoverageTool::Tarpaulin,
            r"(\d+(?:\.\d+)?)%\s+coverage,\s*\d+/\d+\s+lines covered",
        ),
        (CoverageTool::Generic, r"(?i)\bcoverage\s*[:=]\s*(\d+(?:\.\d+)?)\s*%"),
    ]
    .into_iter()
    .filter_map(|(tool, pattern)| Regex::new(pattern).ok().map(|regex| (tool, regex)))
    .collect()
});

/// Strip the Actions timestamp prefix and terminal colour codes.
pub fn clean_line(line: &str) -> String {
    let mut cleaned = line.to_string();
    for pattern in CLEANERS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned.trim().to_string()
}

fn parse_line(line: &str) -> Option<CoverageReport> {
    for (tool, pattern) in PATTERNS.iter() {
        let Some(captures) = pattern.captures(line) else {
            continue;
        };
        let percent: f64 = captures.get(1)?.as_str().parse().ok()?;
        if !(0.0..=100.0).contains(&percent) {
            return None;
        }
        return Some(CoverageReport {
            tool: *tool,
            percent,
            line: line.to_string(),
        });
    }
    None
}

/// The last coverage summary found in `log`, if any.
pub fn parse_coverage(log: &str) -> Option<CoverageReport> {
    log.lines()
        .map(clean_line)
        .filter(|line| !line.is_empty())
        .filter_map(|line| parse_line(&line))
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_istanbul_table() {
        let log = "\
2024-03-01T10:00:00.1234567Z ----------|---------|----------|---------|---------|
2024-03-01T10:00:00.1234567Z File      | % Stmts | % Branch | % Funcs | % Lines |
2024-03-01T10:00:00.1234567Z All files |   85.5  |    70.12 |   90    |   86.01 |
2024-03-01T10:00:00.1234567Z  index.js |   85.5  |    70.12 |   90    |   86.01 |";
        let report = parse_coverage(log).unwrap();
        assert_eq!(report.tool, CoverageTool::Istanbul);
        assert_eq!(report.percent, 85.5);
    }

    #[test]
    fn test_coverage_py_total() {
        let log = "Name    Stmts   Miss  Cover\napp.py    100     10    90%\nTOTAL     120     10    92%\n";
        let report = parse_coverage(log).unwrap();
        assert_eq!(report.tool, CoverageTool::CoveragePy);
        assert_eq!(report.percent, 92.0);
    }

    #[test]
    fn test_go_keeps_last_package() {
        let log = "ok  \tpkg/a\t0.01s\tcoverage: 60.0% of statements\nok  \tpkg/b\t0.02s\tcoverage: 78.9% of statements\n";
        let report = parse_coverage(log).unwrap();
        assert_eq!(report.tool, CoverageTool::Go);
        assert_eq!(report.percent, 78.9);
    }

    #[test]
    fn test_lcov_and_tarpaulin() {
        let lcov = parse_coverage("Overall coverage rate:\n  lines......: 85.2% (1234 of 1448 lines)\n").unwrap();
        assert_eq!(lcov.tool, CoverageTool::Lcov);
        assert_eq!(lcov.percent, 85.2);

        let tarpaulin = parse_coverage("|| Tested/Total Lines:\n85.23% coverage, 123/144 lines covered\n").unwrap();
        assert_eq!(tarpaulin.tool, CoverageTool::Tarpaulin);
        assert_eq!(tarpaulin.percent, 85.23);
    }

    #[test]
    fn test_generic_line_with_ansi_codes() {
        let log = "2024-03-01T10:00:00Z \x1b[32mTotal coverage: 71.4%\x1b[0m";
        let report = parse_coverage(log).unwrap();
        assert_eq!(report.tool, CoverageTool::Generic);
        assert_eq!(report.percent, 71.4);
        assert_eq!(report.line, "Total coverage: 71.4%");
    }

    #[test]
    fn test_rejects_out_of_range_and_missing() {
        assert!(parse_coverage("Coverage: 140%").is_none());
        assert!(parse_coverage("all tests passed\n").is_none());
        assert!(parse_coverage("").is_none());
    }
}
