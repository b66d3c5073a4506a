//! CSV export of a ranked list: `filename,score`, one row per result.

use std::fmt::Write;

use crate::scoring::ScoreResult;

pub const CSV_HEADER: &str = "filename,score";

pub fn results_to_csv(results: &[ScoreResult]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + results.len() * 32);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for r in results {
        // Debug formatting keeps a decimal point on whole numbers: 0.0, 87.0.
        let _ = writeln!(out, "{},{:?}", escape_field(&r.filename), r.score);
    }
    out
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
