use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

/// One row of a branch data file: column name -> value, in file order.
/// Source files have no fixed schema; column names vary per branch
/// ("Reg", "Reg. No", "Registration", ...), so rows stay fully dynamic.
pub type Row = Vec<(String, String)>;

/// Normalized output record, keys in resolution order.
pub type CanonicalRecord = Map<String, Value>;

/// Column names treated as THE registration column when matching rows.
const REG_MATCH_KEYS: &[&str] = &["reg", "reg. no", "registration", "regno"];

// Candidate label sets for canonical output fields. A candidate matches
// a column name when either lowercased string contains the other.
const REG_CANDIDATES: &[&str] = &["reg", "registration"];
const NAME_CANDIDATES: &[&str] = &["name"];
const UNI_ROLL_CANDIDATES: &[&str] = &["uni-roll", "uni roll", "university roll", "uniroll"];
const COL_ROLL_CANDIDATES: &[&str] = &["col roll", "college roll", "colroll"];
const TOTAL_BACK_CANDIDATES: &[&str] = &["total back", "back", "totalback"];
const RESULT_CANDIDATES: &[&str] = &["result", "status"];
const SGPA_CANDIDATES: &[&str] = &["sgpa", "gpa", "cgpa"];

/// Columns containing any of these terms are never subject columns.
const SUBJECT_EXCLUDE: &[&str] = &["total", "back", "result", "sgpa", "gpa"];

/// Known subject-code fragments for columns without a digit+letter mix.
const SUBJECT_CODES: &[&str] = &["fec", "4cs", "cs", "ee", "ma"];

/// Read and decode one branch file: a JSON array of objects. Every
/// value is coerced to a string; `null` becomes the empty string.
pub fn load_rows(path: &Path) -> Result<Vec<Row>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let doc: Value =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    let Value::Array(items) = doc else {
        bail!("{}: branch data is not a JSON array", path.display());
    };

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(obj) = item else {
            bail!("{}: branch data row is not a JSON object", path.display());
        };
        rows.push(obj.into_iter().map(|(k, v)| (k, coerce(v))).collect());
    }
    Ok(rows)
}

fn coerce(v: Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Whether a row belongs to the requested registration number. Three
/// fallback strategies, in precedence order:
/// 1. a recognized registration column whose value matches exactly,
/// 2. any field value matching exactly,
/// 3. any field value containing `reg` as a substring.
/// All comparisons are on trimmed, lowercased strings.
pub fn matches_reg(row: &Row, reg: &str) -> bool {
    let needle = reg.trim().to_lowercase();

    for (key, value) in row {
        if REG_MATCH_KEYS.contains(&key.to_lowercase().as_str())
            && value.trim().to_lowercase() == needle
        {
            return true;
        }
    }

    if row.iter().any(|(_, v)| v.trim().to_lowercase() == needle) {
        return true;
    }

    row.iter()
        .any(|(_, v)| v.trim().to_lowercase().contains(&needle))
}

/// Fuzzy column resolution: a candidate matches a column name when
/// either lowercased string contains the other. Candidates are tried in
/// priority order, columns in file order; first hit wins.
pub fn resolve_key<'a>(row: &'a Row, candidates: &[&str]) -> Option<&'a str> {
    for cand in candidates {
        for (key, _) in row {
            let k = key.to_lowercase();
            if k.contains(cand) || cand.contains(k.as_str()) {
                return Some(key);
            }
        }
    }
    None
}

fn field<'a>(row: &'a Row, key: &str) -> &'a str {
    row.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}

fn is_subject_column(name: &str) -> bool {
    let lower = name.to_lowercase();
    if SUBJECT_EXCLUDE.iter().any(|t| lower.contains(t)) {
        return false;
    }
    let has_digit = lower.chars().any(|c| c.is_ascii_digit());
    let has_alpha = lower.chars().any(|c| c.is_ascii_alphabetic());
    (has_digit && has_alpha) || SUBJECT_CODES.iter().any(|c| lower.contains(c))
}

fn is_fail_mark(value: &str) -> bool {
    let v = value.trim().to_uppercase();
    v == "F" || v.contains("FAIL")
}

/// Reshape one matched row into the canonical output record.
///
/// `Reg` falls back to the row's FIRST column when no candidate
/// resolves; every other field falls back to an empty-string column
/// lookup instead. That asymmetry is kept on purpose to reproduce the
/// observed output for existing data files.
pub fn canonicalize(row: &Row) -> CanonicalRecord {
    let mut out = CanonicalRecord::new();
    let mut claimed: Vec<&str> = Vec::new();

    let reg_key = resolve_key(row, REG_CANDIDATES).or_else(|| row.first().map(|(k, _)| k.as_str()));
    let reg_key = reg_key.unwrap_or("");
    claimed.push(reg_key);
    out.insert("Reg".into(), field(row, reg_key).into());

    let name_key = resolve_key(row, NAME_CANDIDATES).unwrap_or("");
    claimed.push(name_key);
    out.insert("Name".into(), field(row, name_key).into());

    let uni_key = resolve_key(row, UNI_ROLL_CANDIDATES).unwrap_or("");
    claimed.push(uni_key);
    out.insert("Uni-Roll No".into(), field(row, uni_key).into());

    let col_key = resolve_key(row, COL_ROLL_CANDIDATES).unwrap_or("");
    claimed.push(col_key);
    out.insert("Col Roll No".into(), field(row, col_key).into());

    for (key, value) in row {
        if claimed.contains(&key.as_str()) {
            continue;
        }
        if is_subject_column(key) {
            out.insert(key.clone(), value.as_str().into());
        }
    }

    let back_key = resolve_key(row, TOTAL_BACK_CANDIDATES).unwrap_or("");
    let mut total_back = field(row, back_key).trim().to_string();
    if total_back.is_empty() {
        let fails = out
            .values()
            .filter(|v| v.as_str().is_some_and(is_fail_mark))
            .count();
        total_back = fails.to_string();
    }
    out.insert("Total Back".into(), total_back.into());

    let result_key = resolve_key(row, RESULT_CANDIDATES).unwrap_or("");
    out.insert("Result".into(), field(row, result_key).into());

    let sgpa_key = resolve_key(row, SGPA_CANDIDATES).unwrap_or("");
    out.insert("SGPA".into(), field(row, sgpa_key).into());

    out
}
