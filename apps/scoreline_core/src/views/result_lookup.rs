use std::collections::HashMap;
use std::path::Path;

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    Json,
};
use tracing::error;

use crate::records::{canonicalize, load_rows, matches_reg};
use crate::serializers::result_lookup::{ApiError, ResultOut};
use crate::AppState;

/// Query parameters arrive either as an already-parsed mapping or as a
/// raw query string; both shapes expose the same single capability.
pub enum RequestParams {
    Mapping(HashMap<String, String>),
    QueryString(String),
}

impl RequestParams {
    pub fn param(&self, name: &str) -> Option<String> {
        match self {
            RequestParams::Mapping(map) => map.get(name).cloned(),
            RequestParams::QueryString(qs) => url::form_urlencoded::parse(qs.as_bytes())
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned()),
        }
    }
}

// ---------- handler ----------
pub async fn result(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<(StatusCode, Json<ResultOut>), (StatusCode, Json<ApiError>)> {
    let params = RequestParams::QueryString(query.unwrap_or_default());
    lookup(&state.cfg.data_dir, &params)
}

/// The whole lookup, synchronous and request-scoped: validate the two
/// parameters, read `<data_dir>/<branch>.json`, collect the rows that
/// match `reg`, and reshape each into a canonical record. Returns 200
/// with an empty list when nothing matches.
pub fn lookup(
    data_dir: &Path,
    params: &RequestParams,
) -> Result<(StatusCode, Json<ResultOut>), (StatusCode, Json<ApiError>)> {
    let reg = params.param("reg").unwrap_or_default().trim().to_string();
    let branch = params.param("branch").unwrap_or_default().trim().to_string();

    if reg.is_empty() {
        return Err(bad("reg is required"));
    }
    if branch.is_empty() {
        return Err(bad("branch is required"));
    }

    let path = data_dir.join(format!("{branch}.json"));
    if !path.is_file() {
        return Err(bad("Incorrect entries or branch selection. Please try again."));
    }

    let rows = load_rows(&path).map_err(internal)?;
    let result = rows
        .iter()
        .filter(|row| matches_reg(row, &reg))
        .map(canonicalize)
        .collect();

    Ok((StatusCode::OK, Json(ResultOut { result })))
}

// ---------- small helpers ----------
fn bad(msg: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError { error: msg.into(), detail: None }),
    )
}

fn internal(err: anyhow::Error) -> (StatusCode, Json<ApiError>) {
    error!("result lookup failed: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            error: "Internal server error".into(),
            detail: Some(err.to_string()),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn params(reg: &str, branch: &str) -> RequestParams {
        let mut map = HashMap::new();
        if !reg.is_empty() {
            map.insert("reg".to_string(), reg.to_string());
        }
        if !branch.is_empty() {
            map.insert("branch".to_string(), branch.to_string());
        }
        RequestParams::Mapping(map)
    }

    fn data_dir(branch: &str, body: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(format!("{branch}.json")), body).unwrap();
        dir
    }

    #[test]
    fn query_string_params_are_percent_decoded() {
        let p = RequestParams::QueryString("reg=a%201&branch=CS1".into());
        assert_eq!(p.param("reg").as_deref(), Some("a 1"));
        assert_eq!(p.param("branch").as_deref(), Some("CS1"));
        assert_eq!(p.param("other"), None);
    }

    #[test]
    fn missing_reg_is_rejected() {
        let dir = data_dir("CS1", "[]");
        let (status, body) = lookup(dir.path(), &params("", "CS1")).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "reg is required");
    }

    #[test]
    fn missing_branch_is_rejected() {
        let dir = data_dir("CS1", "[]");
        let (status, body) = lookup(dir.path(), &params("a1", "")).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "branch is required");
    }

    #[test]
    fn whitespace_only_params_are_rejected() {
        let dir = data_dir("CS1", "[]");
        let (status, _) = lookup(dir.path(), &params("   ", "CS1")).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_branch_gets_the_generic_message() {
        let dir = data_dir("CS1", "[]");
        let (status, body) = lookup(dir.path(), &params("a1", "EE9")).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body.error,
            "Incorrect entries or branch selection. Please try again."
        );
        assert!(body.detail.is_none());
    }

    #[test]
    fn exact_match_returns_canonical_record() {
        let dir = data_dir("CS1", r#"[{"Reg":"A1","Name":"X","FEC101":"F"}]"#);
        let (status, Json(out)) = lookup(dir.path(), &params("a1", "CS1")).unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(out.result.len(), 1);
        let rec = &out.result[0];
        assert_eq!(rec["Reg"], "A1");
        assert_eq!(rec["Name"], "X");
        assert_eq!(rec["FEC101"], "F");
        assert_eq!(rec["Total Back"], "1");
    }

    #[test]
    fn substring_fallback_matches_when_exact_does_not() {
        let dir = data_dir("CS1", r#"[{"Reg":"A1","Roll":"A1X99"},{"Reg":"B2","Roll":"77"}]"#);
        let (_, Json(out)) = lookup(dir.path(), &params("A1X", "CS1")).unwrap();
        assert_eq!(out.result.len(), 1);
        assert_eq!(out.result[0]["Reg"], "A1");
    }

    #[test]
    fn no_match_is_still_a_200_with_empty_list() {
        let dir = data_dir("CS1", r#"[{"Reg":"A1"}]"#);
        let (status, Json(out)) = lookup(dir.path(), &params("zzz", "CS1")).unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(out.result.is_empty());
    }

    #[test]
    fn repeated_lookups_are_byte_identical() {
        let dir = data_dir(
            "CS1",
            r#"[{"Reg":"A1","Name":"X","FEC101":"F","4CS2-01":"B","SGPA":8.2}]"#,
        );
        let (_, Json(first)) = lookup(dir.path(), &params("a1", "CS1")).unwrap();
        let (_, Json(second)) = lookup(dir.path(), &params("a1", "CS1")).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn malformed_json_is_an_internal_error() {
        let dir = data_dir("CS1", "not json at all");
        let (status, body) = lookup(dir.path(), &params("a1", "CS1")).unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
        assert!(body.detail.is_some());
    }
}
