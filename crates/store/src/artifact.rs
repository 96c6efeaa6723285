// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Encode/decode of the external artifact representation.
//!
//! The dashboard consumes the history as a script that assigns one global
//! identifier to a JSON object:
//!
//! ```text
//! window.BENCHMARK_DATA = {
//!   "lastUpdate": 1699792251385,
//!   "repoUrl": "https://github.com/...",
//!   "entries": { "Rust Benchmark": [ ... ] }
//! }
//! ```
//!
//! Encoding and decoding round-trip bit-exactly: root keys keep the
//! documented order, numbers are written without loss (integers stay
//! integers), and fields this version does not recognize are carried
//! through unchanged.
//!
//! Persistence is all-or-nothing: [`save`] writes to a temporary sibling
//! file and renames it over the target, so a failed cycle leaves the prior
//! artifact byte-identical.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::history::History;

/// Global identifier the dashboard script expects.
pub const DEFAULT_GLOBAL: &str = "window.BENCHMARK_DATA";

/// Render `history` as the loadable-script artifact text.
pub fn encode(history: &History, global_ident: &str) -> Result<String> {
    let json = serde_json::to_string_pretty(history).map_err(StoreError::Encode)?;
    Ok(format!("{global_ident} = {json}\n"))
}

/// Parse artifact text produced by [`encode`] (or by a compatible
/// generator) back into a [`History`].
pub fn decode(text: &str, global_ident: &str) -> Result<History> {
    let rest = text
        .trim_start()
        .strip_prefix(global_ident)
        .ok_or_else(|| StoreError::Corrupt(format!("missing `{global_ident}` assignment")))?;
    let rest = rest
        .trim_start()
        .strip_prefix('=')
        .ok_or_else(|| StoreError::Corrupt("missing `=` after global identifier".to_string()))?;
    let json = rest.trim().trim_end_matches(';').trim_end();
    if !json.starts_with('{') {
        return Err(StoreError::Corrupt("root value is not an object".to_string()));
    }
    serde_json::from_str(json).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Read the artifact at `path`.
///
/// A nonexistent file is first-run bootstrap and yields an empty store; any
/// other read failure or malformed content is an error.
pub fn load(path: &Path, global_ident: &str) -> Result<History> {
    match fs::read_to_string(path) {
        Ok(text) => decode(&text, global_ident),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(History::empty()),
        Err(e) => Err(StoreError::Io(e)),
    }
}

/// Write the artifact for `history` to `path` atomically.
///
/// The text lands in a `.tmp` sibling first and is renamed over the target,
/// so the previously persisted artifact survives any mid-write failure.
pub fn save(path: &Path, history: &History, global_ident: &str) -> Result<()> {
    let text = encode(history, global_ident)?;
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchwatch_core::model::{Benchmark, Commit, CommitIdentity, Run};
    use chrono::DateTime;
    use serde_json::Number;

    // Shape taken from a real generator's output.
    const SAMPLE: &str = r#"window.BENCHMARK_DATA = {
  "lastUpdate": 1699792251385,
  "repoUrl": "https://github.com/risingwavelabs/jsonbb",
  "entries": {
    "Rust Benchmark": [
      {
        "commit": {
          "author": {
            "email": "wangrunji0408@163.com",
            "name": "Runji Wang",
            "username": "wangrunji0408"
          },
          "committer": {
            "email": "wangrunji0408@163.com",
            "name": "Runji Wang",
            "username": "wangrunji0408"
          },
          "distinct": true,
          "id": "f25173f91612d89e280e508cf77f51029590bff9",
          "message": "add Github Actions for benchmark",
          "timestamp": "2023-11-12T20:24:44+08:00",
          "tree_id": "7366a1621a988f4da01eb72b8d228f80e245380e",
          "url": "https://github.com/risingwavelabs/jsonbb/commit/f25173f91612d89e280e508cf77f51029590bff9"
        },
        "date": 1699792250702,
        "tool": "cargo",
        "benches": [
          {
            "name": "from_string/jsonbb",
            "value": 31,
            "range": "± 0",
            "unit": "ns/iter"
          },
          {
            "name": "canada parse/jsonbb",
            "value": 7384641,
            "range": "± 62175",
            "unit": "ns/iter"
          }
        ]
      }
    ]
  }
}"#;

    fn sample_history() -> History {
        let who = CommitIdentity {
            email: "dev@example.com".to_string(),
            name: "Dev".to_string(),
            username: "dev".to_string(),
        };
        let mut h = History::empty();
        h.repo_url = "https://example.com/repo".to_string();
        h.merge(Run {
            commit: Commit {
                author: who.clone(),
                committer: who,
                distinct: true,
                id: "abc".to_string(),
                message: "m".to_string(),
                timestamp: DateTime::parse_from_rfc3339("2023-11-12T20:24:44+08:00").unwrap(),
                tree_id: "t".to_string(),
                url: "https://example.com/repo/commit/abc".to_string(),
                extra: serde_json::Map::new(),
            },
            date: 1_699_792_250_702,
            tool: "cargo".to_string(),
            benches: vec![Benchmark {
                name: "parse".to_string(),
                value: Number::from(7_384_641),
                range: "± 62175".to_string(),
                unit: "ns/iter".to_string(),
                extra: serde_json::Map::new(),
            }],
            extra: serde_json::Map::new(),
        });
        h
    }

    #[test]
    fn test_decode_real_artifact_shape() {
        let h = decode(SAMPLE, DEFAULT_GLOBAL).unwrap();
        assert_eq!(h.last_update, 1699792251385);
        assert_eq!(h.repo_url, "https://github.com/risingwavelabs/jsonbb");
        let series = h.series("Rust Benchmark").unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].tool, "cargo");
        assert_eq!(series[0].benches.len(), 2);
        assert_eq!(series[0].benches[1].range, "± 62175");
    }

    #[test]
    fn test_encode_decode_roundtrip_is_structural_identity() {
        let h = sample_history();
        let text = encode(&h, DEFAULT_GLOBAL).unwrap();
        let back = decode(&text, DEFAULT_GLOBAL).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn test_decode_encode_preserves_integer_values() {
        let h = decode(SAMPLE, DEFAULT_GLOBAL).unwrap();
        let text = encode(&h, DEFAULT_GLOBAL).unwrap();
        assert!(text.contains("\"value\": 7384641"));
        assert!(!text.contains("7384641.0"));
    }

    #[test]
    fn test_root_key_order_is_fixed() {
        let text = encode(&sample_history(), DEFAULT_GLOBAL).unwrap();
        let last_update = text.find("\"lastUpdate\"").unwrap();
        let repo_url = text.find("\"repoUrl\"").unwrap();
        let entries = text.find("\"entries\"").unwrap();
        assert!(last_update < repo_url && repo_url < entries);
    }

    #[test]
    fn test_encode_starts_with_global_assignment() {
        let text = encode(&sample_history(), DEFAULT_GLOBAL).unwrap();
        assert!(text.starts_with("window.BENCHMARK_DATA = {"));
    }

    #[test]
    fn test_unknown_run_field_survives_roundtrip() {
        let with_extra = SAMPLE.replace(
            "\"tool\": \"cargo\",",
            "\"tool\": \"cargo\",\n        \"runner\": \"ubuntu-22.04\",",
        );
        let h = decode(&with_extra, DEFAULT_GLOBAL).unwrap();
        let text = encode(&h, DEFAULT_GLOBAL).unwrap();
        assert!(text.contains("\"runner\": \"ubuntu-22.04\""));
    }

    #[test]
    fn test_unknown_root_field_survives_roundtrip() {
        let with_extra = SAMPLE.replace(
            "\"lastUpdate\": 1699792251385,",
            "\"lastUpdate\": 1699792251385,\n  \"schemaVersion\": 2,",
        );
        let h = decode(&with_extra, DEFAULT_GLOBAL).unwrap();
        assert_eq!(h.extra.get("schemaVersion"), Some(&serde_json::json!(2)));
        let text = encode(&h, DEFAULT_GLOBAL).unwrap();
        assert!(text.contains("\"schemaVersion\": 2"));
    }

    #[test]
    fn test_decode_rejects_missing_global() {
        let err = decode("{\"lastUpdate\": 0}", DEFAULT_GLOBAL).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn test_decode_rejects_non_object_root() {
        let err = decode("window.BENCHMARK_DATA = [1, 2]", DEFAULT_GLOBAL).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn test_decode_rejects_missing_required_field() {
        let broken = SAMPLE.replace("\"date\": 1699792250702,", "");
        let err = decode(&broken, DEFAULT_GLOBAL).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn test_decode_rejects_series_that_is_not_a_sequence() {
        let broken = SAMPLE.replace("\"Rust Benchmark\": [", "\"Rust Benchmark\": {");
        assert!(decode(&broken, DEFAULT_GLOBAL).is_err());
    }

    #[test]
    fn test_decode_tolerates_trailing_semicolon() {
        let text = format!("{};\n", encode(&sample_history(), DEFAULT_GLOBAL).unwrap().trim_end());
        assert!(decode(&text, DEFAULT_GLOBAL).is_ok());
    }

    #[test]
    fn test_load_missing_file_bootstraps_empty() {
        let dir = tempfile::tempdir().unwrap();
        let h = load(&dir.path().join("data.js"), DEFAULT_GLOBAL).unwrap();
        assert!(h.is_empty());
        assert_eq!(h.last_update, 0);
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.js");
        let h = sample_history();
        save(&path, &h, DEFAULT_GLOBAL).unwrap();
        let back = load(&path, DEFAULT_GLOBAL).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.js");
        save(&path, &sample_history(), DEFAULT_GLOBAL).unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["data.js".to_string()]);
    }
}
