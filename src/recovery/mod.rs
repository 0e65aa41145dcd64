//! Recovers JSON from the REPL echo of the cluster-data script.
//!
//! The Scala REPL prints the assigned string as `clusterData: String = ...`,
//! quoted and escaped. The cleanup below is a fixed list of textual
//! substitutions, not an unescaping grammar: metadata values that themselves
//! contain `"{`, `}"`, `"[`, `]"`, `\"` or `\n` come out corrupted. That is
//! a known limitation of the payload format.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

pub const CLUSTER_DATA_MARKER: &str = "clusterData: String =";

const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("\n", " "),
    ("\\n", ""),
    ("\"{", "{"),
    ("\"[", "["),
    ("}\"", "}"),
    ("\\\"", "\""),
    ("]\"", "]"),
];

/// Text after the REPL assignment marker with the substitutions applied.
pub fn clean_repl_output(raw: &str) -> Option<String> {
    let (_, value) = raw.split_once(CLUSTER_DATA_MARKER)?;
    Some(
        SUBSTITUTIONS
            .iter()
            .fold(value.to_string(), |text, (from, to)| text.replace(from, to)),
    )
}

pub fn recover_cluster_data(raw: &str) -> Result<Value> {
    let cleaned = clean_repl_output(raw).ok_or_else(|| {
        Error::decode(format!("`{}` marker not found in output", CLUSTER_DATA_MARKER), raw)
    })?;
    serde_json::from_str(&cleaned).map_err(|e| Error::Decode {
        reason: e.to_string(),
        raw: raw.to_string(),
        cleaned: Some(cleaned),
    })
}

/// Per-database `{dbTables, dbProperties}`, with `{}` for anything missing.
pub fn assemble(
    db_names: &[String],
    recovered: &Value,
    properties: &HashMap<String, Value>,
) -> Map<String, Value> {
    db_names
        .iter()
        .map(|db| {
            let tables = recovered.get(db).cloned().unwrap_or_else(|| json!({}));
            let props = properties.get(db).cloned().unwrap_or_else(|| json!({}));
            (db.clone(), json!({ "dbTables": tables, "dbProperties": props }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_escaped_blob_with_newlines() {
        let raw = "import spark.implicits._\nclusterData: String = \"{\\\"db1\\\":\n{\\\"t1\\\":{}}}\"\n";
        let value = recover_cluster_data(raw).unwrap();
        assert_eq!(value, json!({ "db1": { "t1": {} } }));
    }

    #[test]
    fn strips_literal_backslash_n_and_quoted_arrays() {
        let raw = r#"clusterData: String = "{\"db\":{\"t\":{\"columns\":"[{\"name\":\"a\"}]"}},\n\"other\":{}}""#;
        let value = recover_cluster_data(raw).unwrap();
        assert_eq!(value["db"]["t"]["columns"], json!([{ "name": "a" }]));
        assert_eq!(value["other"], json!({}));
    }

    #[test]
    fn missing_marker_is_a_decode_error() {
        match recover_cluster_data("res0: Int = 1") {
            Err(Error::Decode { raw, cleaned, .. }) => {
                assert_eq!(raw, "res0: Int = 1");
                assert!(cleaned.is_none());
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn unparseable_blob_keeps_raw_and_cleaned_text() {
        let raw = "clusterData: String = \"{\\\"db\\\": nope}\"";
        match recover_cluster_data(raw) {
            Err(Error::Decode { raw: r, cleaned, .. }) => {
                assert_eq!(r, raw);
                assert_eq!(cleaned.as_deref(), Some(" {\"db\": nope}"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn assemble_fills_missing_parts_with_empty_objects() {
        let recovered = json!({ "sales": { "orders": { "columns": [] } } });
        let mut props = HashMap::new();
        props.insert("hr".to_string(), json!({ "location": "dbfs:/hr" }));

        let out = assemble(&["sales".into(), "hr".into()], &recovered, &props);
        assert_eq!(out["sales"]["dbTables"], json!({ "orders": { "columns": [] } }));
        assert_eq!(out["sales"]["dbProperties"], json!({}));
        assert_eq!(out["hr"]["dbTables"], json!({}));
        assert_eq!(out["hr"]["dbProperties"]["location"], "dbfs:/hr");
    }
}
