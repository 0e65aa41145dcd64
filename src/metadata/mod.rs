//! Schema-introspection helpers. Each one is a thin consumer of
//! [`Executor::execute`]; rows are passed through as returned by the cluster.

pub mod sampling;

use std::collections::{BTreeMap, HashMap};

use futures::future::try_join_all;
use serde_json::{Map, Value};

use crate::{
    command::Executor,
    connection::ConnectionInfo,
    context::Language,
    error::{Error, Result},
    guard::{self, DEFAULT_APPLY_TIMEOUT},
    recovery, scala,
    transport::{self, Transport},
};

pub use sampling::RecordSampling;

pub async fn fetch_cluster_properties(transport: &dyn Transport, conn: &ConnectionInfo) -> Result<Value> {
    let url = conn.endpoint_with_params(
        "/api/2.0/clusters/get",
        [("cluster_id", conn.cluster_id.as_str())],
    )?;
    let body = transport::get_body(transport, url, &conn.access_token).await?;
    transport::decode(&body)
}

pub async fn fetch_database_names(exec: &Executor, conn: &ConnectionInfo) -> Result<Vec<String>> {
    let rows = exec.execute(conn, "SHOW DATABASES", Language::Sql).await?;
    let mut names = Vec::new();
    flatten_into(&rows, &mut names);
    Ok(names)
}

pub async fn fetch_table_names(exec: &Executor, conn: &ConnectionInfo, db: &str) -> Result<Value> {
    exec.execute(conn, &format!("SHOW TABLES IN `{}`", db), Language::Sql).await
}

pub async fn fetch_view_names(exec: &Executor, conn: &ConnectionInfo, db: &str) -> Result<Value> {
    exec.execute(conn, &format!("SHOW VIEWS IN `{}`", db), Language::Sql).await
}

/// DDL of `entity`, or an empty string when the cluster returns no rows.
pub async fn fetch_create_statement(exec: &Executor, conn: &ConnectionInfo, entity: &str) -> Result<String> {
    let rows = exec
        .execute(conn, &format!("SHOW CREATE TABLE {};", entity), Language::Sql)
        .await?;
    Ok(first_cell(&rows)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}

/// Properties reported by `DESCRIBE DATABASE EXTENDED`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseProperties {
    pub location: Option<Value>,
    pub description: Option<Value>,
    pub db_properties: Option<Value>,
}

impl DatabaseProperties {
    pub fn from_rows(rows: &Value) -> Self {
        let mut props = Self::default();
        for row in rows.as_array().into_iter().flatten() {
            let value = row.get(1).cloned();
            match row.get(0).and_then(Value::as_str) {
                Some("Location") => props.location = value,
                Some("Comment") => props.description = value,
                Some("Properties") => props.db_properties = value,
                _ => {}
            }
        }
        props
    }

    pub fn into_value(self) -> Value {
        let mut map = Map::new();
        if let Some(v) = self.location {
            map.insert("location".into(), v);
        }
        if let Some(v) = self.description {
            map.insert("description".into(), v);
        }
        if let Some(v) = self.db_properties {
            map.insert("dbProperties".into(), v);
        }
        Value::Object(map)
    }
}

/// Describes every database concurrently; one failure fails the batch.
pub async fn describe_databases(
    exec: &Executor,
    conn: &ConnectionInfo,
    db_names: &[String],
) -> Result<HashMap<String, DatabaseProperties>> {
    let described = try_join_all(db_names.iter().map(|db| async move {
        tracing::info!(db = %db, "describing database");
        let rows = exec
            .execute(conn, &format!("DESCRIBE DATABASE EXTENDED `{}`", db), Language::Sql)
            .await?;
        tracing::info!(db = %db, "database described");
        Ok::<_, Error>((db.clone(), DatabaseProperties::from_rows(&rows)))
    }))
    .await?;
    Ok(described.into_iter().collect())
}

/// Per-database `{dbTables, dbProperties}` for the requested tables.
pub async fn fetch_cluster_data(
    exec: &Executor,
    conn: &ConnectionInfo,
    tables: &BTreeMap<String, Vec<String>>,
) -> Result<Map<String, Value>> {
    let db_names: Vec<String> = tables.keys().cloned().collect();
    let properties: HashMap<String, Value> = describe_databases(exec, conn, &db_names)
        .await?
        .into_iter()
        .map(|(db, props)| (db, props.into_value()))
        .collect();

    tracing::info!(databases = %db_names.join(", "), "retrieving tables info");
    let output = exec
        .execute(conn, &scala::cluster_data_script(tables), Language::Scala)
        .await?;
    tracing::info!(databases = %db_names.join(", "), "finished retrieving tables info");

    let raw = match output {
        Value::String(s) => s,
        other => other.to_string(),
    };
    let recovered = recovery::recover_cluster_data(&raw).map_err(|e| {
        if let Error::Decode { cleaned, .. } = &e {
            tracing::error!(response = %raw, formatted = ?cleaned, "could not recover cluster data");
        }
        e
    })?;
    Ok(recovery::assemble(&db_names, &recovered, &properties))
}

/// Best-effort sample of `table`: any failure yields an empty list.
pub async fn fetch_documents(
    exec: &Executor,
    conn: &ConnectionInfo,
    db: &str,
    table: &str,
    fields: &[String],
    sampling: RecordSampling,
) -> Vec<Map<String, Value>> {
    match sample_documents(exec, conn, db, table, fields, sampling).await {
        Ok(documents) => documents,
        Err(e) => {
            tracing::warn!(db, table, error = %e, "sampling failed, returning no documents");
            Vec::new()
        }
    }
}

async fn sample_documents(
    exec: &Executor,
    conn: &ConnectionInfo,
    db: &str,
    table: &str,
    fields: &[String],
    sampling: RecordSampling,
) -> Result<Vec<Map<String, Value>>> {
    let count_rows = exec
        .execute(conn, &format!("SELECT COUNT(*) FROM `{}`.`{}`", db, table), Language::Sql)
        .await?;
    let count = first_cell(&count_rows).map(as_count).unwrap_or(0);
    if count == 0 {
        return Ok(Vec::new());
    }

    let columns = fields
        .iter()
        .map(|f| format!("`{}`", f))
        .collect::<Vec<_>>()
        .join(", ");
    let query = format!(
        "SELECT {} FROM `{}`.`{}` LIMIT {}",
        columns,
        db,
        table,
        sampling.limit(count)
    );
    let rows = exec.execute(conn, &query, Language::Sql).await?;

    Ok(rows
        .as_array()
        .into_iter()
        .flatten()
        .map(|row| {
            fields
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), row.get(i).cloned().unwrap_or(Value::Null)))
                .collect()
        })
        .collect())
}

/// Applies a multi-statement SQL script, one statement per command. The first
/// failure or timeout aborts the rest of the batch.
pub async fn apply_to_instance(
    exec: &Executor,
    conn: &ConnectionInfo,
    script: &str,
    progress: &dyn Fn(&str),
) -> Result<()> {
    let normalized = script.split_whitespace().collect::<Vec<_>>().join(" ");
    let deadline = conn.apply_timeout.unwrap_or(DEFAULT_APPLY_TIMEOUT);

    for statement in normalized.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let message = format!("Applying script: \n {}", statement);
        tracing::info!("{}", message);
        progress(&message);

        let command = scala::sql_statement(statement);
        guard::with_deadline(
            statement,
            deadline,
            exec.execute(conn, &command, Language::Scala),
        )
        .await?;
    }
    Ok(())
}

fn first_cell(rows: &Value) -> Option<&Value> {
    rows.get(0).and_then(|row| row.get(0))
}

fn as_count(v: &Value) -> u64 {
    match v {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn flatten_into(v: &Value, out: &mut Vec<String>) {
    match v {
        Value::Array(items) => items.iter().for_each(|item| flatten_into(item, out)),
        Value::String(s) => out.push(s.clone()),
        Value::Null => {}
        other => out.push(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn database_properties_pick_known_rows() {
        let rows = json!([
            ["Catalog Name", "spark_catalog"],
            ["Namespace Name", "sales"],
            ["Comment", "orders and invoices"],
            ["Location", "dbfs:/user/hive/warehouse/sales.db"],
            ["Owner", "root"],
            ["Properties", "((team,finance))"]
        ]);
        let props = DatabaseProperties::from_rows(&rows);
        assert_eq!(props.description, Some(json!("orders and invoices")));
        assert_eq!(props.location, Some(json!("dbfs:/user/hive/warehouse/sales.db")));
        assert_eq!(
            props.into_value(),
            json!({
                "location": "dbfs:/user/hive/warehouse/sales.db",
                "description": "orders and invoices",
                "dbProperties": "((team,finance))"
            })
        );
    }

    #[test]
    fn database_properties_of_garbage_are_empty() {
        assert_eq!(DatabaseProperties::from_rows(&json!("nope")).into_value(), json!({}));
    }

    #[test]
    fn flatten_handles_nested_rows() {
        let mut out = Vec::new();
        flatten_into(&json!([["default"], ["sales", null], [[7]]]), &mut out);
        assert_eq!(out, vec!["default", "sales", "7"]);
    }

    #[test]
    fn count_accepts_numbers_and_strings() {
        assert_eq!(as_count(&json!(42)), 42);
        assert_eq!(as_count(&json!("17")), 17);
        assert_eq!(as_count(&json!(null)), 0);
    }
}
