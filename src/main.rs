mod cli;

use std::{
    collections::BTreeMap,
    io::{self, Read},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use cli::Command;
use dbx_exec::{
    config::Config,
    metadata::{self, RecordSampling},
    printer::{self, JsonPrinter},
    ConnectionInfo, ContextRegistry, Executor, HttpTransport,
};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // CLI flags override the rc file and environment
    let overrides = [
        ("DBX_HOST", args.host.as_deref()),
        ("DBX_CLUSTER_ID", args.cluster_id.as_deref()),
        ("DBX_TOKEN", args.token.as_deref()),
        ("LOG_LEVEL", args.log_level.as_deref()),
    ];
    for (key, value) in overrides {
        if let Some(v) = value {
            std::env::set_var(key, v);
        }
    }
    let cfg = Config::load();

    dbx_exec::logging::init(&cfg.log_level())?;

    let mut conn = ConnectionInfo::from_config(&cfg)?;
    if let Some(ms) = args.apply_timeout_ms {
        conn = conn.with_apply_timeout(Duration::from_millis(ms));
    }

    let transport = HttpTransport::new(cfg.request_timeout())?;
    let exec = Executor::new(Arc::new(transport), Arc::new(ContextRegistry::new()))
        .with_poll_interval(cfg.poll_interval());

    let outcome = run(&exec, &conn, args.command).await;

    // Always release remote contexts, even after a failure
    let failures = exec.destroy_active_contexts().await;
    for e in &failures {
        tracing::warn!(error = %e, "context cleanup failed");
    }

    let value = outcome?;
    if !value.is_null() {
        JsonPrinter::default().print(&value);
    }
    Ok(())
}

async fn run(exec: &Executor, conn: &ConnectionInfo, command: Command) -> Result<Value> {
    let value = match command {
        Command::Exec { text, language } => exec
            .execute(conn, &text, language)
            .await
            .with_context(|| format!("executing {} command", language))?,
        Command::Cluster => metadata::fetch_cluster_properties(exec.transport(), conn).await?,
        Command::Databases => Value::from(metadata::fetch_database_names(exec, conn).await?),
        Command::Tables { db } => metadata::fetch_table_names(exec, conn, &db).await?,
        Command::Views { db } => metadata::fetch_view_names(exec, conn, &db).await?,
        Command::ShowCreate { entity } => {
            Value::String(metadata::fetch_create_statement(exec, conn, &entity).await?)
        }
        Command::Describe { dbs } => {
            let described = metadata::describe_databases(exec, conn, &dbs).await?;
            let mut out = BTreeMap::new();
            for (db, props) in described {
                out.insert(db, props.into_value());
            }
            serde_json::to_value(out)?
        }
        Command::ClusterData { entities } => {
            let tables = group_entities(&entities);
            Value::Object(metadata::fetch_cluster_data(exec, conn, &tables).await?)
        }
        Command::Sample { db, table, fields, limit, percent } => {
            let sampling = match (limit, percent) {
                (_, Some(percent)) => RecordSampling::Relative { percent },
                (Some(value), None) => RecordSampling::Absolute { value },
                (None, None) => RecordSampling::default(),
            };
            let docs = metadata::fetch_documents(exec, conn, &db, &table, &fields, sampling).await;
            Value::Array(docs.into_iter().map(Value::Object).collect())
        }
        Command::Apply { file } => {
            let script = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading script {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            metadata::apply_to_instance(exec, conn, &script, &printer::progress).await?;
            Value::Null
        }
    };
    Ok(value)
}

/// `db.table` entries grouped by database; a bare name keeps an empty list.
fn group_entities(entities: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entity in entities {
        match entity.split_once('.') {
            Some((db, table)) => grouped.entry(db.to_string()).or_default().push(table.to_string()),
            None => {
                grouped.entry(entity.clone()).or_default();
            }
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_group_by_database() {
        let grouped = group_entities(&[
            "sales.orders".to_string(),
            "hr".to_string(),
            "sales.items".to_string(),
        ]);
        assert_eq!(grouped["sales"], vec!["orders", "items"]);
        assert!(grouped["hr"].is_empty());
    }
}
