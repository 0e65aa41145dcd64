//! Scala snippets submitted into the scala context.

use std::collections::BTreeMap;

/// Quote `text` as a Scala string literal.
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Wraps one SQL statement so it runs through the shared `sqlContext`.
pub fn sql_statement(sql: &str) -> String {
    format!("var stmt = sqlContext.sql({})", string_literal(sql))
}

/// Builds the script whose last line assigns `clusterData: String`, a JSON
/// object of `{db: {table: {columns, properties}}}` for the given tables.
pub fn cluster_data_script(tables: &BTreeMap<String, Vec<String>>) -> String {
    let entries = tables
        .iter()
        .map(|(db, names)| {
            let names = names.iter().map(|t| string_literal(t)).collect::<Vec<_>>().join(", ");
            format!("{} -> Seq({})", string_literal(db), names)
        })
        .collect::<Vec<_>>()
        .join(",\n  ");

    format!(
        r#"import org.apache.spark.sql.functions._

val requestedTables: Map[String, Seq[String]] = Map(
  {entries}
)

def quoted(s: String): String = "\"" + s.replace("\\", "\\\\").replace("\"", "\\\"") + "\""

def tableInfo(db: String, table: String): String = {{
  val columns = spark.sql(s"DESCRIBE TABLE `$db`.`$table`").toJSON.collect().mkString("[", ",", "]")
  val properties = spark.sql(s"SHOW TBLPROPERTIES `$db`.`$table`").toJSON.collect().mkString("[", ",", "]")
  quoted(table) + ":{{\"columns\":" + columns + ",\"properties\":" + properties + "}}"
}}

val clusterData: String = requestedTables.map {{ case (db, tables) =>
  quoted(db) + ":{{" + tables.map(t => tableInfo(db, t)).mkString(",") + "}}"
}}.mkString("{{", ",", "}}")"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_escapes_quotes_and_backslashes() {
        assert_eq!(string_literal(r#"a "b" \c"#), r#""a \"b\" \\c""#);
        assert_eq!(string_literal("x\ny"), r#""x\ny""#);
    }

    #[test]
    fn sql_statement_wraps_in_sql_context() {
        assert_eq!(
            sql_statement("CREATE TABLE `db`.`t` (a STRING COMMENT \"id\")"),
            r#"var stmt = sqlContext.sql("CREATE TABLE `db`.`t` (a STRING COMMENT \"id\")")"#
        );
    }

    #[test]
    fn cluster_data_script_lists_requested_tables() {
        let mut tables = BTreeMap::new();
        tables.insert("sales".to_string(), vec!["orders".to_string(), "items".to_string()]);
        tables.insert("hr".to_string(), vec![]);

        let script = cluster_data_script(&tables);
        assert!(script.contains(r#""hr" -> Seq()"#));
        assert!(script.contains(r#""sales" -> Seq("orders", "items")"#));
        assert!(script.contains("val clusterData: String ="));
        assert!(script.ends_with(r#".mkString("{", ",", "}")"#));
    }
}
