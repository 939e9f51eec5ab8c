//! Doctor command implementation.
//!
//! Checks that every configured table and every column the config names
//! (id, soft-delete, relation and filter columns) exists in the database. The query layer never checks
//! this itself; a missing soft-delete column only shows up as
//! `ColumnNotFound` when a query runs.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cli::Session;
use crate::config::{RelationConfig, TableConfig};
use crate::error::{Result, SoftdelError};
use crate::storage::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct DoctorReport {
    ok: bool,
    checks: Vec<CheckResult>,
}

fn push_check(
    checks: &mut Vec<CheckResult>,
    name: impl Into<String>,
    status: CheckStatus,
    message: Option<String>,
) {
    checks.push(CheckResult {
        name: name.into(),
        status,
        message,
    });
}

fn error_count(checks: &[CheckResult]) -> usize {
    checks
        .iter()
        .filter(|check| check.status == CheckStatus::Error)
        .count()
}

fn print_report(report: &DoctorReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!("sd doctor");
    for check in &report.checks {
        let label = match check.status {
            CheckStatus::Ok => "OK",
            CheckStatus::Warn => "WARN",
            CheckStatus::Error => "ERROR",
        };
        if let Some(message) = &check.message {
            println!("{label} {}: {}", check.name, message);
        } else {
            println!("{label} {}", check.name);
        }
    }
    Ok(())
}

fn check_integrity(db: &Database, checks: &mut Vec<CheckResult>) -> Result<()> {
    let result: String = db
        .connection()
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    if result.trim().eq_ignore_ascii_case("ok") {
        push_check(checks, "sqlite.integrity_check", CheckStatus::Ok, None);
    } else {
        push_check(
            checks,
            "sqlite.integrity_check",
            CheckStatus::Error,
            Some(result),
        );
    }
    Ok(())
}

/// Column lists of every table the checks touch, read once.
struct Schema<'db> {
    db: &'db Database,
    columns: BTreeMap<String, Vec<String>>,
}

impl<'db> Schema<'db> {
    const fn new(db: &'db Database) -> Self {
        Self {
            db,
            columns: BTreeMap::new(),
        }
    }

    fn columns(&mut self, table: &str) -> Result<&[String]> {
        if !self.columns.contains_key(table) {
            let columns = self.db.table_columns(table)?;
            self.columns.insert(table.to_string(), columns);
        }
        Ok(self.columns.get(table).map_or(&[][..], Vec::as_slice))
    }

    fn has_column(&mut self, table: &str, column: &str) -> Result<bool> {
        Ok(self.columns(table)?.iter().any(|name| name == column))
    }
}

fn check_column(
    schema: &mut Schema<'_>,
    checks: &mut Vec<CheckResult>,
    name: String,
    table: &str,
    column: &str,
) -> Result<()> {
    if schema.has_column(table, column)? {
        push_check(checks, name, CheckStatus::Ok, None);
    } else {
        push_check(
            checks,
            name,
            CheckStatus::Error,
            Some(format!("column '{column}' not found in '{table}'")),
        );
    }
    Ok(())
}

fn check_table(
    schema: &mut Schema<'_>,
    checks: &mut Vec<CheckResult>,
    name: &str,
    table: &TableConfig,
) -> Result<()> {
    let prefix = format!("tables.{name}");
    if schema.columns(name)?.is_empty() {
        push_check(
            checks,
            &prefix,
            CheckStatus::Error,
            Some("table does not exist".to_string()),
        );
        return Ok(());
    }
    push_check(checks, &prefix, CheckStatus::Ok, None);

    check_column(
        schema,
        checks,
        format!("{prefix}.id_column"),
        name,
        &table.id_column,
    )?;

    match &table.soft_delete {
        Some(config) => check_column(
            schema,
            checks,
            format!("{prefix}.soft_delete"),
            name,
            config.column_name(),
        )?,
        None => push_check(
            checks,
            format!("{prefix}.soft_delete"),
            CheckStatus::Warn,
            Some("not configured; delete removes rows".to_string()),
        ),
    }

    for (filter_name, columns) in &table.filters {
        for column in columns.keys() {
            check_column(
                schema,
                checks,
                format!("{prefix}.filters.{filter_name}.{column}"),
                name,
                column,
            )?;
        }
    }

    for (relation_name, relation) in &table.relations {
        check_relation(
            schema,
            checks,
            &format!("{prefix}.relations.{relation_name}"),
            name,
            relation,
        )?;
    }
    Ok(())
}

fn check_relation(
    schema: &mut Schema<'_>,
    checks: &mut Vec<CheckResult>,
    prefix: &str,
    owner: &str,
    relation: &RelationConfig,
) -> Result<()> {
    check_column(schema, checks, format!("{prefix}.from"), owner, &relation.from)?;
    check_column(
        schema,
        checks,
        format!("{prefix}.to"),
        &relation.table,
        &relation.to,
    )?;
    if let Some(through) = &relation.through {
        check_column(
            schema,
            checks,
            format!("{prefix}.through.from"),
            &through.table,
            &through.from,
        )?;
        check_column(
            schema,
            checks,
            format!("{prefix}.through.to"),
            &through.table,
            &through.to,
        )?;
    }
    Ok(())
}

fn collect_checks(session: &Session) -> Result<Vec<CheckResult>> {
    let mut checks = Vec::new();
    check_integrity(&session.db, &mut checks)?;

    let mut schema = Schema::new(&session.db);
    for (name, table) in &session.workspace.config().tables {
        check_table(&mut schema, &mut checks, name, table)?;
    }
    Ok(checks)
}

/// Execute the doctor command.
///
/// # Errors
///
/// Returns `Doctor` when any check fails, or an error if a check cannot
/// run.
pub fn execute(session: &Session) -> Result<()> {
    let checks = collect_checks(session)?;
    let problems = error_count(&checks);
    let report = DoctorReport {
        ok: problems == 0,
        checks,
    };
    print_report(&report, session.json)?;

    if problems > 0 {
        return Err(SoftdelError::Doctor { problems });
    }
    Ok(())
}
