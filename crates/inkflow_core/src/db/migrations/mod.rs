//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations as an ordered chain of `from -> to` steps.
//! - Apply pending steps atomically.
//!
//! # Invariants
//! - Each step starts at the version the previous step ends at.
//! - Applied migration version is mirrored to `PRAGMA user_version` inside the
//!   same transaction as the step itself.
//! - The v1 -> v2 step never overwrites a project row that already exists and
//!   only back-fills `project_id` where it is NULL.

use crate::clock::now_ms;
use crate::db::{DbError, DbResult};
use crate::model::project::DEFAULT_PROJECT_ID;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

/// Tables that gained a `project_id` scope in schema v2.
const PROJECT_SCOPED_TABLES: [&str; 3] = ["ideas", "characters", "chapters"];

type StepFn = fn(&Transaction<'_>, &mut MigrationReport) -> DbResult<()>;

#[derive(Clone, Copy)]
enum MigrationAction {
    Sql(&'static str),
    Step(StepFn),
}

#[derive(Clone, Copy)]
struct Migration {
    from: u32,
    to: u32,
    name: &'static str,
    action: MigrationAction,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        from: 0,
        to: 1,
        name: "story_v1",
        action: MigrationAction::Sql(include_str!("0001_story_v1.sql")),
    },
    Migration {
        from: 1,
        to: 2,
        name: "projects",
        action: MigrationAction::Step(adopt_legacy_story),
    },
    Migration {
        from: 2,
        to: 3,
        name: "custom_idea_types",
        action: MigrationAction::Sql(include_str!("0003_custom_idea_types.sql")),
    },
];

/// Outcome of one bootstrap pass over the migration registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// `user_version` observed before any step ran.
    pub from_version: u32,
    /// `user_version` after the pass.
    pub to_version: u32,
    /// Applied steps as `(from, to)` pairs, in order.
    pub applied: Vec<(u32, u32)>,
    /// Project id the v1 -> v2 step scoped legacy rows to, when it ran.
    pub adopted_project_id: Option<String>,
}

impl MigrationReport {
    fn starting_at(version: u32) -> Self {
        Self {
            from_version: version,
            to_version: version,
            ..Self::default()
        }
    }

    /// Returns whether the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.to)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    apply_migrations_up_to(conn, latest_version())
}

/// Applies pending migrations until `target` is reached.
///
/// Used by tooling and tests that need a database frozen at an older layout.
/// A `target` beyond the latest known version is clamped.
pub fn apply_migrations_up_to(conn: &mut Connection, target: u32) -> DbResult<MigrationReport> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    let target = target.min(latest);
    let mut report = MigrationReport::starting_at(current_version);
    if current_version >= target {
        return Ok(report);
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.from < current_version || migration.to > target {
            continue;
        }

        match migration.action {
            MigrationAction::Sql(sql) => tx.execute_batch(sql)?,
            MigrationAction::Step(step) => step(&tx, &mut report)?,
        }
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.to))?;
        report.applied.push((migration.from, migration.to));
        report.to_version = migration.to;
        info!(
            "event=db_migrate module=db status=ok step={} from_version={} to_version={}",
            migration.name, migration.from, migration.to
        );
    }
    tx.commit()?;

    Ok(report)
}

/// v1 -> v2: promote the singleton story into the project collection and scope
/// every unscoped idea, character and chapter to it.
fn adopt_legacy_story(tx: &Transaction<'_>, report: &mut MigrationReport) -> DbResult<()> {
    tx.execute_batch(include_str!("0002_projects.sql"))?;

    for table in PROJECT_SCOPED_TABLES {
        if !table_has_column(tx, table, "project_id")? {
            tx.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN project_id TEXT;"))?;
        }
        tx.execute_batch(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_project_id ON {table}(project_id);"
        ))?;
    }

    let now = now_ms();
    let legacy: Option<(i64, Option<String>)> = tx
        .query_row(
            "SELECT rowid, id FROM story ORDER BY rowid ASC LIMIT 1;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let project_id = legacy
        .as_ref()
        .and_then(|(_, id)| id.clone())
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string());

    match legacy {
        Some((rowid, _)) => {
            tx.execute(
                "INSERT INTO projects (
                    id,
                    one_sentence,
                    setup,
                    disaster1,
                    disaster2,
                    disaster3,
                    ending,
                    created_at,
                    updated_at
                )
                SELECT
                    ?1,
                    COALESCE(one_sentence, ''),
                    COALESCE(setup, ''),
                    COALESCE(disaster1, ''),
                    COALESCE(disaster2, ''),
                    COALESCE(disaster3, ''),
                    COALESCE(ending, ''),
                    COALESCE(created_at, ?2),
                    COALESCE(updated_at, ?2)
                FROM story
                WHERE rowid = ?3
                ON CONFLICT(id) DO NOTHING;",
                params![project_id, now, rowid],
            )?;
        }
        None => {
            tx.execute(
                "INSERT INTO projects (id, created_at, updated_at)
                 VALUES (?1, ?2, ?2)
                 ON CONFLICT(id) DO NOTHING;",
                params![project_id, now],
            )?;
        }
    }

    for table in PROJECT_SCOPED_TABLES {
        tx.execute(
            &format!("UPDATE {table} SET project_id = ?1 WHERE project_id IS NULL;"),
            [project_id.as_str()],
        )?;
    }

    report.adopted_project_id = Some(project_id);
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
