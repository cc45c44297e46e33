#![allow(async_fn_in_trait)]

//! Database fixtures.
//!
//! A fixture file is YAML mapping table names to rows, loaded in file order:
//!
//! ```yaml
//! users:
//!   - { id: 1, email: alice@example.com, active: true }
//! orders:
//!   - id: 7
//!     user_id: 1
//!     status: created
//!     meta: { source: web }   # nested values are stored as JSON
//! ```

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement, TransactionTrait};
use tracing::debug;

use apicase_core::HarnessError;
use apicase_core::path::build;

/// Something that can wipe and seed the database between test cases.
pub trait FixtureStore: Send + Sync {
    /// Remove every row the fixtures may have created.
    async fn purge(&self) -> Result<(), HarnessError>;

    /// Insert the rows of `files`, in order. Returns the number of rows.
    async fn load(&self, files: &[PathBuf]) -> Result<usize, HarnessError>;
}

/// One row decoded from a fixture file.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureRow {
    pub table: String,
    pub columns: Vec<(String, sea_orm::Value)>,
}

/// Decode the rows of a fixture file. An empty file yields no rows.
pub fn read_fixture_file(path: &Path) -> Result<Vec<FixtureRow>, HarnessError> {
    let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    let doc: Option<serde_yaml::Mapping> =
        serde_yaml::from_str(&text).map_err(|source| HarnessError::FixtureFormat {
            path: path.to_path_buf(),
            source,
        })?;

    let invalid = |what: String| {
        HarnessError::Configuration(format!("invalid fixture file {}: {what}", path.display()))
    };

    let mut rows = Vec::new();
    for (table, records) in doc.unwrap_or_default() {
        let table = table
            .as_str()
            .ok_or_else(|| invalid("table names must be strings".to_owned()))?;
        let records = records
            .as_sequence()
            .ok_or_else(|| invalid(format!("{table} must be a list of rows")))?;
        for record in records {
            let record = record
                .as_mapping()
                .ok_or_else(|| invalid(format!("rows of {table} must be mappings")))?;
            let mut columns = Vec::with_capacity(record.len());
            for (column, value) in record {
                let column = column
                    .as_str()
                    .ok_or_else(|| invalid(format!("column names of {table} must be strings")))?;
                let value = column_value(value)
                    .ok_or_else(|| invalid(format!("unsupported value for {table}.{column}")))?;
                columns.push((column.to_owned(), value));
            }
            rows.push(FixtureRow {
                table: table.to_owned(),
                columns,
            });
        }
    }
    Ok(rows)
}

fn column_value(value: &serde_yaml::Value) -> Option<sea_orm::Value> {
    use serde_yaml::Value as Yaml;

    let value = match value {
        Yaml::Null => Option::<String>::None.into(),
        Yaml::Bool(b) => (*b).into(),
        Yaml::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.into(),
            (None, Some(f)) => f.into(),
            (None, None) => return None,
        },
        Yaml::String(s) => s.clone().into(),
        Yaml::Sequence(_) | Yaml::Mapping(_) => serde_json::to_value(value).ok()?.into(),
        Yaml::Tagged(_) => return None,
    };
    Some(value)
}

/// `INSERT INTO "table" ("a", "b") VALUES ($1, $2)` for the row's backend.
pub fn insert_statement(backend: DbBackend, row: &FixtureRow) -> Statement {
    let columns: Vec<String> = row
        .columns
        .iter()
        .map(|(name, _)| quote_ident(backend, name))
        .collect();
    let placeholders: Vec<String> = (1..=row.columns.len())
        .map(|i| placeholder(backend, i))
        .collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(backend, &row.table),
        columns.join(", "),
        placeholders.join(", ")
    );
    Statement::from_sql_and_values(backend, sql, row.columns.iter().map(|(_, v)| v.clone()))
}

fn quote_ident(backend: DbBackend, ident: &str) -> String {
    if backend == DbBackend::MySql {
        format!("`{}`", ident.replace('`', "``"))
    } else {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

fn placeholder(backend: DbBackend, index: usize) -> String {
    if backend == DbBackend::Postgres {
        format!("${index}")
    } else {
        "?".to_owned()
    }
}

/// [`FixtureStore`] over a sea-orm connection.
///
/// `tables` lists every table fixtures may touch, parents before children;
/// purging deletes from them in reverse order so foreign keys hold.
pub struct SeaOrmFixtureStore {
    db: DatabaseConnection,
    tables: Vec<String>,
}

impl SeaOrmFixtureStore {
    pub fn new<I, S>(db: DatabaseConnection, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            db,
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn into_connection(self) -> DatabaseConnection {
        self.db
    }
}

impl FixtureStore for SeaOrmFixtureStore {
    async fn purge(&self) -> Result<(), HarnessError> {
        let backend = self.db.get_database_backend();
        for table in self.tables.iter().rev() {
            let sql = format!("DELETE FROM {}", quote_ident(backend, table));
            self.db.execute(Statement::from_string(backend, sql)).await?;
        }
        debug!(tables = self.tables.len(), "purged database");
        Ok(())
    }

    /// Decodes every file first, then inserts all rows in one transaction.
    /// A failure leaves the database untouched.
    async fn load(&self, files: &[PathBuf]) -> Result<usize, HarnessError> {
        let rows = files
            .iter()
            .map(|file| read_fixture_file(file))
            .collect::<Result<Vec<_>, _>>()?;

        let backend = self.db.get_database_backend();
        let txn = self.db.begin().await?;
        let mut inserted = 0;
        for (file, rows) in files.iter().zip(&rows) {
            for row in rows {
                txn.execute(insert_statement(backend, row)).await?;
                inserted += 1;
            }
            debug!(file = %file.display(), rows = rows.len(), "inserted fixture rows");
        }
        txn.commit().await?;
        Ok(inserted)
    }
}

/// Fixture files queued for one test case, resolved against the fixtures folder.
#[derive(Debug)]
pub struct FixtureSet {
    folder: PathBuf,
    pending: Vec<PathBuf>,
}

impl FixtureSet {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            pending: Vec::new(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn pending(&self) -> &[PathBuf] {
        &self.pending
    }

    fn resolve(&self, source: &str) -> Result<PathBuf, HarnessError> {
        let path = build([self.folder.as_os_str(), OsStr::new(source)]);
        if !path.exists() {
            return Err(HarnessError::missing_source(&path));
        }
        Ok(path)
    }

    /// Queue fixture files, relative to the fixtures folder. Every file must
    /// exist; nothing is queued if one is missing.
    pub fn add_fixture_files<I, S>(&mut self, sources: I) -> Result<(), HarnessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let resolved = sources
            .into_iter()
            .map(|source| self.resolve(source.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.pending.extend(resolved);
        Ok(())
    }

    /// Load every queued file. The queue is cleared only once the store
    /// accepted all of them; after a failure it still holds every file.
    pub async fn persist_fixtures<S: FixtureStore>(&mut self, store: &S) -> Result<usize, HarnessError> {
        let inserted = store.load(&self.pending).await?;
        debug!(files = self.pending.len(), rows = inserted, "persisted fixtures");
        self.pending.clear();
        Ok(inserted)
    }

    /// Load every `*.yml`/`*.yaml` file under `source` (relative to the
    /// fixtures folder, searched recursively, sorted by path).
    pub async fn load_fixtures_from_directory<S: FixtureStore>(
        &self,
        store: &S,
        source: &str,
    ) -> Result<usize, HarnessError> {
        let dir = self.resolve(source)?;
        let files = fixture_files_in(&dir)?;
        if files.is_empty() {
            return Err(HarnessError::no_fixture_files(&dir));
        }
        store.load(&files).await
    }
}

fn fixture_files_in(dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current).map_err(|e| HarnessError::io(&current, e))?;
        for entry in entries {
            let path = entry.map_err(|e| HarnessError::io(&current, e))?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext == "yml" || ext == "yaml")
            {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
