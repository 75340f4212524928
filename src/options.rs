//! Growable option vocabularies (units of measure, inventory types) offered by
//! the product form. Session-scoped by default; pass a file path to keep
//! additions across runs.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use crate::dialog::Dialog;
use crate::error::{DashboardError, Result};
use crate::models::{DEFAULT_INVENTORY_TYPES, DEFAULT_UOMS};

const SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Uom,
    InventoryType,
}

impl OptionKind {
    fn key(&self) -> &'static str {
        match self {
            OptionKind::Uom => "uom",
            OptionKind::InventoryType => "inventory_type",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OptionKind::Uom => "unit of measure",
            OptionKind::InventoryType => "inventory type",
        }
    }

    fn defaults(&self) -> &'static [&'static str] {
        match self {
            OptionKind::Uom => DEFAULT_UOMS,
            OptionKind::InventoryType => DEFAULT_INVENTORY_TYPES,
        }
    }
}

fn configure_sqlite(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA synchronous = NORMAL;\n\
         PRAGMA temp_store = MEMORY;\n",
    )?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS app_meta (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS option_values (
            kind TEXT NOT NULL,
            value TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (kind, value)
        );
        "#,
    )
}

fn app_meta_get(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT value FROM app_meta WHERE key = ?1", params![key], |row| row.get(0))
        .optional()
}

fn app_meta_set(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO app_meta(key, value) VALUES(?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Defaults are inserted once; a persisted file keeps whatever was added since.
fn seed_defaults(conn: &mut Connection) -> rusqlite::Result<()> {
    if app_meta_get(conn, "schema_version")?.as_deref() == Some(SCHEMA_VERSION) {
        return Ok(());
    }
    let tx = conn.transaction()?;
    for kind in [OptionKind::Uom, OptionKind::InventoryType] {
        for (i, value) in kind.defaults().iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO option_values(kind, value, position) VALUES(?1, ?2, ?3)",
                params![kind.key(), value, i as i64],
            )?;
        }
    }
    app_meta_set(&tx, "schema_version", SCHEMA_VERSION)?;
    tx.commit()
}

fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[derive(Clone)]
pub struct OptionStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for OptionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionStore").finish_non_exhaustive()
    }
}

impl OptionStore {
    /// Session-scoped store; additions vanish when the store is dropped.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// File-backed when `path` is set, in-memory otherwise.
    pub fn from_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    fn init(mut conn: Connection) -> Result<Self> {
        configure_sqlite(&conn)?;
        init_schema(&conn)?;
        seed_defaults(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, op_name: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| DashboardError::Storage("option store mutex poisoned".to_string()))?;
            f(&mut guard).map_err(|e| {
                tracing::warn!(op = op_name, error = %e, "option store query failed");
                DashboardError::from(e)
            })
        })
        .await
        .map_err(|e| DashboardError::Storage(e.to_string()))?
    }

    /// Values in the order they were added.
    pub async fn list(&self, kind: OptionKind) -> Result<Vec<String>> {
        self.with_conn("list", move |conn| {
            let mut stmt =
                conn.prepare("SELECT value FROM option_values WHERE kind = ?1 ORDER BY position, value")?;
            let values = stmt
                .query_map(params![kind.key()], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(values)
        })
        .await
    }

    pub async fn contains(&self, kind: OptionKind, value: &str) -> Result<bool> {
        let value = normalize(value);
        self.with_conn("contains", move |conn| {
            conn.query_row(
                "SELECT 1 FROM option_values WHERE kind = ?1 AND value = ?2",
                params![kind.key(), value],
                |_| Ok(()),
            )
            .optional()
            .map(|hit| hit.is_some())
        })
        .await
    }

    /// Adds a value and returns its normalized form. Adding an existing value is a no-op.
    pub async fn add(&self, kind: OptionKind, raw: &str) -> Result<String> {
        let value = normalize(raw);
        if value.is_empty() {
            return Err(DashboardError::validation(kind.key(), format!("{} cannot be empty", kind.label())));
        }

        let stored = value.clone();
        let inserted = self
            .with_conn("add", move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO option_values(kind, value, position)
                     VALUES(?1, ?2, (SELECT COALESCE(MAX(position), -1) + 1 FROM option_values WHERE kind = ?1))",
                    params![kind.key(), stored],
                )
            })
            .await?;

        if inserted > 0 {
            tracing::info!(kind = kind.key(), value = %value, "added option");
        }
        Ok(value)
    }

    /// The "add new option" flow: asks for a value and adds it.
    /// `None` when the user cancels or enters nothing.
    pub async fn add_via_prompt(&self, kind: OptionKind, dialog: &dyn Dialog) -> Result<Option<String>> {
        let message = format!("Enter new {}", kind.label());
        match dialog.prompt(&message).await {
            Some(answer) if !normalize(&answer).is_empty() => self.add(kind, &answer).await.map(Some),
            _ => Ok(None),
        }
    }
}
