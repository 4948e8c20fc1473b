//! SQLite-backed definition store.
//!
//! Uses the same `agents` / `tasks` layout as the hosted tables, with
//! `agent_tools` stored as a JSON array.
//!
//! # Example
//!
//! ```rust,no_run
//! use crew_runner::store::SqliteDefinitionStore;
//!
//! let store = SqliteDefinitionStore::open("crews.db").unwrap();
//! store.migrate().unwrap();
//! ```

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, Row};

use super::{parse_string_list, DefinitionStore, TaskDefinition, WorkerDefinition};
use crate::utilities::errors::StoreError;

/// Definitions stored in a local SQLite database.
#[derive(Debug)]
pub struct SqliteDefinitionStore {
    /// Path to the SQLite database file (`:memory:` for in-memory).
    pub db_path: String,
    /// Connection guarded by a mutex for thread safety.
    conn: Mutex<Connection>,
}

impl SqliteDefinitionStore {
    /// Open (or create) the database file. Parent directories are created.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            db_path: path.to_string_lossy().to_string(),
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            db_path: ":memory:".to_string(),
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Lock)
    }

    /// Create the tables if they do not exist.
    pub fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS agents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                crew_id INTEGER NOT NULL,
                name TEXT,
                role TEXT,
                goal TEXT,
                backstory TEXT,
                agent_tools TEXT NOT NULL DEFAULT '[]',
                allow_delegation INTEGER,
                memory INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_agents_crew ON agents(crew_id);
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                crew_id INTEGER NOT NULL,
                agent_id INTEGER,
                name TEXT,
                description TEXT,
                expected_output TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_crew ON tasks(crew_id);",
        )?;
        log::debug!("SqliteDefinitionStore::migrate: {}", self.db_path);
        Ok(())
    }

    /// Insert a worker and return its id. `definition.id` is ignored.
    pub fn insert_worker(
        &self,
        crew_id: i64,
        definition: &WorkerDefinition,
    ) -> Result<i64, StoreError> {
        let tools = serde_json::to_string(&definition.capability_names)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO agents (crew_id, name, role, goal, backstory, agent_tools, allow_delegation, memory)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                crew_id,
                definition.name,
                definition.role,
                definition.goal,
                definition.backstory,
                tools,
                definition.allow_delegation,
                definition.memory,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Insert a task and return its id. `definition.id` is ignored.
    pub fn insert_task(&self, crew_id: i64, definition: &TaskDefinition) -> Result<i64, StoreError> {
        let agent_id = definition
            .assigned_worker_id
            .as_deref()
            .map(|id| {
                id.parse::<i64>()
                    .map_err(|_| StoreError::Decode(format!("agent_id '{}' is not an integer", id)))
            })
            .transpose()?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tasks (crew_id, agent_id, name, description, expected_output)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                crew_id,
                agent_id,
                definition.name,
                definition.description,
                definition.expected_output,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn worker_from_row(row: &Row<'_>) -> rusqlite::Result<(WorkerDefinition, String)> {
        let definition = WorkerDefinition {
            id: row.get::<_, i64>("id")?.to_string(),
            crew_id: row.get("crew_id")?,
            name: row.get("name")?,
            role: row.get("role")?,
            goal: row.get("goal")?,
            backstory: row.get("backstory")?,
            capability_names: Vec::new(),
            allow_delegation: row.get("allow_delegation")?,
            memory: row.get("memory")?,
        };
        Ok((definition, row.get("agent_tools")?))
    }

    fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskDefinition> {
        Ok(TaskDefinition {
            id: row.get::<_, i64>("id")?.to_string(),
            crew_id: row.get("crew_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            expected_output: row.get("expected_output")?,
            assigned_worker_id: row.get::<_, Option<i64>>("agent_id")?.map(|id| id.to_string()),
        })
    }
}

#[async_trait]
impl DefinitionStore for SqliteDefinitionStore {
    fn backend(&self) -> &str {
        "sqlite"
    }

    async fn list_workers(&self, crew_id: i64) -> Result<Vec<WorkerDefinition>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, crew_id, name, role, goal, backstory, agent_tools, allow_delegation, memory
             FROM agents WHERE crew_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![crew_id], Self::worker_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut definition, tools)| {
                definition.capability_names =
                    parse_string_list(serde_json::Value::String(tools)).map_err(|e| {
                        StoreError::Decode(format!("agents.{}.agent_tools: {}", definition.id, e))
                    })?;
                Ok(definition)
            })
            .collect()
    }

    async fn list_work_items(&self, crew_id: i64) -> Result<Vec<TaskDefinition>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, crew_id, agent_id, name, description, expected_output
             FROM tasks WHERE crew_id = ?1 ORDER BY id ASC",
        )?;
        let tasks = stmt
            .query_map(params![crew_id], Self::task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }
}
