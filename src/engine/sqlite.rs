//! Bundled SQLite backend.
//!
//! Each engine is a uniquely named shared-cache in-memory database, so every
//! `connect()` opens a real, separate connection onto the same tables. An
//! anchor connection keeps the database alive until `terminate`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;
use uuid::Uuid;

use super::error::{EngineError, EngineResult};
use super::{
    AnalyticalEngine, CellValue, EngineBundle, EngineConnection, EngineHandle, EngineProvider,
    ProgressReporter, QueryResult, ResultSchema,
};
use crate::sql::Dialect;

fn open_flags() -> OpenFlags {
    OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX
}

/// Provider for [`SqliteEngine`]. Bundle selection and context creation
/// are trivial; instantiation opens the database.
#[derive(Debug, Clone, Default)]
pub struct SqliteProvider;

impl SqliteProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EngineProvider for SqliteProvider {
    async fn select_bundle(&self) -> EngineResult<EngineBundle> {
        Ok(EngineBundle {
            name: "sqlite".into(),
            version: rusqlite::version().into(),
        })
    }

    async fn create_context(&self, _bundle: &EngineBundle) -> EngineResult<()> {
        Ok(())
    }

    async fn instantiate(
        &self,
        _bundle: &EngineBundle,
        progress: ProgressReporter,
    ) -> EngineResult<EngineHandle> {
        progress.report(0, Some(1));
        let engine = tokio::task::spawn_blocking(SqliteEngine::open).await??;
        progress.report(1, Some(1));
        Ok(Arc::new(engine))
    }
}

/// In-process SQLite engine.
pub struct SqliteEngine {
    uri: String,
    anchor: Mutex<Option<Connection>>,
    terminated: AtomicBool,
}

impl SqliteEngine {
    /// Open a fresh, empty database.
    pub fn open() -> EngineResult<Self> {
        let uri = format!("file:pivotal-{}?mode=memory&cache=shared", Uuid::new_v4());
        let anchor = Connection::open_with_flags(&uri, open_flags())
            .map_err(|e| EngineError::Instantiation(e.to_string()))?;
        debug!(uri = %uri, "opened sqlite engine");
        Ok(Self {
            uri,
            anchor: Mutex::new(Some(anchor)),
            terminated: AtomicBool::new(false),
        })
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalyticalEngine for SqliteEngine {
    async fn connect(&self) -> EngineResult<Box<dyn EngineConnection>> {
        if self.is_terminated() {
            return Err(EngineError::Terminated);
        }
        let conn = Connection::open_with_flags(&self.uri, open_flags())
            .map_err(|e| EngineError::ConnectionFailed(e.to_string()))?;
        Ok(Box::new(SqliteConnection {
            conn: Arc::new(Mutex::new(Some(conn))),
        }))
    }

    async fn terminate(&self) -> EngineResult<()> {
        if !self.terminated.swap(true, Ordering::SeqCst) {
            self.anchor.lock().take();
            debug!(uri = %self.uri, "terminated sqlite engine");
        }
        Ok(())
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }
}

struct SqliteConnection {
    conn: Arc<Mutex<Option<Connection>>>,
}

#[async_trait]
impl EngineConnection for SqliteConnection {
    async fn query(&mut self, sql: &str) -> EngineResult<QueryResult> {
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            let conn = guard.as_ref().ok_or(EngineError::ConnectionClosed)?;
            run_statement(conn, &sql)
        })
        .await?
    }

    async fn close(&mut self) -> EngineResult<()> {
        self.conn.lock().take();
        Ok(())
    }
}

fn run_statement(conn: &Connection, sql: &str) -> EngineResult<QueryResult> {
    let query_err = |e: rusqlite::Error| EngineError::query(e.to_string(), sql);

    let mut stmt = conn.prepare(sql).map_err(query_err)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    if names.is_empty() {
        stmt.execute([]).map_err(query_err)?;
        return Ok(QueryResult::default());
    }

    let mut rows = stmt.query([]).map_err(query_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(query_err)? {
        let mut cells = Vec::with_capacity(names.len());
        for i in 0..names.len() {
            cells.push(cell_from_ref(row.get_ref(i).map_err(query_err)?));
        }
        out.push(cells);
    }

    Ok(QueryResult {
        schema: ResultSchema::from_names(names),
        rows: out,
    })
}

fn cell_from_ref(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(n) => CellValue::Int(n),
        ValueRef::Real(f) => CellValue::Float(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
