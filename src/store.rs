use crate::error::EngineError;
use crate::schema::{EntityKind, FieldValue, Payload, Record};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode, OptionalExtension};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    Discipline(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Insert,
    Update,
    Delete,
}

/// Storage collaborator over one SQLite connection.
///
/// Every mutation runs in its own transaction and rolls back explicitly before
/// surfacing an error.
pub struct Store<'a> {
    conn: &'a Connection,
}

impl<'a> Store<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Store { conn }
    }

    pub fn fetch_all(
        &self,
        kind: EntityKind,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<Record>, EngineError> {
        let mut sql = select_sql(kind);
        let mut bind: Vec<Value> = Vec::new();
        if let Some(RecordFilter::Discipline(d)) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(discipline_clause(kind));
            bind.push(Value::Text(d.clone()));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(bind), |row| read_record(kind, row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn fetch_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<Record>, EngineError> {
        let sql = format!("{} WHERE id = ?", select_sql(kind));
        let rec = self
            .conn
            .query_row(&sql, [id], |row| read_record(kind, row))
            .optional()?;
        Ok(rec)
    }

    pub fn count(&self, kind: EntityKind) -> Result<i64, EngineError> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        Ok(self.conn.query_row(&sql, [], |r| r.get(0))?)
    }

    pub fn insert(&self, kind: EntityKind, payload: &Payload) -> Result<i64, EngineError> {
        let (cols, values) = bind_columns(kind, payload);
        let placeholders = vec!["?"; cols.len()].join(", ");
        let sql = format!(
            "INSERT INTO {}({}) VALUES({})",
            kind.table(),
            cols.join(", "),
            placeholders
        );

        let tx = self.conn.unchecked_transaction()?;
        if let Err(e) = tx.execute(&sql, params_from_iter(values)) {
            rollback(tx, kind);
            return Err(classify(kind, None, Mutation::Insert, e));
        }
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    pub fn update(&self, kind: EntityKind, id: i64, payload: &Payload) -> Result<(), EngineError> {
        let (cols, mut values) = bind_columns(kind, payload);
        let assignments = cols
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            kind.table(),
            assignments
        );
        values.push(Value::Integer(id));

        let tx = self.conn.unchecked_transaction()?;
        let changed = match tx.execute(&sql, params_from_iter(values)) {
            Ok(n) => n,
            Err(e) => {
                rollback(tx, kind);
                return Err(classify(kind, Some(id), Mutation::Update, e));
            }
        };
        if changed == 0 {
            rollback(tx, kind);
            return Err(EngineError::NotFound { entity: kind, id });
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete(&self, kind: EntityKind, id: i64) -> Result<(), EngineError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", kind.table());

        let tx = self.conn.unchecked_transaction()?;
        let changed = match tx.execute(&sql, [id]) {
            Ok(n) => n,
            Err(e) => {
                rollback(tx, kind);
                return Err(classify(kind, Some(id), Mutation::Delete, e));
            }
        };
        if changed == 0 {
            rollback(tx, kind);
            return Err(EngineError::NotFound { entity: kind, id });
        }
        tx.commit()?;
        Ok(())
    }
}

fn select_sql(kind: EntityKind) -> String {
    let cols = kind
        .attrs()
        .iter()
        .filter_map(|a| a.column())
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT id, {} FROM {}", cols, kind.table())
}

fn discipline_clause(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Student | EntityKind::Course => "discipline = ?",
        EntityKind::Offering => "course_id IN (SELECT id FROM courses WHERE discipline = ?)",
        EntityKind::Selection => "student_id IN (SELECT id FROM students WHERE discipline = ?)",
        EntityKind::Instructor => {
            "id IN (SELECT o.instructor_id
                    FROM offerings o
                    JOIN courses c ON c.id = o.course_id
                    WHERE c.discipline = ?)"
        }
    }
}

fn read_record(kind: EntityKind, row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
    let id: i64 = row.get(0)?;
    let mut values = Payload::new();
    for (i, attr) in kind.attrs().iter().enumerate() {
        let v: Value = row.get(i + 1)?;
        values.insert(*attr, FieldValue::from(v));
    }
    Ok(Record { kind, id, values })
}

/// Every stored attribute is written; absent payload entries become NULL.
fn bind_columns(kind: EntityKind, payload: &Payload) -> (Vec<&'static str>, Vec<Value>) {
    let mut cols = Vec::new();
    let mut values = Vec::new();
    for attr in kind.attrs() {
        let Some(col) = attr.column() else {
            continue;
        };
        cols.push(col);
        values.push(
            payload
                .get(attr)
                .map(FieldValue::to_sql)
                .unwrap_or(Value::Null),
        );
    }
    (cols, values)
}

fn rollback(tx: rusqlite::Transaction<'_>, kind: EntityKind) {
    if let Err(e) = tx.rollback() {
        log::warn!("rollback on {} failed: {e}", kind.table());
    }
}

fn classify(
    kind: EntityKind,
    id: Option<i64>,
    op: Mutation,
    e: rusqlite::Error,
) -> EngineError {
    let constraint = matches!(
        &e,
        rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation
    );
    if !constraint {
        log::warn!("{:?} {:?} rolled back: {}", op, kind, e);
        return EngineError::Storage(e);
    }
    log::info!("{:?} {:?} rejected by constraint: {}", op, kind, e);
    match (op, id) {
        (Mutation::Delete, Some(id)) => EngineError::DependencyError { entity: kind, id },
        _ => EngineError::IntegrityError {
            entity: kind,
            message: e.to_string(),
        },
    }
}
