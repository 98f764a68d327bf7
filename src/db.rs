use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::models::{from_storage, to_storage, DateFilter, NewTodo, Todo, TodoFilter};

const COLUMNS: &str = "id, title, description, due_date, is_resolved, created_at, updated_at";
const DEFAULT_ORDER: &str = "ORDER BY created_at DESC, id DESC";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn connect<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("opening database at {}", path.as_ref().display()))?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("opening in-memory database")?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                due_date TEXT,
                is_resolved INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS todos_created_at ON todos (created_at);
            "#,
            )
            .context("migrating todos table")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn add_todo(&self, new: &NewTodo) -> anyhow::Result<Todo> {
        let now = now();
        self.conn.execute(
            "INSERT INTO todos (title, description, due_date, is_resolved, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?4)",
            params![
                new.title,
                new.description,
                new.due_date.as_ref().map(to_storage),
                to_storage(&now)
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, "todo created");
        Ok(Todo {
            id,
            title: new.title.clone(),
            description: new.description.clone(),
            due_date: new.due_date,
            is_resolved: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_todo(&self, id: i64) -> anyhow::Result<Option<Todo>> {
        let todo = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM todos WHERE id = ?1"),
                params![id],
                todo_from_row,
            )
            .optional()?;
        Ok(todo)
    }

    /// All records, most recently created first.
    pub fn list_todos(&self) -> anyhow::Result<Vec<Todo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM todos {DEFAULT_ORDER}"))?;
        let rows = stmt.query_map([], todo_from_row)?;

        let mut todos = Vec::new();
        for todo in rows {
            todos.push(todo?);
        }
        Ok(todos)
    }

    /// Records matching the admin search terms and filters, in default order.
    /// Date windows are evaluated against `now`.
    #[tracing::instrument(skip(self))]
    pub fn search_todos(
        &self,
        filter: &TodoFilter,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Todo>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        for term in &filter.terms {
            let pattern = format!("%{}%", escape_like(term));
            values.push(Box::new(pattern));
            let n = values.len();
            clauses.push(format!(
                "(title LIKE ?{n} ESCAPE '\\' OR description LIKE ?{n} ESCAPE '\\')"
            ));
        }
        if let Some(resolved) = filter.is_resolved {
            values.push(Box::new(resolved));
            clauses.push(format!("is_resolved = ?{}", values.len()));
        }
        let date_filters = [
            ("due_date", filter.due_date),
            ("created_at", filter.created_at),
        ];
        for (column, date_filter) in date_filters {
            let Some(date_filter) = date_filter else {
                continue;
            };
            match date_filter {
                DateFilter::NoDate => clauses.push(format!("{column} IS NULL")),
                DateFilter::HasDate => clauses.push(format!("{column} IS NOT NULL")),
                _ => {
                    let Some((start, end)) = date_filter.range(now) else {
                        continue;
                    };
                    values.push(Box::new(to_storage(&start)));
                    let lower = values.len();
                    values.push(Box::new(to_storage(&end)));
                    let upper = values.len();
                    clauses.push(format!("({column} >= ?{lower} AND {column} < ?{upper})"));
                }
            }
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM todos {where_clause} {DEFAULT_ORDER}"
        ))?;
        let rows = stmt.query_map(params_from_iter(values.iter()), todo_from_row)?;

        let mut todos = Vec::new();
        for todo in rows {
            todos.push(todo?);
        }
        Ok(todos)
    }

    pub fn count_todos(&self) -> anyhow::Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Writes every mutable field of `todo` back and refreshes `updated_at`
    /// on the passed value.
    #[tracing::instrument(skip(self, todo), fields(id = todo.id))]
    pub fn update_todo(&self, todo: &mut Todo) -> anyhow::Result<()> {
        let now = now();
        let updated = self.conn.execute(
            "UPDATE todos
             SET title = ?1, description = ?2, due_date = ?3, is_resolved = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                todo.title,
                todo.description,
                todo.due_date.as_ref().map(to_storage),
                todo.is_resolved,
                to_storage(&now),
                todo.id
            ],
        )?;
        if updated == 0 {
            anyhow::bail!("todo {} not found", todo.id);
        }
        todo.updated_at = now;
        Ok(())
    }

    /// Flips the resolved flag. Returns the new state, or `None` when `id`
    /// does not exist.
    #[tracing::instrument(skip(self))]
    pub fn toggle_resolved(&self, id: i64) -> anyhow::Result<Option<bool>> {
        let Some(mut todo) = self.get_todo(id)? else {
            return Ok(None);
        };
        todo.is_resolved = !todo.is_resolved;
        self.update_todo(&mut todo)?;
        Ok(Some(todo.is_resolved))
    }

    /// Returns whether a row was removed.
    #[tracing::instrument(skip(self))]
    pub fn delete_todo(&self, id: i64) -> anyhow::Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM todos WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

/// Current time at the precision timestamps are stored with.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    let due_date: Option<String> = row.get(3)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        due_date: due_date.map(|value| parse_datetime(3, &value)).transpose()?,
        is_resolved: row.get(4)?,
        created_at: parse_datetime(5, &created_at)?,
        updated_at: parse_datetime(6, &updated_at)?,
    })
}

fn parse_datetime(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    from_storage(value)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err)))
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        from_storage(s).unwrap()
    }

    fn ids(todos: Vec<Todo>) -> Vec<i64> {
        todos.iter().map(|t| t.id).collect()
    }

    /// Pins `created_at` so date filters can be checked deterministically.
    fn backdate(db: &Database, id: i64, created_at: &str) {
        db.conn
            .execute(
                "UPDATE todos SET created_at = ?1 WHERE id = ?2",
                params![created_at, id],
            )
            .unwrap();
    }

    #[test]
    fn creating_with_only_a_title_uses_defaults() {
        let db = db();
        let todo = db.add_todo(&NewTodo::titled("Minimal TODO")).unwrap();
        let stored = db.get_todo(todo.id).unwrap().unwrap();
        assert_eq!(stored.title, "Minimal TODO");
        assert_eq!(stored.description, "");
        assert_eq!(stored.due_date, None);
        assert!(!stored.is_resolved);
        assert_eq!(stored.created_at, stored.updated_at);
        assert_eq!(stored, todo);
    }

    #[test]
    fn creating_with_all_fields() {
        let db = db();
        let due = at("2030-01-02T03:04:05.123456Z");
        let todo = db
            .add_todo(&NewTodo {
                title: "Test TODO".into(),
                description: "Test description".into(),
                due_date: Some(due),
            })
            .unwrap();
        let stored = db.get_todo(todo.id).unwrap().unwrap();
        assert_eq!(stored.description, "Test description");
        assert_eq!(stored.due_date, Some(due));
    }

    #[test]
    fn lists_most_recent_first() {
        let db = db();
        let first = db.add_todo(&NewTodo::titled("First")).unwrap();
        let second = db.add_todo(&NewTodo::titled("Second")).unwrap();
        let third = db.add_todo(&NewTodo::titled("Third")).unwrap();

        let ids = ids(db.list_todos().unwrap());
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[test]
    fn ordering_follows_created_at_not_id() {
        let db = db();
        let older = db.add_todo(&NewTodo::titled("older")).unwrap();
        let newer = db.add_todo(&NewTodo::titled("newer")).unwrap();
        backdate(&db, newer.id, "2000-01-01T00:00:00.000000Z");

        let ids = ids(db.list_todos().unwrap());
        assert_eq!(ids, vec![older.id, newer.id]);
    }

    #[test]
    fn update_refreshes_updated_at() {
        let db = db();
        let mut todo = db.add_todo(&NewTodo::titled("before")).unwrap();
        let created = todo.created_at;
        std::thread::sleep(std::time::Duration::from_millis(5));

        todo.title = "after".into();
        todo.description = "changed".into();
        db.update_todo(&mut todo).unwrap();

        let stored = db.get_todo(todo.id).unwrap().unwrap();
        assert_eq!(stored.title, "after");
        assert_eq!(stored.description, "changed");
        assert_eq!(stored.created_at, created);
        assert!(stored.updated_at > created);
    }

    #[test]
    fn update_of_missing_record_fails() {
        let db = db();
        let mut todo = db.add_todo(&NewTodo::titled("gone")).unwrap();
        assert!(db.delete_todo(todo.id).unwrap());
        assert!(db.update_todo(&mut todo).is_err());
    }

    #[test]
    fn toggle_twice_restores_state() {
        let db = db();
        let todo = db.add_todo(&NewTodo::titled("flip")).unwrap();
        assert_eq!(db.toggle_resolved(todo.id).unwrap(), Some(true));
        assert_eq!(db.toggle_resolved(todo.id).unwrap(), Some(false));
        assert!(!db.get_todo(todo.id).unwrap().unwrap().is_resolved);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let db = db();
        assert_eq!(db.get_todo(9999).unwrap(), None);
        assert_eq!(db.toggle_resolved(9999).unwrap(), None);
        assert!(!db.delete_todo(9999).unwrap());
    }

    #[test]
    fn delete_removes_the_row() {
        let db = db();
        let keep = db.add_todo(&NewTodo::titled("keep")).unwrap();
        let doomed = db.add_todo(&NewTodo::titled("doomed")).unwrap();
        assert!(db.delete_todo(doomed.id).unwrap());
        assert_eq!(db.count_todos().unwrap(), 1);
        assert_eq!(db.list_todos().unwrap()[0].id, keep.id);
    }

    #[test]
    fn search_matches_every_term_in_title_or_description() {
        let db = db();
        let milk = db
            .add_todo(&NewTodo {
                title: "Buy MILK".into(),
                description: "from the corner shop".into(),
                due_date: None,
            })
            .unwrap();
        db.add_todo(&NewTodo::titled("Buy bread")).unwrap();

        let filter = TodoFilter {
            terms: vec!["milk".into(), "corner".into()],
            ..Default::default()
        };
        let found = db.search_todos(&filter, Utc::now()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, milk.id);

        let filter = TodoFilter {
            terms: vec!["buy".into()],
            ..Default::default()
        };
        assert_eq!(db.search_todos(&filter, Utc::now()).unwrap().len(), 2);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let db = db();
        db.add_todo(&NewTodo::titled("100% done")).unwrap();
        db.add_todo(&NewTodo::titled("1000 things")).unwrap();

        let filter = TodoFilter {
            terms: vec!["0%".into()],
            ..Default::default()
        };
        let found = db.search_todos(&filter, Utc::now()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "100% done");
    }

    #[test]
    fn filters_by_resolved_and_due_date() {
        let db = db();
        let now = at("2024-06-15T12:00:00Z");
        let due_today = db
            .add_todo(&NewTodo {
                title: "today".into(),
                description: String::new(),
                due_date: Some(at("2024-06-15T18:00:00Z")),
            })
            .unwrap();
        let due_later = db
            .add_todo(&NewTodo {
                title: "later".into(),
                description: String::new(),
                due_date: Some(at("2024-09-01T09:00:00Z")),
            })
            .unwrap();
        let undated = db.add_todo(&NewTodo::titled("whenever")).unwrap();
        db.toggle_resolved(due_later.id).unwrap();

        let by = |filter: TodoFilter| ids(db.search_todos(&filter, now).unwrap());

        assert_eq!(
            by(TodoFilter {
                is_resolved: Some(true),
                ..Default::default()
            }),
            vec![due_later.id]
        );
        assert_eq!(
            by(TodoFilter {
                due_date: Some(DateFilter::Today),
                ..Default::default()
            }),
            vec![due_today.id]
        );
        assert_eq!(
            by(TodoFilter {
                due_date: Some(DateFilter::ThisYear),
                ..Default::default()
            }),
            vec![due_later.id, due_today.id]
        );
        assert_eq!(
            by(TodoFilter {
                due_date: Some(DateFilter::NoDate),
                ..Default::default()
            }),
            vec![undated.id]
        );
        assert_eq!(
            by(TodoFilter {
                due_date: Some(DateFilter::HasDate),
                is_resolved: Some(false),
                ..Default::default()
            }),
            vec![due_today.id]
        );
    }

    #[test]
    fn filters_by_created_at_window() {
        let db = db();
        let now = at("2024-06-15T12:00:00Z");
        let recent = db.add_todo(&NewTodo::titled("recent")).unwrap();
        let last_month = db.add_todo(&NewTodo::titled("last month")).unwrap();
        backdate(&db, recent.id, "2024-06-12T08:00:00.000000Z");
        backdate(&db, last_month.id, "2024-05-20T08:00:00.000000Z");

        let filter = TodoFilter {
            created_at: Some(DateFilter::PastSevenDays),
            ..Default::default()
        };
        let found = ids(db.search_todos(&filter, now).unwrap());
        assert_eq!(found, vec![recent.id]);

        let filter = TodoFilter {
            created_at: Some(DateFilter::ThisYear),
            ..Default::default()
        };
        assert_eq!(db.search_todos(&filter, now).unwrap().len(), 2);
    }

    #[test]
    fn connect_creates_file_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todo.db");
        let id = {
            let db = Database::connect(&path).unwrap();
            db.add_todo(&NewTodo::titled("persisted")).unwrap().id
        };
        let db = Database::connect(&path).unwrap();
        assert_eq!(db.get_todo(id).unwrap().unwrap().title, "persisted");
    }
}
