use anyhow::Result;
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension, Params, Row};

use super::SqliteStorage;

/// A row type backed by exactly one table.
pub trait Entity: Sized {
    const TABLE: &'static str;
    /// Select list for plain reads, in the order `from_row` expects.
    const COLUMNS: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Ordered column/value pairs for inserts and partial updates.
///
/// Column names are always `'static` so they come from code, never from a
/// request body; values are bound as parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields {
    pairs: Vec<(&'static str, Value)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn set_opt<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.push(column, value);
        }
        self
    }

    pub fn push(&mut self, column: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.pairs.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pairs.iter().map(|(c, _)| *c)
    }

    fn values(&self) -> impl Iterator<Item = &Value> {
        self.pairs.iter().map(|(_, v)| v)
    }
}

pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Substring pattern for `LIKE ?1 ESCAPE '\'`; wildcards in `term` match literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("%{escaped}%")
}

pub(crate) fn query_all<T, P, F>(conn: &Connection, sql: &str, params: P, f: F) -> rusqlite::Result<Vec<T>>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, f)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn query_one<T, P, F>(conn: &Connection, sql: &str, params: P, f: F) -> rusqlite::Result<Option<T>>
where
    P: Params,
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    conn.query_row(sql, params, f).optional()
}

pub(crate) fn db_insert(conn: &Connection, table: &str, fields: &Fields) -> rusqlite::Result<i64> {
    let columns = fields.columns().collect::<Vec<_>>();
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
    );
    conn.execute(&sql, params_from_iter(fields.values()))?;
    Ok(conn.last_insert_rowid())
}

/// Returns the number of rows touched; an empty `fields` touches nothing.
pub(crate) fn db_update(
    conn: &Connection,
    table: &str,
    id: i64,
    fields: &Fields,
) -> rusqlite::Result<usize> {
    if fields.is_empty() {
        return Ok(0);
    }
    let assignments = fields
        .columns()
        .enumerate()
        .map(|(i, c)| format!("{c} = ?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {table} SET {assignments} WHERE id = ?{}",
        fields.len() + 1
    );
    let mut values = fields.values().cloned().collect::<Vec<_>>();
    values.push(Value::Integer(id));
    conn.execute(&sql, params_from_iter(values))
}

pub(crate) fn db_delete(conn: &Connection, table: &str, id: i64) -> rusqlite::Result<usize> {
    conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])
}

pub(crate) fn db_count(
    conn: &Connection,
    table: &str,
    column: &str,
    value: i64,
) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1"),
        params![value],
        |row| row.get(0),
    )
}

/// Generic table access shared by every entity DAO.
pub trait Dao {
    type Entity: Entity;

    fn storage(&self) -> &SqliteStorage;

    fn get_all(&self) -> Result<Vec<Self::Entity>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id",
            Self::Entity::COLUMNS,
            Self::Entity::TABLE
        );
        let rows = self
            .storage()
            .with_conn(|conn| query_all(conn, &sql, [], Self::Entity::from_row))?;
        Ok(rows)
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Self::Entity>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            Self::Entity::COLUMNS,
            Self::Entity::TABLE
        );
        let row = self
            .storage()
            .with_conn(|conn| query_one(conn, &sql, params![id], Self::Entity::from_row))?;
        Ok(row)
    }

    fn exists(&self, id: i64) -> Result<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?1", Self::Entity::TABLE);
        let found = self
            .storage()
            .with_conn(|conn| query_one(conn, &sql, params![id], |row| row.get::<_, i64>(0)))?;
        Ok(found.is_some())
    }

    /// Inserts a row and returns its id.
    fn add(&self, fields: &Fields) -> Result<i64> {
        let id = self
            .storage()
            .with_conn(|conn| db_insert(conn, Self::Entity::TABLE, fields))?;
        Ok(id)
    }

    /// Updates only the submitted columns; `false` when no row matched.
    fn update(&self, id: i64, fields: &Fields) -> Result<bool> {
        let touched = self
            .storage()
            .with_conn(|conn| db_update(conn, Self::Entity::TABLE, id, fields))?;
        Ok(touched > 0)
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let touched = self
            .storage()
            .with_conn(|conn| db_delete(conn, Self::Entity::TABLE, id))?;
        Ok(touched > 0)
    }

    /// Counts rows of `table` whose `column` equals `value`.
    fn count_in(&self, table: &'static str, column: &'static str, value: i64) -> Result<i64> {
        let count = self
            .storage()
            .with_conn(|conn| db_count(conn, table, column, value))?;
        Ok(count)
    }

    fn find_by(&self, column: &'static str, value: &str) -> Result<Option<Self::Entity>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {column} = ?1",
            Self::Entity::COLUMNS,
            Self::Entity::TABLE
        );
        let row = self
            .storage()
            .with_conn(|conn| query_one(conn, &sql, params![value], Self::Entity::from_row))?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Category, CategoryDao};
    use tempfile::TempDir;

    fn dao() -> (TempDir, CategoryDao) {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::new(dir.path().join("dao.db"));
        storage.init().unwrap();
        (dir, CategoryDao::new(storage))
    }

    #[test]
    fn fields_push_overwrites_existing_column() {
        let mut fields = Fields::new().set("name", "a".to_string());
        fields.push("name", "b".to_string());
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("name"), Some(&Value::Text("b".into())));
    }

    #[test]
    fn set_opt_skips_none() {
        let fields = Fields::new()
            .set_opt("name", Some("x".to_string()))
            .set_opt::<String>("description", None);
        assert_eq!(fields.len(), 1);
        assert!(fields.get("description").is_none());
    }

    #[test]
    fn add_then_get_by_id_returns_row() {
        let (_dir, dao) = dao();
        let id = dao
            .add(&Fields::new().set("name", "Soups".to_string()).set("description", "Hot".to_string()))
            .unwrap();

        let row = dao.get_by_id(id).unwrap().unwrap();
        assert_eq!(
            row,
            Category {
                id,
                name: "Soups".into(),
                description: Some("Hot".into()),
            }
        );
        assert!(dao.exists(id).unwrap());
        assert!(dao.get_by_id(id + 100).unwrap().is_none());
    }

    #[test]
    fn update_touches_only_given_columns() {
        let (_dir, dao) = dao();
        let id = dao
            .add(&Fields::new().set("name", "Soups".to_string()).set("description", "Hot".to_string()))
            .unwrap();

        assert!(dao.update(id, &Fields::new().set("name", "Stews".to_string())).unwrap());
        let row = dao.get_by_id(id).unwrap().unwrap();
        assert_eq!(row.name, "Stews");
        assert_eq!(row.description.as_deref(), Some("Hot"));

        assert!(!dao.update(id, &Fields::new()).unwrap());
        assert!(!dao.update(id + 1, &Fields::new().set("name", "x".to_string())).unwrap());
    }

    #[test]
    fn delete_reports_whether_a_row_went_away() {
        let (_dir, dao) = dao();
        let id = dao.add(&Fields::new().set("name", "Soups".to_string())).unwrap();

        assert!(dao.delete(id).unwrap());
        assert!(!dao.delete(id).unwrap());
        assert!(dao.get_all().unwrap().is_empty());
    }

    #[test]
    fn find_by_matches_whole_value_ignoring_case() {
        let (_dir, dao) = dao();
        dao.add(&Fields::new().set("name", "Soups".to_string())).unwrap();

        assert!(dao.find_by("name", "Soups").unwrap().is_some());
        assert!(dao.find_by("name", "SOUPS").unwrap().is_some());
        assert!(dao.find_by("name", "soup").unwrap().is_none());
    }

    #[test]
    fn names_differing_only_in_case_collide() {
        let (_dir, dao) = dao();
        dao.add(&Fields::new().set("name", "Soups".to_string())).unwrap();
        assert!(dao.add(&Fields::new().set("name", "soups".to_string())).is_err());
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" soup "), "%soup%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
