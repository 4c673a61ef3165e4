use anyhow::Result;
use rusqlite::{Connection, Transaction};
use std::path::Path;

pub(crate) const DB_SCHEMA_VERSION: i64 = 1;

#[derive(Clone, Debug)]
pub struct SqliteStorage {
    pub path: String,
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    pub fn reset_all(&self) -> Result<()> {
        if !std::path::Path::new(&self.path).exists() {
            return Ok(());
        }
        std::fs::remove_file(&self.path)?;
        for suffix in ["-wal", "-shm"] {
            let sidecar = format!("{}{}", self.path, suffix);
            if std::path::Path::new(&sidecar).exists() {
                std::fs::remove_file(&sidecar)?;
            }
        }
        Ok(())
    }

    pub fn init(&self) -> Result<()> {
        self.with_conn(|_conn| Ok(()))?;
        Ok(())
    }

    /// Open a connection, ensure schema, and run the supplied closure.
    pub fn with_conn<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.open()?;
        f(&conn)
    }

    /// Like `with_conn`, but the closure runs inside one transaction that is
    /// committed only when it returns `Ok`.
    pub fn with_tx<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
    {
        let mut conn = self.open()?;
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_millis(500))?;

        Self::migrate(&conn)?;
        Ok(conn)
    }

    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        log::info!(
            "SQLite schema migration: {} -> {}",
            version,
            DB_SCHEMA_VERSION
        );

        if version == 0 {
            conn.execute_batch(
                r#"
            CREATE TABLE roles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE
            );

            INSERT INTO roles (id, name) VALUES (1, 'admin'), (2, 'user');

            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password_hash TEXT NOT NULL,
                role_id INTEGER NOT NULL REFERENCES roles(id),
                created_at TEXT NOT NULL
            );
            CREATE INDEX users_role_idx ON users(role_id);

            CREATE TABLE categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                description TEXT
            );

            CREATE TABLE ingredients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                description TEXT
            );

            CREATE TABLE recipes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                category_id INTEGER NOT NULL REFERENCES categories(id),
                title TEXT NOT NULL,
                description TEXT,
                instructions TEXT,
                prep_minutes INTEGER NOT NULL DEFAULT 0 CHECK (prep_minutes >= 0),
                cook_minutes INTEGER NOT NULL DEFAULT 0 CHECK (cook_minutes >= 0),
                servings INTEGER NOT NULL DEFAULT 1 CHECK (servings >= 1),
                difficulty_level TEXT NOT NULL DEFAULT 'Easy'
                    CHECK (difficulty_level IN ('Easy', 'Medium', 'Hard')),
                created_at TEXT NOT NULL
            );
            CREATE INDEX recipes_user_idx ON recipes(user_id);
            CREATE INDEX recipes_category_idx ON recipes(category_id);

            CREATE TABLE recipe_ingredients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                ingredient_id INTEGER NOT NULL REFERENCES ingredients(id),
                quantity REAL NOT NULL CHECK (quantity > 0),
                unit TEXT NOT NULL,
                notes TEXT,
                UNIQUE (recipe_id, ingredient_id)
            );
            CREATE INDEX recipe_ingredients_ingredient_idx ON recipe_ingredients(ingredient_id);

            CREATE TABLE reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                recipe_id INTEGER NOT NULL REFERENCES recipes(id),
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                comment TEXT,
                created_at TEXT NOT NULL,
                UNIQUE (user_id, recipe_id)
            );
            CREATE INDEX reviews_recipe_idx ON reviews(recipe_id);
            "#,
            )?;
            conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
            return Ok(());
        }

        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
            Some("database schema version mismatch; please run with --reset option".to_string()),
        ))
    }
}
