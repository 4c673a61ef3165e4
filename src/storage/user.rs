use anyhow::Result;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{
    dao::{like_pattern, query_all, query_one, Dao, Entity},
    SqliteStorage,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role_id: i64,
    pub created_at: String,
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = "id, name, email, password_hash, role_id, created_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role_id: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithRole {
    #[serde(flatten)]
    pub user: User,
    pub role_name: Option<String>,
}

impl UserWithRole {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(UserWithRole {
            user: User::from_row(row)?,
            role_name: row.get(6)?,
        })
    }
}

const WITH_ROLE_SELECT: &str = r#"
    SELECT u.id, u.name, u.email, u.password_hash, u.role_id, u.created_at, r.name
    FROM users u
    LEFT JOIN roles r ON u.role_id = r.id
"#;

#[derive(Clone, Debug)]
pub struct UserDao {
    storage: SqliteStorage,
}

impl UserDao {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    pub fn get_by_email(&self, email: &str) -> Result<Option<UserWithRole>> {
        let sql = format!("{WITH_ROLE_SELECT} WHERE u.email = ?1");
        let row = self.storage.with_conn(|conn| {
            query_one(conn, &sql, params![email.trim()], UserWithRole::from_row)
        })?;
        Ok(row)
    }

    pub fn get_by_id_with_role(&self, id: i64) -> Result<Option<UserWithRole>> {
        let sql = format!("{WITH_ROLE_SELECT} WHERE u.id = ?1");
        let row = self
            .storage
            .with_conn(|conn| query_one(conn, &sql, params![id], UserWithRole::from_row))?;
        Ok(row)
    }

    pub fn get_all_with_roles(&self) -> Result<Vec<UserWithRole>> {
        let sql = format!("{WITH_ROLE_SELECT} ORDER BY u.created_at DESC, u.id DESC");
        let rows = self
            .storage
            .with_conn(|conn| query_all(conn, &sql, [], UserWithRole::from_row))?;
        Ok(rows)
    }

    pub fn get_by_role(&self, role_id: i64) -> Result<Vec<UserWithRole>> {
        let sql = format!("{WITH_ROLE_SELECT} WHERE u.role_id = ?1 ORDER BY u.name");
        let rows = self
            .storage
            .with_conn(|conn| query_all(conn, &sql, params![role_id], UserWithRole::from_row))?;
        Ok(rows)
    }

    pub fn search(&self, term: &str) -> Result<Vec<UserWithRole>> {
        let sql = format!("{WITH_ROLE_SELECT} WHERE u.name LIKE ?1 ESCAPE '\\' OR u.email LIKE ?1 ESCAPE '\\' ORDER BY u.name");
        let pattern = like_pattern(term);
        let rows = self
            .storage
            .with_conn(|conn| query_all(conn, &sql, params![pattern], UserWithRole::from_row))?;
        Ok(rows)
    }

    /// `exclude_id` lets an update keep its own address.
    pub fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> Result<bool> {
        let found = self.storage.with_conn(|conn| {
            query_one(
                conn,
                "SELECT id FROM users WHERE email = ?1 AND (?2 IS NULL OR id != ?2)",
                params![email.trim(), exclude_id],
                |row| row.get::<_, i64>(0),
            )
        })?;
        Ok(found.is_some())
    }

    pub fn password_hash(&self, id: i64) -> Result<Option<String>> {
        let hash = self.storage.with_conn(|conn| {
            query_one(
                conn,
                "SELECT password_hash FROM users WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            )
        })?;
        Ok(hash)
    }

    pub fn set_password_hash(&self, id: i64, hash: &str) -> Result<bool> {
        let touched = self.storage.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                params![hash, id],
            )
        })?;
        Ok(touched > 0)
    }

    pub fn recipe_count(&self, id: i64) -> Result<i64> {
        self.count_in("recipes", "user_id", id)
    }

    pub fn review_count(&self, id: i64) -> Result<i64> {
        self.count_in("reviews", "user_id", id)
    }
}

impl Dao for UserDao {
    type Entity = User;

    fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}
