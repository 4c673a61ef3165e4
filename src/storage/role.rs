use anyhow::Result;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{
    dao::{query_all, Dao, Entity},
    user::User,
    SqliteStorage,
};

pub const ADMIN_ROLE: &str = "admin";
pub const DEFAULT_ROLE_ID: i64 = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

impl Entity for Role {
    const TABLE: &'static str = "roles";
    const COLUMNS: &'static str = "id, name";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Role {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct RoleDao {
    storage: SqliteStorage,
}

impl RoleDao {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<Role>> {
        self.find_by("name", name)
    }

    pub fn get_all_ordered(&self) -> Result<Vec<Role>> {
        let rows = self.storage.with_conn(|conn| {
            query_all(
                conn,
                "SELECT id, name FROM roles ORDER BY name",
                [],
                Role::from_row,
            )
        })?;
        Ok(rows)
    }

    pub fn list_users(&self, role_id: i64) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE role_id = ?1 ORDER BY name",
            User::COLUMNS
        );
        let rows = self
            .storage
            .with_conn(|conn| query_all(conn, &sql, params![role_id], User::from_row))?;
        Ok(rows)
    }

    pub fn user_count(&self, role_id: i64) -> Result<i64> {
        self.count_in("users", "role_id", role_id)
    }
}

impl Dao for RoleDao {
    type Entity = Role;

    fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}
