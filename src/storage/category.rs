use anyhow::Result;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{
    dao::{like_pattern, query_all, Dao, Entity},
    SqliteStorage,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl Entity for Category {
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static str = "id, name, description";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub recipe_count: i64,
}

impl CategoryWithCount {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(CategoryWithCount {
            category: Category::from_row(row)?,
            recipe_count: row.get(3)?,
        })
    }
}

const WITH_COUNT_SELECT: &str = r#"
    SELECT c.id, c.name, c.description, COUNT(r.id) AS recipe_count
    FROM categories c
    LEFT JOIN recipes r ON c.id = r.category_id
    GROUP BY c.id
"#;

#[derive(Clone, Debug)]
pub struct CategoryDao {
    storage: SqliteStorage,
}

impl CategoryDao {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.find_by("name", name.trim())
    }

    pub fn get_all_ordered(&self) -> Result<Vec<Category>> {
        let rows = self.storage.with_conn(|conn| {
            query_all(
                conn,
                "SELECT id, name, description FROM categories ORDER BY name",
                [],
                Category::from_row,
            )
        })?;
        Ok(rows)
    }

    pub fn get_all_with_recipe_count(&self) -> Result<Vec<CategoryWithCount>> {
        let sql = format!("{WITH_COUNT_SELECT} ORDER BY c.name");
        let rows = self
            .storage
            .with_conn(|conn| query_all(conn, &sql, [], CategoryWithCount::from_row))?;
        Ok(rows)
    }

    /// Categories with the most recipes first.
    pub fn popular(&self, limit: i64) -> Result<Vec<CategoryWithCount>> {
        let sql = format!("{WITH_COUNT_SELECT} ORDER BY recipe_count DESC, c.name LIMIT ?1");
        let rows = self
            .storage
            .with_conn(|conn| query_all(conn, &sql, params![limit], CategoryWithCount::from_row))?;
        Ok(rows)
    }

    pub fn search(&self, term: &str) -> Result<Vec<Category>> {
        let pattern = like_pattern(term);
        let rows = self.storage.with_conn(|conn| {
            query_all(
                conn,
                "SELECT id, name, description FROM categories
                 WHERE name LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\'
                 ORDER BY name",
                params![pattern],
                Category::from_row,
            )
        })?;
        Ok(rows)
    }

    pub fn recipe_count(&self, id: i64) -> Result<i64> {
        self.count_in("recipes", "category_id", id)
    }
}

impl Dao for CategoryDao {
    type Entity = Category;

    fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}
