use anyhow::Result;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{
    dao::{like_pattern, query_all, Dao, Entity},
    SqliteStorage,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl Entity for Ingredient {
    const TABLE: &'static str = "ingredients";
    const COLUMNS: &'static str = "id, name, description";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Ingredient {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientWithUsage {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub usage_count: i64,
}

impl IngredientWithUsage {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(IngredientWithUsage {
            ingredient: Ingredient::from_row(row)?,
            usage_count: row.get(3)?,
        })
    }
}

/// A recipe that lists a given ingredient, with the line's amount.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IngredientUse {
    pub recipe_id: i64,
    pub title: String,
    pub quantity: f64,
    pub unit: String,
    pub notes: Option<String>,
}

#[derive(Clone, Debug)]
pub struct IngredientDao {
    storage: SqliteStorage,
}

impl IngredientDao {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<Ingredient>> {
        self.find_by("name", name.trim())
    }

    pub fn get_all_with_usage_count(&self) -> Result<Vec<IngredientWithUsage>> {
        let rows = self.storage.with_conn(|conn| {
            query_all(
                conn,
                "SELECT i.id, i.name, i.description, COUNT(ri.recipe_id) AS usage_count
                 FROM ingredients i
                 LEFT JOIN recipe_ingredients ri ON i.id = ri.ingredient_id
                 GROUP BY i.id
                 ORDER BY i.name",
                [],
                IngredientWithUsage::from_row,
            )
        })?;
        Ok(rows)
    }

    /// Only ingredients used at least once, most used first.
    pub fn most_used(&self, limit: i64) -> Result<Vec<IngredientWithUsage>> {
        let rows = self.storage.with_conn(|conn| {
            query_all(
                conn,
                "SELECT i.id, i.name, i.description, COUNT(ri.recipe_id) AS usage_count
                 FROM ingredients i
                 INNER JOIN recipe_ingredients ri ON i.id = ri.ingredient_id
                 GROUP BY i.id
                 ORDER BY usage_count DESC, i.name
                 LIMIT ?1",
                params![limit],
                IngredientWithUsage::from_row,
            )
        })?;
        Ok(rows)
    }

    pub fn search(&self, term: &str) -> Result<Vec<Ingredient>> {
        let pattern = like_pattern(term);
        let rows = self.storage.with_conn(|conn| {
            query_all(
                conn,
                "SELECT id, name, description FROM ingredients
                 WHERE name LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\'
                 ORDER BY name",
                params![pattern],
                Ingredient::from_row,
            )
        })?;
        Ok(rows)
    }

    pub fn recipes_using(&self, id: i64) -> Result<Vec<IngredientUse>> {
        let rows = self.storage.with_conn(|conn| {
            query_all(
                conn,
                "SELECT r.id, r.title, ri.quantity, ri.unit, ri.notes
                 FROM recipes r
                 INNER JOIN recipe_ingredients ri ON r.id = ri.recipe_id
                 WHERE ri.ingredient_id = ?1
                 ORDER BY r.title",
                params![id],
                |row| {
                    Ok(IngredientUse {
                        recipe_id: row.get(0)?,
                        title: row.get(1)?,
                        quantity: row.get(2)?,
                        unit: row.get(3)?,
                        notes: row.get(4)?,
                    })
                },
            )
        })?;
        Ok(rows)
    }

    pub fn usage_count(&self, id: i64) -> Result<i64> {
        self.count_in("recipe_ingredients", "ingredient_id", id)
    }
}

impl Dao for IngredientDao {
    type Entity = Ingredient;

    fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}
