use anyhow::Result;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{
    dao::{query_all, query_one, Dao, Entity},
    SqliteStorage,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub quantity: f64,
    pub unit: String,
    pub notes: Option<String>,
}

impl Entity for RecipeIngredient {
    const TABLE: &'static str = "recipe_ingredients";
    const COLUMNS: &'static str = "id, recipe_id, ingredient_id, quantity, unit, notes";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RecipeIngredient {
            id: row.get(0)?,
            recipe_id: row.get(1)?,
            ingredient_id: row.get(2)?,
            quantity: row.get(3)?,
            unit: row.get(4)?,
            notes: row.get(5)?,
        })
    }
}

/// A recipe's ingredient line with the ingredient's name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredientLine {
    #[serde(flatten)]
    pub line: RecipeIngredient,
    pub ingredient_name: String,
    pub ingredient_description: Option<String>,
}

/// An ingredient's line seen from the recipe that uses it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredientUse {
    #[serde(flatten)]
    pub line: RecipeIngredient,
    pub recipe_title: String,
    pub recipe_description: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RecipeIngredientDao {
    storage: SqliteStorage,
}

impl RecipeIngredientDao {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    pub fn get_by_recipe(&self, recipe_id: i64) -> Result<Vec<RecipeIngredientLine>> {
        let rows = self.storage.with_conn(|conn| {
            query_all(
                conn,
                "SELECT ri.id, ri.recipe_id, ri.ingredient_id, ri.quantity, ri.unit, ri.notes,
                        i.name, i.description
                 FROM recipe_ingredients ri
                 INNER JOIN ingredients i ON ri.ingredient_id = i.id
                 WHERE ri.recipe_id = ?1
                 ORDER BY ri.id",
                params![recipe_id],
                |row| {
                    Ok(RecipeIngredientLine {
                        line: RecipeIngredient::from_row(row)?,
                        ingredient_name: row.get(6)?,
                        ingredient_description: row.get(7)?,
                    })
                },
            )
        })?;
        Ok(rows)
    }

    pub fn get_by_ingredient(&self, ingredient_id: i64) -> Result<Vec<RecipeIngredientUse>> {
        let rows = self.storage.with_conn(|conn| {
            query_all(
                conn,
                "SELECT ri.id, ri.recipe_id, ri.ingredient_id, ri.quantity, ri.unit, ri.notes,
                        r.title, r.description
                 FROM recipe_ingredients ri
                 INNER JOIN recipes r ON ri.recipe_id = r.id
                 WHERE ri.ingredient_id = ?1
                 ORDER BY r.title",
                params![ingredient_id],
                |row| {
                    Ok(RecipeIngredientUse {
                        line: RecipeIngredient::from_row(row)?,
                        recipe_title: row.get(6)?,
                        recipe_description: row.get(7)?,
                    })
                },
            )
        })?;
        Ok(rows)
    }

    pub fn find_pair(&self, recipe_id: i64, ingredient_id: i64) -> Result<Option<RecipeIngredient>> {
        let sql = format!(
            "SELECT {} FROM recipe_ingredients WHERE recipe_id = ?1 AND ingredient_id = ?2",
            RecipeIngredient::COLUMNS
        );
        let row = self.storage.with_conn(|conn| {
            query_one(
                conn,
                &sql,
                params![recipe_id, ingredient_id],
                RecipeIngredient::from_row,
            )
        })?;
        Ok(row)
    }

    /// Returns how many lines were removed.
    pub fn delete_by_recipe(&self, recipe_id: i64) -> Result<usize> {
        let removed = self.storage.with_conn(|conn| {
            conn.execute(
                "DELETE FROM recipe_ingredients WHERE recipe_id = ?1",
                params![recipe_id],
            )
        })?;
        Ok(removed)
    }
}

impl Dao for RecipeIngredientDao {
    type Entity = RecipeIngredient;

    fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}
