use anyhow::Result;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{
    dao::{like_pattern, query_all, query_one, Dao, Entity},
    recipe_ingredient::RecipeIngredientLine,
    SqliteStorage,
};

pub const DIFFICULTY_LEVELS: [&str; 3] = ["Easy", "Medium", "Hard"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub prep_minutes: i64,
    pub cook_minutes: i64,
    pub servings: i64,
    pub difficulty_level: String,
    pub created_at: String,
}

impl Entity for Recipe {
    const TABLE: &'static str = "recipes";
    const COLUMNS: &'static str = "id, user_id, category_id, title, description, instructions, \
         prep_minutes, cook_minutes, servings, difficulty_level, created_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Recipe {
            id: row.get(0)?,
            user_id: row.get(1)?,
            category_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            instructions: row.get(5)?,
            prep_minutes: row.get(6)?,
            cook_minutes: row.get(7)?,
            servings: row.get(8)?,
            difficulty_level: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

/// A recipe joined with its author, category and rating aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub user_name: Option<String>,
    pub category_name: Option<String>,
    pub avg_rating: Option<f64>,
    pub review_count: i64,
}

impl RecipeSummary {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RecipeSummary {
            recipe: Recipe::from_row(row)?,
            user_name: row.get(11)?,
            category_name: row.get(12)?,
            avg_rating: row.get(13)?,
            review_count: row.get(14)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetails {
    #[serde(flatten)]
    pub summary: RecipeSummary,
    pub ingredients: Vec<RecipeIngredientLine>,
}

const SUMMARY_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.category_id, r.title, r.description, r.instructions,
           r.prep_minutes, r.cook_minutes, r.servings, r.difficulty_level, r.created_at,
           u.name, c.name,
           ROUND(AVG(rev.rating), 2) AS avg_rating,
           COUNT(rev.id) AS review_count
    FROM recipes r
    LEFT JOIN users u ON r.user_id = u.id
    LEFT JOIN categories c ON r.category_id = c.id
    LEFT JOIN reviews rev ON r.id = rev.recipe_id
"#;

#[derive(Clone, Debug)]
pub struct RecipeDao {
    storage: SqliteStorage,
}

impl RecipeDao {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    fn summaries(&self, tail: &str, params: impl rusqlite::Params) -> Result<Vec<RecipeSummary>> {
        let sql = format!("{SUMMARY_SELECT} {tail}");
        let rows = self
            .storage
            .with_conn(|conn| query_all(conn, &sql, params, RecipeSummary::from_row))?;
        Ok(rows)
    }

    pub fn get_by_id_with_details(&self, id: i64) -> Result<Option<RecipeSummary>> {
        let sql = format!("{SUMMARY_SELECT} WHERE r.id = ?1 GROUP BY r.id");
        let row = self
            .storage
            .with_conn(|conn| query_one(conn, &sql, params![id], RecipeSummary::from_row))?;
        Ok(row)
    }

    pub fn get_all_with_details(&self) -> Result<Vec<RecipeSummary>> {
        self.summaries("GROUP BY r.id ORDER BY r.created_at DESC, r.id DESC", [])
    }

    pub fn get_by_user(&self, user_id: i64) -> Result<Vec<RecipeSummary>> {
        self.summaries(
            "WHERE r.user_id = ?1 GROUP BY r.id ORDER BY r.created_at DESC, r.id DESC",
            params![user_id],
        )
    }

    pub fn get_by_category(&self, category_id: i64) -> Result<Vec<RecipeSummary>> {
        self.summaries(
            "WHERE r.category_id = ?1 GROUP BY r.id ORDER BY r.created_at DESC, r.id DESC",
            params![category_id],
        )
    }

    pub fn search(&self, term: &str) -> Result<Vec<RecipeSummary>> {
        self.summaries(
            "WHERE r.title LIKE ?1 ESCAPE '\\' OR r.description LIKE ?1 ESCAPE '\\' GROUP BY r.id ORDER BY r.title",
            params![like_pattern(term)],
        )
    }

    /// Recipes without any review are left out.
    pub fn top_rated(&self, limit: i64) -> Result<Vec<RecipeSummary>> {
        self.summaries(
            "GROUP BY r.id HAVING avg_rating IS NOT NULL \
             ORDER BY avg_rating DESC, review_count DESC, r.id LIMIT ?1",
            params![limit],
        )
    }

    pub fn recent(&self, limit: i64) -> Result<Vec<RecipeSummary>> {
        self.summaries(
            "GROUP BY r.id ORDER BY r.created_at DESC, r.id DESC LIMIT ?1",
            params![limit],
        )
    }

    pub fn review_count(&self, id: i64) -> Result<i64> {
        self.count_in("reviews", "recipe_id", id)
    }
}

impl Dao for RecipeDao {
    type Entity = Recipe;

    fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}
