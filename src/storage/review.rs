use anyhow::Result;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{
    dao::{query_all, query_one, Dao, Entity},
    SqliteStorage,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub user_id: i64,
    pub recipe_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

impl Entity for Review {
    const TABLE: &'static str = "reviews";
    const COLUMNS: &'static str = "id, user_id, recipe_id, rating, comment, created_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Review {
            id: row.get(0)?,
            user_id: row.get(1)?,
            recipe_id: row.get(2)?,
            rating: row.get(3)?,
            comment: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewWithUser {
    #[serde(flatten)]
    pub review: Review,
    pub user_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewWithRecipe {
    #[serde(flatten)]
    pub review: Review,
    pub recipe_title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentReview {
    #[serde(flatten)]
    pub review: Review,
    pub user_name: String,
    pub recipe_title: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingStats {
    pub recipe_id: i64,
    pub avg_rating: Option<f64>,
    pub review_count: i64,
}

const REVIEW_COLUMNS: &str = "r.id, r.user_id, r.recipe_id, r.rating, r.comment, r.created_at";

#[derive(Clone, Debug)]
pub struct ReviewDao {
    storage: SqliteStorage,
}

impl ReviewDao {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    pub fn get_by_recipe(&self, recipe_id: i64, limit: i64, offset: i64) -> Result<Vec<ReviewWithUser>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS}, u.name
             FROM reviews r
             INNER JOIN users u ON r.user_id = u.id
             WHERE r.recipe_id = ?1
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT ?2 OFFSET ?3"
        );
        let rows = self.storage.with_conn(|conn| {
            query_all(conn, &sql, params![recipe_id, limit, offset], |row| {
                Ok(ReviewWithUser {
                    review: Review::from_row(row)?,
                    user_name: row.get(6)?,
                })
            })
        })?;
        Ok(rows)
    }

    pub fn get_by_user(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<ReviewWithRecipe>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS}, rec.title
             FROM reviews r
             INNER JOIN recipes rec ON r.recipe_id = rec.id
             WHERE r.user_id = ?1
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT ?2 OFFSET ?3"
        );
        let rows = self.storage.with_conn(|conn| {
            query_all(conn, &sql, params![user_id, limit, offset], |row| {
                Ok(ReviewWithRecipe {
                    review: Review::from_row(row)?,
                    recipe_title: row.get(6)?,
                })
            })
        })?;
        Ok(rows)
    }

    pub fn get_user_review_for_recipe(&self, user_id: i64, recipe_id: i64) -> Result<Option<Review>> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE user_id = ?1 AND recipe_id = ?2",
            Review::COLUMNS
        );
        let row = self.storage.with_conn(|conn| {
            query_one(conn, &sql, params![user_id, recipe_id], Review::from_row)
        })?;
        Ok(row)
    }

    pub fn rating_stats(&self, recipe_id: i64) -> Result<RatingStats> {
        let stats = self.storage.with_conn(|conn| {
            conn.query_row(
                "SELECT ROUND(AVG(rating), 2), COUNT(*) FROM reviews WHERE recipe_id = ?1",
                params![recipe_id],
                |row| {
                    Ok(RatingStats {
                        recipe_id,
                        avg_rating: row.get(0)?,
                        review_count: row.get(1)?,
                    })
                },
            )
        })?;
        Ok(stats)
    }

    pub fn recent(&self, limit: i64) -> Result<Vec<RecentReview>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS}, u.name, rec.title
             FROM reviews r
             INNER JOIN users u ON r.user_id = u.id
             INNER JOIN recipes rec ON r.recipe_id = rec.id
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT ?1"
        );
        let rows = self.storage.with_conn(|conn| {
            query_all(conn, &sql, params![limit], |row| {
                Ok(RecentReview {
                    review: Review::from_row(row)?,
                    user_name: row.get(6)?,
                    recipe_title: row.get(7)?,
                })
            })
        })?;
        Ok(rows)
    }
}

impl Dao for ReviewDao {
    type Entity = Review;

    fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}
