use serde::{Deserialize, Serialize};

use crate::storage::{
    dao::now_timestamp, Dao, Fields, RatingStats, RecentReview, RecipeDao, Review, ReviewDao,
    ReviewWithRecipe, ReviewWithUser, SqliteStorage, UserDao,
};

use super::{
    validation::{trimmed, Checks},
    CrudService, Envelope, ServiceError, ServiceResult,
};

const COMMENT_MAX: usize = 1000;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReviewInput {
    pub user_id: Option<i64>,
    pub recipe_id: Option<i64>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReviewPatch {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCheck {
    pub has_reviewed: bool,
    pub review: Option<Review>,
}

fn check_rating(checks: &mut Checks, rating: Option<i64>) {
    if let Some(rating) = rating {
        checks.ensure((1..=5).contains(&rating), "Rating must be between 1 and 5");
    }
}

#[derive(Clone, Debug)]
pub struct ReviewService {
    dao: ReviewDao,
    users: UserDao,
    recipes: RecipeDao,
}

impl ReviewService {
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            dao: ReviewDao::new(storage.clone()),
            users: UserDao::new(storage.clone()),
            recipes: RecipeDao::new(storage),
        }
    }

    pub fn get_by_recipe(
        &self,
        recipe_id: i64,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<ReviewWithUser>> {
        Ok(Envelope::ok(
            self.dao.get_by_recipe(recipe_id, limit, offset)?,
            "Recipe reviews retrieved",
        ))
    }

    pub fn get_by_user(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<ReviewWithRecipe>> {
        Ok(Envelope::ok(
            self.dao.get_by_user(user_id, limit, offset)?,
            "User reviews retrieved",
        ))
    }

    pub fn rating(&self, recipe_id: i64) -> ServiceResult<RatingStats> {
        if !self.recipes.exists(recipe_id)? {
            return Err(ServiceError::not_found("Recipe"));
        }
        Ok(Envelope::ok(
            self.dao.rating_stats(recipe_id)?,
            "Recipe rating retrieved",
        ))
    }

    pub fn recent(&self, limit: i64) -> ServiceResult<Vec<RecentReview>> {
        Ok(Envelope::ok(self.dao.recent(limit)?, "Recent reviews retrieved"))
    }

    pub fn has_reviewed(&self, user_id: i64, recipe_id: i64) -> ServiceResult<ReviewCheck> {
        let review = self.dao.get_user_review_for_recipe(user_id, recipe_id)?;
        Ok(Envelope::ok(
            ReviewCheck {
                has_reviewed: review.is_some(),
                review,
            },
            "Review status checked",
        ))
    }
}

impl CrudService for ReviewService {
    type Dao = ReviewDao;
    type Create = ReviewInput;
    type Update = ReviewPatch;

    const NOUN: &'static str = "Review";
    const PLURAL: &'static str = "Reviews";

    fn dao(&self) -> &ReviewDao {
        &self.dao
    }

    fn validate_create(&self, input: &ReviewInput) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        match input.user_id {
            None => checks.fail("User ID is required"),
            Some(id) => checks.ensure(self.users.exists(id)?, "Invalid user ID"),
        }
        match input.recipe_id {
            None => checks.fail("Recipe ID is required"),
            Some(id) => checks.ensure(self.recipes.exists(id)?, "Invalid recipe ID"),
        }
        checks.ensure(input.rating.is_some(), "Rating is required");
        check_rating(&mut checks, input.rating);
        checks.optional_text(input.comment.as_deref(), COMMENT_MAX, "Comment");
        if let (Some(user_id), Some(recipe_id)) = (input.user_id, input.recipe_id) {
            checks.ensure(
                self.dao
                    .get_user_review_for_recipe(user_id, recipe_id)?
                    .is_none(),
                "User has already reviewed this recipe",
            );
        }
        checks.finish()
    }

    fn validate_update(&self, _id: i64, input: &ReviewPatch) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        check_rating(&mut checks, input.rating);
        checks.optional_text(input.comment.as_deref(), COMMENT_MAX, "Comment");
        checks.finish()
    }

    fn create_fields(&self, input: ReviewInput) -> Result<Fields, ServiceError> {
        Ok(Fields::new()
            .set_opt("user_id", input.user_id)
            .set_opt("recipe_id", input.recipe_id)
            .set_opt("rating", input.rating)
            .set_opt("comment", trimmed(input.comment))
            .set("created_at", now_timestamp()))
    }

    fn update_fields(&self, input: ReviewPatch) -> Result<Fields, ServiceError> {
        Ok(Fields::new()
            .set_opt("rating", input.rating)
            .set_opt("comment", trimmed(input.comment)))
    }
}
