use std::collections::HashSet;

use serde::Deserialize;

use crate::storage::{
    dao::{db_insert, now_timestamp},
    CategoryDao, Dao, Fields, IngredientDao, RecipeDao, RecipeDetails, RecipeIngredientDao,
    RecipeSummary, SqliteStorage, UserDao, DIFFICULTY_LEVELS,
};

use super::{
    recipe_ingredient::{check_line, line_fields, RecipeIngredientInput},
    validation::{trimmed, Checks},
    CrudService, DeleteCheck, Envelope, ServiceError, ServiceResult,
};

const TITLE_MAX: usize = 200;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecipeInput {
    pub user_id: Option<i64>,
    pub category_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub prep_minutes: Option<i64>,
    pub cook_minutes: Option<i64>,
    pub servings: Option<i64>,
    pub difficulty_level: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecipeWithIngredientsInput {
    #[serde(flatten)]
    pub recipe: RecipeInput,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredientInput>,
}

#[derive(Clone, Debug)]
pub struct RecipeService {
    storage: SqliteStorage,
    dao: RecipeDao,
    users: UserDao,
    categories: CategoryDao,
    ingredients: IngredientDao,
    lines: RecipeIngredientDao,
}

impl RecipeService {
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            dao: RecipeDao::new(storage.clone()),
            users: UserDao::new(storage.clone()),
            categories: CategoryDao::new(storage.clone()),
            ingredients: IngredientDao::new(storage.clone()),
            lines: RecipeIngredientDao::new(storage.clone()),
            storage,
        }
    }

    /// The id of the user who owns `recipe_id`.
    pub fn owner_id(&self, recipe_id: i64) -> Result<i64, ServiceError> {
        Ok(self.find(recipe_id)?.user_id)
    }

    pub fn get_with_details(&self, id: i64) -> ServiceResult<RecipeDetails> {
        let summary = self
            .dao
            .get_by_id_with_details(id)?
            .ok_or_else(|| ServiceError::not_found(Self::NOUN))?;
        let ingredients = self.lines.get_by_recipe(id)?;
        Ok(Envelope::ok(
            RecipeDetails {
                summary,
                ingredients,
            },
            "Recipe retrieved",
        ))
    }

    pub fn get_all_with_details(&self) -> ServiceResult<Vec<RecipeSummary>> {
        Ok(Envelope::ok(self.dao.get_all_with_details()?, "Recipes retrieved"))
    }

    pub fn get_by_user(&self, user_id: i64) -> ServiceResult<Vec<RecipeSummary>> {
        Ok(Envelope::ok(self.dao.get_by_user(user_id)?, "User recipes retrieved"))
    }

    pub fn get_by_category(&self, category_id: i64) -> ServiceResult<Vec<RecipeSummary>> {
        Ok(Envelope::ok(
            self.dao.get_by_category(category_id)?,
            "Category recipes retrieved",
        ))
    }

    pub fn search(&self, term: &str) -> ServiceResult<Vec<RecipeSummary>> {
        Ok(Envelope::ok(self.dao.search(term)?, "Search results"))
    }

    pub fn top_rated(&self, limit: i64) -> ServiceResult<Vec<RecipeSummary>> {
        Ok(Envelope::ok(self.dao.top_rated(limit)?, "Top rated recipes retrieved"))
    }

    pub fn recent(&self, limit: i64) -> ServiceResult<Vec<RecipeSummary>> {
        Ok(Envelope::ok(self.dao.recent(limit)?, "Recent recipes retrieved"))
    }

    /// Inserts the recipe and all of its lines in one transaction; any
    /// invalid line rejects the whole request.
    pub fn create_with_ingredients(
        &self,
        input: RecipeWithIngredientsInput,
    ) -> ServiceResult<RecipeDetails> {
        let mut checks = Checks::new();
        match self.validate_create(&input.recipe) {
            Ok(()) => {}
            Err(ServiceError::Validation(problems)) => {
                problems.into_iter().for_each(|p| checks.fail(p))
            }
            Err(err) => return Err(err),
        }
        let mut seen = HashSet::new();
        for (index, line) in input.ingredients.iter().enumerate() {
            let mut line_checks = check_line(&self.ingredients, line)?;
            if let Some(ingredient_id) = line.ingredient_id {
                line_checks.ensure(
                    seen.insert(ingredient_id),
                    "This ingredient is already added to the recipe",
                );
            }
            checks.merge_prefixed(&format!("Ingredient {}: ", index + 1), line_checks);
        }
        checks.finish()?;

        let recipe_fields = self.create_fields(input.recipe)?;
        let id = self
            .storage
            .with_tx(|tx| {
                let id = db_insert(tx, "recipes", &recipe_fields)?;
                for line in input.ingredients {
                    db_insert(tx, "recipe_ingredients", &line_fields(id, line))?;
                }
                Ok(id)
            })
            .map_err(anyhow::Error::from)?;
        log::info!("recipe {} created with ingredients", id);

        let mut envelope = self.get_with_details(id)?;
        envelope.message = "Recipe created".into();
        Ok(envelope)
    }

    fn check_numbers(&self, checks: &mut Checks, input: &RecipeInput) {
        if let Some(prep) = input.prep_minutes {
            checks.ensure(prep >= 0, "Prep minutes must be a positive number");
        }
        if let Some(cook) = input.cook_minutes {
            checks.ensure(cook >= 0, "Cook minutes must be a positive number");
        }
        if let Some(servings) = input.servings {
            checks.ensure(servings >= 1, "Servings must be at least 1");
        }
        if let Some(level) = input.difficulty_level.as_deref() {
            checks.ensure(
                DIFFICULTY_LEVELS.contains(&level.trim()),
                "Difficulty level must be Easy, Medium, or Hard",
            );
        }
    }

    fn check_refs(&self, checks: &mut Checks, input: &RecipeInput) -> Result<(), ServiceError> {
        if let Some(user_id) = input.user_id {
            checks.ensure(self.users.exists(user_id)?, "Valid user ID is required");
        }
        if let Some(category_id) = input.category_id {
            checks.ensure(
                self.categories.exists(category_id)?,
                "Valid category ID is required",
            );
        }
        Ok(())
    }
}

impl CrudService for RecipeService {
    type Dao = RecipeDao;
    type Create = RecipeInput;
    type Update = RecipeInput;

    const NOUN: &'static str = "Recipe";
    const PLURAL: &'static str = "Recipes";

    fn dao(&self) -> &RecipeDao {
        &self.dao
    }

    fn validate_create(&self, input: &RecipeInput) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        checks.required_text(input.title.as_deref(), TITLE_MAX, "Recipe title");
        checks.ensure(input.user_id.is_some(), "Valid user ID is required");
        checks.ensure(input.category_id.is_some(), "Valid category ID is required");
        self.check_refs(&mut checks, input)?;
        self.check_numbers(&mut checks, input);
        checks.finish()
    }

    fn validate_update(&self, _id: i64, input: &RecipeInput) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        checks.non_blank(input.title.as_deref(), TITLE_MAX, "Recipe title");
        self.check_refs(&mut checks, input)?;
        self.check_numbers(&mut checks, input);
        checks.finish()
    }

    fn create_fields(&self, input: RecipeInput) -> Result<Fields, ServiceError> {
        Ok(Fields::new()
            .set_opt("user_id", input.user_id)
            .set_opt("category_id", input.category_id)
            .set_opt("title", trimmed(input.title))
            .set_opt("description", trimmed(input.description))
            .set_opt("instructions", trimmed(input.instructions))
            .set("prep_minutes", input.prep_minutes.unwrap_or(0))
            .set("cook_minutes", input.cook_minutes.unwrap_or(0))
            .set("servings", input.servings.unwrap_or(1))
            .set(
                "difficulty_level",
                trimmed(input.difficulty_level).unwrap_or_else(|| "Easy".to_string()),
            )
            .set("created_at", now_timestamp()))
    }

    fn update_fields(&self, input: RecipeInput) -> Result<Fields, ServiceError> {
        Ok(Fields::new()
            .set_opt("user_id", input.user_id)
            .set_opt("category_id", input.category_id)
            .set_opt("title", trimmed(input.title))
            .set_opt("description", trimmed(input.description))
            .set_opt("instructions", trimmed(input.instructions))
            .set_opt("prep_minutes", input.prep_minutes)
            .set_opt("cook_minutes", input.cook_minutes)
            .set_opt("servings", input.servings)
            .set_opt("difficulty_level", trimmed(input.difficulty_level)))
    }

    fn check_delete(&self, id: i64) -> Result<DeleteCheck, ServiceError> {
        if self.dao.review_count(id)? > 0 {
            return Ok(DeleteCheck::blocked(
                "Cannot delete recipe with existing reviews",
            ));
        }
        Ok(DeleteCheck::allowed(Self::NOUN))
    }
}
