use serde::{Deserialize, Serialize};

use crate::storage::{
    Dao, Fields, IngredientDao, RecipeDao, RecipeIngredient, RecipeIngredientDao,
    RecipeIngredientLine, RecipeIngredientUse, SqliteStorage,
};

use super::{
    validation::{trimmed, Checks},
    CrudService, Deleted, Envelope, ServiceError, ServiceResult,
};

const UNIT_MAX: usize = 50;
const NOTES_MAX: usize = 500;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecipeIngredientInput {
    pub recipe_id: Option<i64>,
    pub ingredient_id: Option<i64>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecipeIngredientPatch {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineFailure {
    pub index: usize,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulkAddResult {
    pub added: Vec<RecipeIngredient>,
    pub failed: Vec<LineFailure>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removed {
    pub removed: usize,
}

/// Checks the parts of an ingredient line that do not depend on its recipe.
pub(crate) fn check_line(
    ingredients: &IngredientDao,
    line: &RecipeIngredientInput,
) -> Result<Checks, ServiceError> {
    let mut checks = Checks::new();
    match line.ingredient_id {
        None => checks.fail("Ingredient ID is required"),
        Some(id) => checks.ensure(ingredients.exists(id)?, "Invalid ingredient ID"),
    }
    match line.quantity {
        None => checks.fail("Quantity is required"),
        Some(q) => checks.ensure(q > 0.0, "Quantity must be greater than 0"),
    }
    checks.required_text(line.unit.as_deref(), UNIT_MAX, "Unit");
    checks.optional_text(line.notes.as_deref(), NOTES_MAX, "Notes");
    Ok(checks)
}

pub(crate) fn line_fields(recipe_id: i64, line: RecipeIngredientInput) -> Fields {
    Fields::new()
        .set("recipe_id", recipe_id)
        .set_opt("ingredient_id", line.ingredient_id)
        .set_opt("quantity", line.quantity)
        .set_opt("unit", trimmed(line.unit))
        .set_opt("notes", trimmed(line.notes))
}

#[derive(Clone, Debug)]
pub struct RecipeIngredientService {
    dao: RecipeIngredientDao,
    recipes: RecipeDao,
    ingredients: IngredientDao,
}

impl RecipeIngredientService {
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            dao: RecipeIngredientDao::new(storage.clone()),
            recipes: RecipeDao::new(storage.clone()),
            ingredients: IngredientDao::new(storage),
        }
    }

    fn require_recipe(&self, recipe_id: i64) -> Result<(), ServiceError> {
        if !self.recipes.exists(recipe_id)? {
            return Err(ServiceError::not_found("Recipe"));
        }
        Ok(())
    }

    pub fn get_by_recipe(&self, recipe_id: i64) -> ServiceResult<Vec<RecipeIngredientLine>> {
        self.require_recipe(recipe_id)?;
        Ok(Envelope::ok(
            self.dao.get_by_recipe(recipe_id)?,
            "Recipe ingredients retrieved",
        ))
    }

    pub fn get_by_ingredient(&self, ingredient_id: i64) -> ServiceResult<Vec<RecipeIngredientUse>> {
        if !self.ingredients.exists(ingredient_id)? {
            return Err(ServiceError::not_found("Ingredient"));
        }
        Ok(Envelope::ok(
            self.dao.get_by_ingredient(ingredient_id)?,
            "Ingredient recipes retrieved",
        ))
    }

    /// Adds each line on its own; lines that fail are reported, not fatal.
    pub fn add_many(
        &self,
        recipe_id: i64,
        lines: Vec<RecipeIngredientInput>,
    ) -> ServiceResult<BulkAddResult> {
        self.require_recipe(recipe_id)?;

        let mut result = BulkAddResult {
            added: Vec::new(),
            failed: Vec::new(),
        };
        for (index, mut line) in lines.into_iter().enumerate() {
            line.recipe_id = Some(recipe_id);
            match self.add(line) {
                Ok(envelope) => result.added.extend(envelope.data),
                Err(ServiceError::Internal(err)) => return Err(ServiceError::Internal(err)),
                Err(err) => result.failed.push(LineFailure {
                    index,
                    message: err.to_string(),
                }),
            }
        }

        if result.failed.is_empty() {
            Ok(Envelope::ok(result, "All ingredients added to recipe"))
        } else {
            let message = format!(
                "Some ingredients failed to add: {}",
                result
                    .failed
                    .iter()
                    .map(|f| f.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            );
            Ok(Envelope::with_success(false, result, message))
        }
    }

    fn find_pair(&self, recipe_id: i64, ingredient_id: i64) -> Result<RecipeIngredient, ServiceError> {
        self.dao
            .find_pair(recipe_id, ingredient_id)?
            .ok_or_else(|| ServiceError::NotFound("Ingredient not found in recipe".into()))
    }

    pub fn update_pair(
        &self,
        recipe_id: i64,
        ingredient_id: i64,
        patch: RecipeIngredientPatch,
    ) -> ServiceResult<RecipeIngredient> {
        let line = self.find_pair(recipe_id, ingredient_id)?;
        self.update(line.id, patch)
    }

    pub fn remove_pair(&self, recipe_id: i64, ingredient_id: i64) -> ServiceResult<Deleted> {
        let line = self.find_pair(recipe_id, ingredient_id)?;
        self.delete(line.id)
    }

    pub fn remove_all(&self, recipe_id: i64) -> ServiceResult<Removed> {
        self.require_recipe(recipe_id)?;
        let removed = self.dao.delete_by_recipe(recipe_id)?;
        Ok(Envelope::ok(
            Removed { removed },
            "Recipe ingredients removed",
        ))
    }
}

impl CrudService for RecipeIngredientService {
    type Dao = RecipeIngredientDao;
    type Create = RecipeIngredientInput;
    type Update = RecipeIngredientPatch;

    const NOUN: &'static str = "Recipe ingredient";
    const PLURAL: &'static str = "Recipe ingredients";

    fn dao(&self) -> &RecipeIngredientDao {
        &self.dao
    }

    fn validate_create(&self, input: &RecipeIngredientInput) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        match input.recipe_id {
            None => checks.fail("Recipe ID is required"),
            Some(id) => checks.ensure(self.recipes.exists(id)?, "Invalid recipe ID"),
        }
        checks.merge_prefixed("", check_line(&self.ingredients, input)?);
        if let (Some(recipe_id), Some(ingredient_id)) = (input.recipe_id, input.ingredient_id) {
            checks.ensure(
                self.dao.find_pair(recipe_id, ingredient_id)?.is_none(),
                "This ingredient is already added to the recipe",
            );
        }
        checks.finish()
    }

    fn validate_update(&self, _id: i64, input: &RecipeIngredientPatch) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        if let Some(q) = input.quantity {
            checks.ensure(q > 0.0, "Quantity must be greater than 0");
        }
        checks.non_blank(input.unit.as_deref(), UNIT_MAX, "Unit");
        checks.optional_text(input.notes.as_deref(), NOTES_MAX, "Notes");
        checks.finish()
    }

    fn create_fields(&self, input: RecipeIngredientInput) -> Result<Fields, ServiceError> {
        let recipe_id = input
            .recipe_id
            .ok_or_else(|| ServiceError::invalid("Recipe ID is required"))?;
        Ok(line_fields(recipe_id, input))
    }

    fn update_fields(&self, input: RecipeIngredientPatch) -> Result<Fields, ServiceError> {
        Ok(Fields::new()
            .set_opt("quantity", input.quantity)
            .set_opt("unit", trimmed(input.unit))
            .set_opt("notes", trimmed(input.notes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support;

    struct Fixture {
        _dir: tempfile::TempDir,
        service: RecipeIngredientService,
        recipe_id: i64,
        flour: i64,
        eggs: i64,
    }

    fn fixture() -> Fixture {
        let (dir, storage) = test_support::storage();
        storage
            .with_conn(|conn| {
                conn.execute_batch(
                    "INSERT INTO users (name, email, password_hash, role_id, created_at)
                         VALUES ('Ana', 'ana@example.com', 'x', 2, '2024-01-01 00:00:00');
                     INSERT INTO categories (name) VALUES ('Breakfast');
                     INSERT INTO recipes (user_id, category_id, title, created_at)
                         VALUES (1, 1, 'Pancakes', '2024-01-01 00:00:00');
                     INSERT INTO ingredients (name) VALUES ('Flour'), ('Eggs');",
                )
            })
            .unwrap();
        Fixture {
            _dir: dir,
            service: RecipeIngredientService::new(storage),
            recipe_id: 1,
            flour: 1,
            eggs: 2,
        }
    }

    fn line(ingredient_id: i64, quantity: f64) -> RecipeIngredientInput {
        RecipeIngredientInput {
            recipe_id: None,
            ingredient_id: Some(ingredient_id),
            quantity: Some(quantity),
            unit: Some(" g ".into()),
            notes: None,
        }
    }

    #[test]
    fn same_ingredient_twice_is_rejected() {
        let f = fixture();
        let first = RecipeIngredientInput {
            recipe_id: Some(f.recipe_id),
            ..line(f.flour, 200.0)
        };
        let added = f.service.add(first.clone()).unwrap().data.unwrap();
        assert_eq!(added.unit, "g");

        let err = f.service.add(first).unwrap_err();
        assert_eq!(err.to_string(), "This ingredient is already added to the recipe");
    }

    #[test]
    fn bad_line_reports_every_problem() {
        let f = fixture();
        let err = f
            .service
            .add(RecipeIngredientInput {
                recipe_id: Some(99),
                ingredient_id: Some(99),
                quantity: Some(0.0),
                unit: None,
                notes: None,
            })
            .unwrap_err();
        match err {
            ServiceError::Validation(problems) => assert_eq!(
                problems,
                vec![
                    "Invalid recipe ID",
                    "Invalid ingredient ID",
                    "Quantity must be greater than 0",
                    "Unit is required",
                ]
            ),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn add_many_reports_failed_lines() {
        let f = fixture();
        let envelope = f
            .service
            .add_many(f.recipe_id, vec![line(f.flour, 200.0), line(f.flour, 1.0), line(f.eggs, 2.0)])
            .unwrap();

        assert!(!envelope.success);
        let result = envelope.data.unwrap();
        assert_eq!(result.added.len(), 2);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].index, 1);

        let lines = f.service.get_by_recipe(f.recipe_id).unwrap().data.unwrap();
        assert_eq!(lines[0].ingredient_name, "Flour");
        assert_eq!(lines[1].ingredient_name, "Eggs");
    }

    #[test]
    fn pair_update_and_removal() {
        let f = fixture();
        f.service
            .add_many(f.recipe_id, vec![line(f.flour, 200.0), line(f.eggs, 2.0)])
            .unwrap();

        let updated = f
            .service
            .update_pair(
                f.recipe_id,
                f.eggs,
                RecipeIngredientPatch {
                    quantity: Some(3.0),
                    ..Default::default()
                },
            )
            .unwrap()
            .data
            .unwrap();
        assert_eq!(updated.quantity, 3.0);
        assert_eq!(updated.unit, "g");

        f.service.remove_pair(f.recipe_id, f.eggs).unwrap();
        assert!(matches!(
            f.service.remove_pair(f.recipe_id, f.eggs),
            Err(ServiceError::NotFound(_))
        ));

        let removed = f.service.remove_all(f.recipe_id).unwrap().data.unwrap();
        assert_eq!(removed.removed, 1);
        assert!(f
            .service
            .get_by_ingredient(f.flour)
            .unwrap()
            .data
            .unwrap()
            .is_empty());
    }
}
