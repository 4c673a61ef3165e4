use serde::Deserialize;

use crate::storage::{
    Fields, Ingredient, IngredientDao, IngredientUse, IngredientWithUsage, SqliteStorage,
};

use super::{
    validation::{trimmed, Checks},
    CrudService, DeleteCheck, Envelope, ServiceError, ServiceResult,
};

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct IngredientInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug)]
pub struct IngredientService {
    dao: IngredientDao,
}

impl IngredientService {
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            dao: IngredientDao::new(storage),
        }
    }

    pub fn get_all_with_usage_count(&self) -> ServiceResult<Vec<IngredientWithUsage>> {
        Ok(Envelope::ok(
            self.dao.get_all_with_usage_count()?,
            "Ingredients retrieved",
        ))
    }

    pub fn most_used(&self, limit: i64) -> ServiceResult<Vec<IngredientWithUsage>> {
        Ok(Envelope::ok(
            self.dao.most_used(limit)?,
            "Most used ingredients retrieved",
        ))
    }

    pub fn search(&self, term: &str) -> ServiceResult<Vec<Ingredient>> {
        Ok(Envelope::ok(self.dao.search(term)?, "Search results"))
    }

    pub fn get_by_name(&self, name: &str) -> ServiceResult<Ingredient> {
        let ingredient = self
            .dao
            .get_by_name(name)?
            .ok_or_else(|| ServiceError::not_found(Self::NOUN))?;
        Ok(Envelope::ok(ingredient, "Ingredient retrieved"))
    }

    pub fn recipes_using(&self, id: i64) -> ServiceResult<Vec<IngredientUse>> {
        self.find(id)?;
        Ok(Envelope::ok(
            self.dao.recipes_using(id)?,
            "Recipes using ingredient retrieved",
        ))
    }

    fn check_name(
        &self,
        checks: &mut Checks,
        name: Option<&str>,
        exclude_id: Option<i64>,
    ) -> Result<(), ServiceError> {
        if let Some(name) = name {
            let taken = self
                .dao
                .get_by_name(name)?
                .is_some_and(|i| Some(i.id) != exclude_id);
            checks.ensure(!taken, "Ingredient name already exists");
        }
        Ok(())
    }
}

impl CrudService for IngredientService {
    type Dao = IngredientDao;
    type Create = IngredientInput;
    type Update = IngredientInput;

    const NOUN: &'static str = "Ingredient";
    const PLURAL: &'static str = "Ingredients";

    fn dao(&self) -> &IngredientDao {
        &self.dao
    }

    fn validate_create(&self, input: &IngredientInput) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        checks.required_text(input.name.as_deref(), NAME_MAX, "Ingredient name");
        checks.optional_text(input.description.as_deref(), DESCRIPTION_MAX, "Description");
        self.check_name(&mut checks, input.name.as_deref(), None)?;
        checks.finish()
    }

    fn validate_update(&self, id: i64, input: &IngredientInput) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        checks.non_blank(input.name.as_deref(), NAME_MAX, "Ingredient name");
        checks.optional_text(input.description.as_deref(), DESCRIPTION_MAX, "Description");
        self.check_name(&mut checks, input.name.as_deref(), Some(id))?;
        checks.finish()
    }

    fn create_fields(&self, input: IngredientInput) -> Result<Fields, ServiceError> {
        Ok(Fields::new()
            .set_opt("name", trimmed(input.name))
            .set_opt("description", trimmed(input.description)))
    }

    fn update_fields(&self, input: IngredientInput) -> Result<Fields, ServiceError> {
        self.create_fields(input)
    }

    fn check_delete(&self, id: i64) -> Result<DeleteCheck, ServiceError> {
        let uses = self.dao.usage_count(id)?;
        if uses > 0 {
            return Ok(DeleteCheck::blocked(format!(
                "Cannot delete ingredient used in {uses} recipe(s)"
            )));
        }
        Ok(DeleteCheck::allowed(Self::NOUN))
    }
}
