use serde::Deserialize;

use crate::storage::{Category, CategoryDao, CategoryWithCount, Fields, SqliteStorage};

use super::{
    validation::{trimmed, Checks},
    CrudService, DeleteCheck, Envelope, ServiceError, ServiceResult,
};

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CategoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CategoryService {
    dao: CategoryDao,
}

impl CategoryService {
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            dao: CategoryDao::new(storage),
        }
    }

    pub fn get_all_with_recipe_count(&self) -> ServiceResult<Vec<CategoryWithCount>> {
        Ok(Envelope::ok(
            self.dao.get_all_with_recipe_count()?,
            "Categories retrieved",
        ))
    }

    pub fn get_all_ordered(&self) -> ServiceResult<Vec<Category>> {
        Ok(Envelope::ok(self.dao.get_all_ordered()?, "Categories retrieved"))
    }

    pub fn popular(&self, limit: i64) -> ServiceResult<Vec<CategoryWithCount>> {
        Ok(Envelope::ok(self.dao.popular(limit)?, "Popular categories retrieved"))
    }

    pub fn search(&self, term: &str) -> ServiceResult<Vec<Category>> {
        Ok(Envelope::ok(self.dao.search(term)?, "Search results"))
    }

    pub fn get_by_name(&self, name: &str) -> ServiceResult<Category> {
        let category = self
            .dao
            .get_by_name(name)?
            .ok_or_else(|| ServiceError::not_found(Self::NOUN))?;
        Ok(Envelope::ok(category, "Category retrieved"))
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
                .is_some_and(|c| Some(c.id) != exclude_id);
            checks.ensure(!taken, "Category name already exists");
        }
        Ok(())
    }
}

impl CrudService for CategoryService {
    type Dao = CategoryDao;
    type Create = CategoryInput;
    type Update = CategoryInput;

    const NOUN: &'static str = "Category";
    const PLURAL: &'static str = "Categories";

    fn dao(&self) -> &CategoryDao {
        &self.dao
    }

    fn validate_create(&self, input: &CategoryInput) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        checks.required_text(input.name.as_deref(), NAME_MAX, "Category name");
        checks.optional_text(input.description.as_deref(), DESCRIPTION_MAX, "Description");
        self.check_name(&mut checks, input.name.as_deref(), None)?;
        checks.finish()
    }

    fn validate_update(&self, id: i64, input: &CategoryInput) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        checks.non_blank(input.name.as_deref(), NAME_MAX, "Category name");
        checks.optional_text(input.description.as_deref(), DESCRIPTION_MAX, "Description");
        self.check_name(&mut checks, input.name.as_deref(), Some(id))?;
        checks.finish()
    }

    fn create_fields(&self, input: CategoryInput) -> Result<Fields, ServiceError> {
        Ok(Fields::new()
            .set_opt("name", trimmed(input.name))
            .set_opt("description", trimmed(input.description)))
    }

    fn update_fields(&self, input: CategoryInput) -> Result<Fields, ServiceError> {
        self.create_fields(input)
    }

    fn check_delete(&self, id: i64) -> Result<DeleteCheck, ServiceError> {
        let recipes = self.dao.recipe_count(id)?;
        if recipes > 0 {
            return Ok(DeleteCheck::blocked(format!(
                "Cannot delete category with {recipes} existing recipe(s)"
            )));
        }
        Ok(DeleteCheck::allowed(Self::NOUN))
    }
}
