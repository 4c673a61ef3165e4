use serde::Deserialize;

use crate::storage::{Fields, Role, RoleDao, SqliteStorage, User};

use super::{
    validation::{trimmed, Checks},
    CrudService, DeleteCheck, Envelope, Exists, ServiceError, ServiceResult,
};

const NAME_MAX: usize = 50;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RoleInput {
    pub name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RoleService {
    dao: RoleDao,
}

impl RoleService {
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            dao: RoleDao::new(storage),
        }
    }

    pub fn get_all_ordered(&self) -> ServiceResult<Vec<Role>> {
        Ok(Envelope::ok(self.dao.get_all_ordered()?, "Roles retrieved"))
    }

    pub fn get_by_name(&self, name: &str) -> ServiceResult<Role> {
        let role = self
            .dao
            .get_by_name(name.trim())?
            .ok_or_else(|| ServiceError::not_found("Role"))?;
        Ok(Envelope::ok(role, "Role retrieved"))
    }

    pub fn exists_by_name(&self, name: &str) -> ServiceResult<Exists> {
        let exists = self.dao.get_by_name(name.trim())?.is_some();
        Ok(Envelope::ok(Exists { exists }, "Role existence checked"))
    }

    pub fn list_users(&self, role_id: i64) -> ServiceResult<Vec<User>> {
        self.find(role_id)?;
        Ok(Envelope::ok(self.dao.list_users(role_id)?, "Role users retrieved"))
    }

    fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, ServiceError> {
        Ok(self
            .dao
            .get_by_name(name.trim())?
            .is_some_and(|role| Some(role.id) != exclude_id))
    }
}

impl CrudService for RoleService {
    type Dao = RoleDao;
    type Create = RoleInput;
    type Update = RoleInput;

    const NOUN: &'static str = "Role";
    const PLURAL: &'static str = "Roles";

    fn dao(&self) -> &RoleDao {
        &self.dao
    }

    fn validate_create(&self, input: &RoleInput) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        checks.required_text(input.name.as_deref(), NAME_MAX, "Role name");
        if let Some(name) = input.name.as_deref() {
            checks.ensure(!self.name_taken(name, None)?, "Role name already exists");
        }
        checks.finish()
    }

    fn validate_update(&self, id: i64, input: &RoleInput) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        checks.non_blank(input.name.as_deref(), NAME_MAX, "Role name");
        if let Some(name) = input.name.as_deref() {
            checks.ensure(!self.name_taken(name, Some(id))?, "Role name already exists");
        }
        checks.finish()
    }

    fn create_fields(&self, input: RoleInput) -> Result<Fields, ServiceError> {
        Ok(Fields::new().set_opt("name", trimmed(input.name)))
    }

    fn update_fields(&self, input: RoleInput) -> Result<Fields, ServiceError> {
        self.create_fields(input)
    }

    fn check_delete(&self, id: i64) -> Result<DeleteCheck, ServiceError> {
        if self.dao.user_count(id)? > 0 {
            return Ok(DeleteCheck::blocked("Cannot delete role with assigned users"));
        }
        Ok(DeleteCheck::allowed(Self::NOUN))
    }
}
