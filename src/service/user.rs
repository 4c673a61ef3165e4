use serde::Deserialize;

use crate::{
    auth::{hash_password, verify_password},
    storage::{
        dao::now_timestamp, Dao, Fields, RoleDao, SqliteStorage, User, UserDao, UserWithRole,
        DEFAULT_ROLE_ID,
    },
};

use super::{
    validation::{trimmed, Checks},
    CrudService, DeleteCheck, Envelope, Exists, ServiceError, ServiceResult,
};

const NAME_MAX: usize = 100;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role_id: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PasswordChange {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UserService {
    dao: UserDao,
    roles: RoleDao,
}

impl UserService {
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            dao: UserDao::new(storage.clone()),
            roles: RoleDao::new(storage),
        }
    }

    pub fn get_with_role(&self, id: i64) -> ServiceResult<UserWithRole> {
        let user = self
            .dao
            .get_by_id_with_role(id)?
            .ok_or_else(|| ServiceError::not_found(Self::NOUN))?;
        Ok(Envelope::ok(user, "User retrieved"))
    }

    pub fn get_all_with_roles(&self) -> ServiceResult<Vec<UserWithRole>> {
        Ok(Envelope::ok(self.dao.get_all_with_roles()?, "Users retrieved"))
    }

    pub fn get_by_email(&self, email: &str) -> ServiceResult<UserWithRole> {
        let user = self
            .dao
            .get_by_email(email)?
            .ok_or_else(|| ServiceError::not_found(Self::NOUN))?;
        Ok(Envelope::ok(user, "User retrieved"))
    }

    pub fn email_exists(&self, email: &str) -> ServiceResult<Exists> {
        let exists = self.dao.email_exists(email, None)?;
        Ok(Envelope::ok(Exists { exists }, "Email checked"))
    }

    pub fn get_by_role(&self, role_id: i64) -> ServiceResult<Vec<UserWithRole>> {
        Ok(Envelope::ok(self.dao.get_by_role(role_id)?, "Users retrieved"))
    }

    pub fn search(&self, term: &str) -> ServiceResult<Vec<UserWithRole>> {
        Ok(Envelope::ok(self.dao.search(term)?, "Search results"))
    }

    /// With `verify_current` the caller must also prove the old password.
    pub fn change_password(
        &self,
        id: i64,
        change: PasswordChange,
        verify_current: bool,
    ) -> ServiceResult<User> {
        let hash = self
            .dao
            .password_hash(id)?
            .ok_or_else(|| ServiceError::not_found(Self::NOUN))?;

        let mut checks = Checks::new();
        if verify_current {
            checks.password(change.current_password.as_deref(), "Current password");
        }
        checks.password(change.new_password.as_deref(), "New password");
        checks.finish()?;

        if verify_current {
            let current = change.current_password.as_deref().unwrap_or_default();
            if !verify_password(current, &hash) {
                return Err(ServiceError::invalid("Current password is incorrect"));
            }
        }

        let new_password = change.new_password.unwrap_or_default();
        self.dao.set_password_hash(id, &hash_password(&new_password)?)?;
        log::info!("password changed for user {}", id);
        Ok(Envelope::ok(self.find(id)?, "Password changed"))
    }

    /// Creates the user, or moves an existing one with the same email to
    /// `role_id` and resets their password.
    pub fn upsert_with_role(&self, input: NewUser) -> Result<UserWithRole, ServiceError> {
        let email = input.email.as_deref().map(str::trim).unwrap_or_default();
        let existing = self.dao.get_by_email(email)?;
        let id = match existing {
            Some(found) => {
                let mut checks = Checks::new();
                checks.password(input.password.as_deref(), "Password");
                checks.finish()?;
                let fields = Fields::new()
                    .set_opt("role_id", input.role_id)
                    .set_opt("name", trimmed(input.name));
                self.dao.update(found.user.id, &fields)?;
                let hash = hash_password(input.password.as_deref().unwrap_or_default())?;
                self.dao.set_password_hash(found.user.id, &hash)?;
                found.user.id
            }
            None => {
                self.validate_create(&input)?;
                self.dao.add(&self.create_fields(input)?)?
            }
        };
        self.dao
            .get_by_id_with_role(id)?
            .ok_or_else(|| ServiceError::not_found(Self::NOUN))
    }

    fn check_role(&self, checks: &mut Checks, role_id: Option<i64>) -> Result<(), ServiceError> {
        if let Some(role_id) = role_id {
            checks.ensure(self.roles.exists(role_id)?, "Invalid role ID");
        }
        Ok(())
    }
}

impl CrudService for UserService {
    type Dao = UserDao;
    type Create = NewUser;
    type Update = UserUpdate;

    const NOUN: &'static str = "User";
    const PLURAL: &'static str = "Users";

    fn dao(&self) -> &UserDao {
        &self.dao
    }

    fn validate_create(&self, input: &NewUser) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        checks.required_text(input.name.as_deref(), NAME_MAX, "Name");
        checks.email(input.email.as_deref(), true);
        checks.password(input.password.as_deref(), "Password");
        self.check_role(&mut checks, input.role_id)?;
        if let Some(email) = input.email.as_deref() {
            checks.ensure(!self.dao.email_exists(email, None)?, "Email already exists");
        }
        checks.finish()
    }

    fn validate_update(&self, id: i64, input: &UserUpdate) -> Result<(), ServiceError> {
        let mut checks = Checks::new();
        checks.non_blank(input.name.as_deref(), NAME_MAX, "Name");
        checks.email(input.email.as_deref(), false);
        self.check_role(&mut checks, input.role_id)?;
        if let Some(email) = input.email.as_deref() {
            checks.ensure(
                !self.dao.email_exists(email, Some(id))?,
                "Email already exists",
            );
        }
        checks.finish()
    }

    fn create_fields(&self, input: NewUser) -> Result<Fields, ServiceError> {
        let password_hash = hash_password(input.password.as_deref().unwrap_or_default())?;
        Ok(Fields::new()
            .set_opt("name", trimmed(input.name))
            .set_opt("email", trimmed(input.email))
            .set("password_hash", password_hash)
            .set("role_id", input.role_id.unwrap_or(DEFAULT_ROLE_ID))
            .set("created_at", now_timestamp()))
    }

    fn update_fields(&self, input: UserUpdate) -> Result<Fields, ServiceError> {
        Ok(Fields::new()
            .set_opt("name", trimmed(input.name))
            .set_opt("email", trimmed(input.email))
            .set_opt("role_id", input.role_id))
    }

    fn check_delete(&self, id: i64) -> Result<DeleteCheck, ServiceError> {
        if self.dao.recipe_count(id)? > 0 || self.dao.review_count(id)? > 0 {
            return Ok(DeleteCheck::blocked(
                "Cannot delete user with existing recipes or reviews",
            ));
        }
        Ok(DeleteCheck::allowed(Self::NOUN))
    }
}
