use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    auth::TokenKeys,
    storage::{Dao, Fields, SqliteStorage},
};

mod auth;
mod category;
mod ingredient;
mod recipe;
mod recipe_ingredient;
mod review;
mod role;
mod user;
pub(crate) mod validation;

pub use auth::{AuthService, LoginData, LoginInput, RegisterInput};
pub use category::{CategoryInput, CategoryService};
pub use ingredient::{IngredientInput, IngredientService};
pub use recipe::{RecipeInput, RecipeService, RecipeWithIngredientsInput};
pub use recipe_ingredient::{
    BulkAddResult, LineFailure, RecipeIngredientInput, RecipeIngredientPatch,
    RecipeIngredientService, Removed,
};
pub use review::{ReviewCheck, ReviewInput, ReviewPatch, ReviewService};
pub use role::{RoleInput, RoleService};
pub use user::{NewUser, PasswordChange, UserService, UserUpdate};

/// Response shape shared by every endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
        }
    }

    pub fn with_success(success: bool, data: T, message: impl Into<String>) -> Self {
        Self {
            success,
            data: Some(data),
            message: message.into(),
        }
    }
}

impl Envelope<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::Validation(vec![message.into()])
    }

    pub fn not_found(noun: &str) -> Self {
        ServiceError::NotFound(format!("{noun} not found"))
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(rusqlite::Error::SqliteFailure(code, detail)) =
            err.downcast_ref::<rusqlite::Error>()
        {
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                log::debug!(
                    "constraint violation: {}",
                    detail.as_deref().unwrap_or("no detail")
                );
                return ServiceError::Conflict("Conflicting data".into());
            }
        }
        ServiceError::Internal(err)
    }
}

pub type ServiceResult<T> = Result<Envelope<T>, ServiceError>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCheck {
    pub can_delete: bool,
    pub message: String,
}

impl DeleteCheck {
    pub fn allowed(noun: &str) -> Self {
        Self {
            can_delete: true,
            message: format!("{noun} can be deleted"),
        }
    }

    pub fn blocked(message: impl Into<String>) -> Self {
        Self {
            can_delete: false,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exists {
    pub exists: bool,
}

/// Shared create/read/update/delete flow over one DAO.
///
/// Implementors supply validation, field building and the delete guard;
/// the default methods take care of existence checks, read-back and the
/// envelope messages.
pub trait CrudService {
    type Dao: Dao;
    type Create;
    type Update;

    /// Singular, capitalised name used in messages.
    const NOUN: &'static str;
    const PLURAL: &'static str;

    fn dao(&self) -> &Self::Dao;

    fn validate_create(&self, input: &Self::Create) -> Result<(), ServiceError>;

    fn validate_update(&self, id: i64, input: &Self::Update) -> Result<(), ServiceError>;

    fn create_fields(&self, input: Self::Create) -> Result<Fields, ServiceError>;

    fn update_fields(&self, input: Self::Update) -> Result<Fields, ServiceError>;

    fn check_delete(&self, _id: i64) -> Result<DeleteCheck, ServiceError> {
        Ok(DeleteCheck::allowed(Self::NOUN))
    }

    fn get_all(&self) -> ServiceResult<Vec<<Self::Dao as Dao>::Entity>> {
        let rows = self.dao().get_all()?;
        Ok(Envelope::ok(rows, format!("{} retrieved", Self::PLURAL)))
    }

    fn get_by_id(&self, id: i64) -> ServiceResult<<Self::Dao as Dao>::Entity> {
        let row = self.find(id)?;
        Ok(Envelope::ok(row, format!("{} retrieved", Self::NOUN)))
    }

    fn find(&self, id: i64) -> Result<<Self::Dao as Dao>::Entity, ServiceError> {
        self.dao()
            .get_by_id(id)?
            .ok_or_else(|| ServiceError::not_found(Self::NOUN))
    }

    fn add(&self, input: Self::Create) -> ServiceResult<<Self::Dao as Dao>::Entity> {
        self.validate_create(&input)?;
        let fields = self.create_fields(input)?;
        let id = self.dao().add(&fields)?;
        log::debug!("{} {} created", Self::NOUN, id);
        let row = self.find(id)?;
        Ok(Envelope::ok(row, format!("{} created", Self::NOUN)))
    }

    fn update(&self, id: i64, input: Self::Update) -> ServiceResult<<Self::Dao as Dao>::Entity> {
        if !self.dao().exists(id)? {
            return Err(ServiceError::not_found(Self::NOUN));
        }
        self.validate_update(id, &input)?;
        let fields = self.update_fields(input)?;
        if fields.is_empty() {
            return Err(ServiceError::invalid("No fields to update"));
        }
        self.dao().update(id, &fields)?;
        let row = self.find(id)?;
        Ok(Envelope::ok(row, format!("{} updated", Self::NOUN)))
    }

    fn delete(&self, id: i64) -> ServiceResult<Deleted> {
        if !self.dao().exists(id)? {
            return Err(ServiceError::not_found(Self::NOUN));
        }
        let check = self.check_delete(id)?;
        if !check.can_delete {
            return Err(ServiceError::Conflict(check.message));
        }
        if !self.dao().delete(id)? {
            return Err(ServiceError::not_found(Self::NOUN));
        }
        log::info!("{} {} deleted", Self::NOUN, id);
        Ok(Envelope::ok(Deleted { id }, format!("{} deleted", Self::NOUN)))
    }

    fn can_delete(&self, id: i64) -> ServiceResult<DeleteCheck> {
        if !self.dao().exists(id)? {
            return Err(ServiceError::not_found(Self::NOUN));
        }
        let check = self.check_delete(id)?;
        let message = check.message.clone();
        Ok(Envelope::ok(check, message))
    }
}

/// Every service, built over one storage handle.
#[derive(Clone, Debug)]
pub struct Services {
    pub roles: RoleService,
    pub users: UserService,
    pub categories: CategoryService,
    pub ingredients: IngredientService,
    pub recipes: RecipeService,
    pub recipe_ingredients: RecipeIngredientService,
    pub reviews: ReviewService,
    pub auth: AuthService,
}

impl Services {
    pub fn new(storage: SqliteStorage, keys: TokenKeys) -> Self {
        Self {
            roles: RoleService::new(storage.clone()),
            users: UserService::new(storage.clone()),
            categories: CategoryService::new(storage.clone()),
            ingredients: IngredientService::new(storage.clone()),
            recipes: RecipeService::new(storage.clone()),
            recipe_ingredients: RecipeIngredientService::new(storage.clone()),
            reviews: ReviewService::new(storage.clone()),
            auth: AuthService::new(storage, keys),
        }
    }
}
