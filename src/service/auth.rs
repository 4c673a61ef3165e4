use serde::{Deserialize, Serialize};

use crate::{
    auth::{verify_password, TokenKeys},
    storage::{SqliteStorage, User, UserDao, UserWithRole, DEFAULT_ROLE_ID},
};

use super::{
    user::{NewUser, UserService},
    validation::Checks,
    CrudService, Envelope, ServiceError, ServiceResult,
};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoginData {
    pub user: UserWithRole,
    pub token: String,
    pub expires_in: i64,
}

#[derive(Clone, Debug)]
pub struct AuthService {
    users: UserService,
    dao: UserDao,
    keys: TokenKeys,
}

impl AuthService {
    pub fn new(storage: SqliteStorage, keys: TokenKeys) -> Self {
        Self {
            users: UserService::new(storage.clone()),
            dao: UserDao::new(storage),
            keys,
        }
    }

    /// Self sign-up always lands in the default role.
    pub fn register(&self, input: RegisterInput) -> ServiceResult<User> {
        let created = self.users.add(NewUser {
            name: input.name,
            email: input.email,
            password: input.password,
            role_id: Some(DEFAULT_ROLE_ID),
        })?;
        if let Some(user) = created.data.as_ref() {
            log::info!("user {} registered", user.id);
        }
        Ok(Envelope {
            message: "Registration successful".into(),
            ..created
        })
    }

    pub fn login(&self, input: LoginInput) -> ServiceResult<LoginData> {
        let mut checks = Checks::new();
        checks.ensure(
            input.email.as_deref().is_some_and(|e| !e.trim().is_empty()),
            "Email is required",
        );
        checks.ensure(
            input.password.as_deref().is_some_and(|p| !p.is_empty()),
            "Password is required",
        );
        checks.finish()?;

        let email = input.email.as_deref().unwrap_or_default();
        let password = input.password.as_deref().unwrap_or_default();
        let user = match self.dao.get_by_email(email)? {
            Some(user) if verify_password(password, &user.user.password_hash) => user,
            _ => {
                log::debug!("failed login for {}", email.trim());
                return Err(ServiceError::Unauthorized(
                    "Invalid email or password".into(),
                ));
            }
        };

        let role = user.role_name.clone().unwrap_or_default();
        let token = self.keys.issue(user.user.id, &user.user.email, &role)?;
        Ok(Envelope::ok(
            LoginData {
                user,
                token,
                expires_in: self.keys.ttl_secs(),
            },
            "Login successful",
        ))
    }
}
