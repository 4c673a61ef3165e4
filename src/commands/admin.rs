use super::CommandRunner;
use crate::cli;
use crate::context;
use crate::service::NewUser;
use crate::storage::{Role, RoleDao, ADMIN_ROLE};
use anyhow::{Context, Result};

impl CommandRunner for cli::AdminCmd {
    fn run(&self, ctx: &context::Context) -> Result<()> {
        match self {
            cli::AdminCmd::Create {
                name,
                email,
                password,
            } => {
                let role = admin_role(ctx)?;
                let user = ctx
                    .services()
                    .users
                    .upsert_with_role(NewUser {
                        name: Some(name.clone()),
                        email: Some(email.clone()),
                        password: Some(password.clone()),
                        role_id: Some(role.id),
                    })
                    .context("creating admin user")?;
                log::info!("👤 Admin user {} ready (id={})", user.user.email, user.user.id);
                Ok(())
            }
        }
    }
}

fn admin_role(ctx: &context::Context) -> Result<Role> {
    RoleDao::new(ctx.storage.clone())
        .get_by_name(ADMIN_ROLE)?
        .context("admin role is missing from the database")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Configuration;

    fn ctx(dir: &std::path::Path) -> context::Context {
        context::Context::open(Configuration {
            data_dir: dir.to_path_buf(),
            api_listen: "127.0.0.1:0".parse().unwrap(),
            jwt_secret: "secret".into(),
            token_ttl_secs: 60,
            log_file: None,
            reset: false,
        })
        .unwrap()
    }

    fn create(email: &str, password: &str) -> cli::AdminCmd {
        cli::AdminCmd::Create {
            name: "Root".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn create_then_promote_existing_user() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());

        create("root@example.com", "secret1").run(&ctx).unwrap();
        create("root@example.com", "secret2").run(&ctx).unwrap();

        let user = ctx.services().users.get_by_email("root@example.com").unwrap();
        assert_eq!(user.data.unwrap().role_name.as_deref(), Some("admin"));
    }

    #[test]
    fn short_password_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = create("root@example.com", "123").run(&ctx(dir.path())).unwrap_err();
        assert!(format!("{err:#}").contains("at least 6 characters"));
    }
}
