use anyhow::{Context as AnyhowContext, Result};

use crate::{auth::TokenKeys, configuration::Configuration, service::Services, storage::SqliteStorage};

/// Everything a command or the server needs once start-up side effects are done.
pub struct Context {
    pub config: Configuration,
    pub storage: SqliteStorage,
    pub keys: TokenKeys,
}

impl Context {
    /// Creates the data dir and opens (or resets) the database.
    pub fn open(config: Configuration) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("creating data dir {}", config.data_dir.to_string_lossy())
        })?;

        let storage = SqliteStorage::new(config.db_path());
        if config.reset {
            log::warn!("🧹 Resetting database {}", storage.path);
            storage.reset_all().context("resetting storage")?;
        }
        storage.init().context("initializing storage")?;

        let keys = TokenKeys::new(&config.jwt_secret, config.token_ttl_secs);
        Ok(Self {
            config,
            storage,
            keys,
        })
    }

    pub fn services(&self) -> Services {
        Services::new(self.storage.clone(), self.keys.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::CrudService;

    fn config(dir: &std::path::Path, reset: bool) -> Configuration {
        Configuration {
            data_dir: dir.join("nested"),
            api_listen: "127.0.0.1:0".parse().unwrap(),
            jwt_secret: "secret".into(),
            token_ttl_secs: 60,
            log_file: None,
            reset,
        }
    }

    #[test]
    fn open_creates_dir_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::open(config(dir.path(), false)).unwrap();
        assert!(ctx.config.db_path().exists());
        let roles = ctx.services().roles.get_all().unwrap().data.unwrap();
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn reset_drops_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::open(config(dir.path(), false)).unwrap();
        ctx.storage
            .with_conn(|conn| conn.execute("INSERT INTO categories (name) VALUES ('Soups')", []))
            .unwrap();

        let ctx = Context::open(config(dir.path(), true)).unwrap();
        let categories = ctx.services().categories.get_all().unwrap().data.unwrap();
        assert!(categories.is_empty());
    }
}
