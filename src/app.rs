use crate::{cli, configuration::Configuration, context, rest};
use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// The running application: opened storage plus the shutdown signal.
pub struct App {
    ctx: context::Context,
    shutdown: CancellationToken,
}

impl App {
    /// Parses the CLI, points logging at the log file and opens storage.
    pub fn from_cli() -> Result<(App, cli::Cli)> {
        let cli = crate::cli::parse();

        let config = Configuration::from_cli(&cli);
        crate::tracing::set_log_file(config.log_file.as_deref());
        log_startup_info(&config);

        let ctx = context::Context::open(config)?;
        Ok((App::new(ctx), cli))
    }

    fn new(ctx: context::Context) -> Self {
        Self {
            ctx,
            shutdown: CancellationToken::new(),
        }
    }

    pub async fn run_daemon(&self) -> Result<()> {
        self.log_runtime_config();

        let mut rest_handle = self.spawn_rest_server();
        self.wait_for_shutdown(&mut rest_handle).await
    }

    fn spawn_rest_server(&self) -> JoinHandle<()> {
        let addr = self.ctx.config.api_listen;
        let state = rest::AppState::new(self.ctx.services(), self.ctx.keys.clone());
        let token = self.shutdown.clone();

        tokio::spawn(async move {
            if let Err(e) = rest::serve(addr, state, token).await {
                log::error!("REST server failed: {:#}", e);
            }
        })
    }

    async fn wait_for_shutdown(&self, rest_task: &mut JoinHandle<()>) -> Result<()> {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => log::info!("🧨 Ctrl-C received, shutting down..."),
            _ = &mut *rest_task => log::error!("REST task exited unexpectedly"),
        }

        self.shutdown.cancel();

        // Polling a completed JoinHandle again panics.
        if !rest_task.is_finished() {
            let _ = rest_task.await;
        }

        log::info!("✅ Shutdown complete");
        Ok(())
    }

    fn log_runtime_config(&self) {
        log::info!("🌐 REST API: http://{}", self.ctx.config.api_listen);
        log::info!("⏳ Token TTL: {}s", self.ctx.keys.ttl_secs());
        if let Some(path) = self.ctx.config.log_file.as_deref() {
            log::info!("📝 Log file: {}", path.to_string_lossy());
        }
    }
}

fn log_startup_info(config: &Configuration) {
    log::info!("🚀 Starting recipe-api");
    log::info!("📂 Data dir: {}", config.data_dir.to_string_lossy());
    log::info!("🗄️ Database: {}", config.db_path().to_string_lossy());
}

pub async fn run() -> Result<()> {
    let (app, cli) = App::from_cli()?;

    // Handle one-shot commands
    if let Some(cmd) = &cli.cmd {
        return cmd.run(&app.ctx);
    }

    app.run_daemon().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn make_app(dir: &Path, port: u16) -> App {
        let ctx = context::Context::open(Configuration {
            data_dir: dir.to_path_buf(),
            api_listen: format!("127.0.0.1:{}", port).parse().unwrap(),
            jwt_secret: "secret".into(),
            token_ttl_secs: 60,
            log_file: None,
            reset: false,
        })
        .unwrap();
        App::new(ctx)
    }

    #[tokio::test]
    async fn wait_for_shutdown_exits_when_task_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let app = make_app(dir.path(), 0);

        let mut rest_task = tokio::spawn(async {});
        let res = app.wait_for_shutdown(&mut rest_task).await;
        assert!(res.is_ok());
        assert!(app.shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn spawn_rest_server_starts_and_serves_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let port = 34_781;
        let app = make_app(dir.path(), port);

        let handle = app.spawn_rest_server();
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        assert!(
            !handle.is_finished(),
            "REST server task finished unexpectedly (likely bind failed)"
        );

        let mut stream = tokio::net::TcpStream::connect(format!("127.0.0.1:{}", port))
            .await
            .expect("connect to REST server");

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await.unwrap();
        let response = String::from_utf8_lossy(&buffer);

        assert!(response.contains("200 OK"));
        assert!(response.contains("uptime_secs"));

        app.shutdown.cancel();
        let _ = handle.await;
    }
}
