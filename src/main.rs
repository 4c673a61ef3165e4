mod app;
mod auth;
mod cli;
mod commands;
mod configuration;
mod context;
mod rest;
mod service;
mod storage;
mod tracing;

#[cfg(test)]
mod integration_tests;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crate::tracing::init();
    app::run().await
}
