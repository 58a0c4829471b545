// src/main.rs

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use agenda_backend::{
    build_router,
    config::{AppConfig, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; sem ele, "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env().context("Falha ao carregar a configuração")?;
    let bind_addr = config.bind_addr.clone();

    let app_state = AppState::new(config)
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = build_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {bind_addr}"))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    // ConnectInfo alimenta a verificação de IP dos links compartilhados
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("Erro no servidor Axum")?;

    Ok(())
}
