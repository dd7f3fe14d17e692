//! Web服务：页面、报告生成、下载与健康检查

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::generator::context::GeneratorContext;

pub mod routes;

/// 路由共享的状态
pub struct AppState {
    pub context: GeneratorContext,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(context: GeneratorContext) -> Self {
        Self {
            context,
            start_time: Instant::now(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/api/report", post(routes::submit))
        .route("/api/report/download", get(routes::download))
        .route("/api/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 启动Web服务，直到进程退出
pub async fn serve(config: &Config) -> Result<()> {
    let context = GeneratorContext::new(config.clone())?;
    let state = Arc::new(AppState::new(context));

    spawn_cache_janitor(&state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        %addr,
        provider = %config.llm.provider,
        model = %config.llm.model,
        variant = %config.crew.variant,
        "trend-crew listening on http://{}",
        addr
    );

    axum::serve(listener, router(state))
        .await
        .context("http server stopped unexpectedly")
}

/// 定期清理过期的缓存条目
fn spawn_cache_janitor(state: &Arc<AppState>) {
    let cache = Arc::clone(&state.context.cache);
    if !cache.is_enabled() {
        return;
    }

    let period = cache.ttl().max(Duration::from_secs(60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // 第一次tick立即返回
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = cache.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "expired reports purged");
            }
        }
    });
}

#[cfg(test)]
mod tests;
