use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use super::AppState;
use crate::cache::CachePerformanceReport;
use crate::generator::types::ReportError;
use crate::generator::workflow::{cached_report, generate_report};

/// 报告请求，子主题为逗号分隔的原始输入
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub main_topic: String,
    #[serde(default)]
    pub subtopics: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    pub report: String,
    pub file_name: String,
    pub cached: bool,
    pub elapsed_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cached_reports: usize,
    pub cache: CachePerformanceReport,
}

/// 返回给页面的错误：输入问题为警告，其余为错误
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum ApiError {
    Warning {
        message: String,
    },
    /// 缓存中没有可下载的报告
    NotFound {
        message: String,
    },
    Error {
        error_type: String,
        message: String,
        details: String,
    },
}

impl From<ReportError> for ApiError {
    fn from(error: ReportError) -> Self {
        match error {
            ReportError::InvalidInput(message) => ApiError::Warning { message },
            other => ApiError::Error {
                error_type: other.error_type().to_string(),
                message: other.to_string(),
                details: other.details(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Warning { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Error { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

// GET /
pub async fn index() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

// POST /api/report
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(query): Json<ReportQuery>,
) -> Result<Json<ReportResponse>, ApiError> {
    let started = Instant::now();
    let artifact = generate_report(&state.context, &query.main_topic, &query.subtopics).await?;

    Ok(Json(ReportResponse {
        report: artifact.text,
        file_name: artifact.file_name,
        cached: artifact.cached,
        elapsed_ms: started.elapsed().as_millis() as u64,
    }))
}

// GET /api/report/download?main_topic=..&subtopics=..
// 只下载已生成的报告，不会启动crew
pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let artifact = cached_report(&state.context, &query.main_topic, &query.subtopics)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            message: "No report for this request, generate it first.".to_string(),
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&artifact.file_name)),
        ],
        artifact.text,
    )
        .into_response())
}

// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let cache = &state.context.cache;
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        cached_reports: cache.len().await,
        cache: cache.generate_performance_report(),
    })
}

/// 附件响应头；非ASCII文件名额外以 RFC 5987 的 `filename*` 给出
fn content_disposition(file_name: &str) -> String {
    if file_name.is_ascii() {
        return format!("attachment; filename=\"{}\"", file_name);
    }

    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    let mut encoded = String::new();
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("analysis_report_AI.txt"),
            "attachment; filename=\"analysis_report_AI.txt\""
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        assert_eq!(
            content_disposition("rapport_analyse_Économie.txt"),
            "attachment; filename=\"rapport_analyse__conomie.txt\"; filename*=UTF-8''rapport_analyse_%C3%89conomie.txt"
        );
    }
}
