#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::crew::mock::ScriptedEngine;
    use crate::crew::CrewError;
    use crate::generator::context::GeneratorContext;
    use crate::server::routes::{ApiError, HealthResponse, ReportResponse};
    use crate::server::{AppState, router};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(engine: Arc<ScriptedEngine>) -> axum::Router {
        let context = GeneratorContext::with_engine(Config::default(), engine);
        router(Arc::new(AppState::new(context)))
    }

    fn post_report(main_topic: &str, subtopics: &str) -> Request<Body> {
        let body = serde_json::json!({ "main_topic": main_topic, "subtopics": subtopics });
        Request::builder()
            .method("POST")
            .uri("/api/report")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_index_serves_the_page() {
        let response = app(Arc::new(ScriptedEngine::with_raw("report")))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("id=\"main_topic\""));
        assert!(html.contains("id=\"subtopics\""));
        assert!(html.contains("Download the report"));
    }

    #[tokio::test]
    async fn test_submit_returns_report() {
        let engine = Arc::new(ScriptedEngine::with_raw("# AI report"));
        let response = app(engine.clone())
            .oneshot(post_report("Artificial Intelligence", "Ethics, Jobs"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload: ReportResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(payload.report, "# AI report");
        assert_eq!(payload.file_name, "analysis_report_Artificial_Intelligence.txt");
        assert!(!payload.cached);
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_with_missing_input_is_a_warning() {
        let engine = Arc::new(ScriptedEngine::with_raw("report"));
        let response = app(engine.clone())
            .oneshot(post_report("AI", "  "))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload: ApiError = serde_json::from_str(&body_text(response).await).unwrap();
        match payload {
            ApiError::Warning { message } => {
                assert_eq!(message, "Please enter a main topic and sub-topics.")
            }
            other => panic!("unexpected payload: {:?}", other),
        }
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_engine_failure_is_reported_with_type_and_details() {
        let engine = Arc::new(
            ScriptedEngine::with_raw("never")
                .then(Err(CrewError::Provider("invalid api key".to_string()))),
        );
        let response = app(engine).oneshot(post_report("AI", "Ethics")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert!(body.contains("\"level\":\"error\""));

        let payload: ApiError = serde_json::from_str(&body).unwrap();
        match payload {
            ApiError::Error {
                error_type,
                message,
                details,
            } => {
                assert_eq!(error_type, "Provider");
                assert_eq!(message, "model provider error: invalid api key");
                assert!(details.contains("invalid api key"));
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    fn get_download(query: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/api/report/download?{}", query))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_download_is_a_text_attachment() {
        let engine = Arc::new(ScriptedEngine::with_raw("report body"));
        let app = app(engine);

        let response = app
            .clone()
            .oneshot(post_report("Climate Change", "Policy, Energy"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get_download(
                "main_topic=Climate%20Change&subtopics=Policy%2C%20Energy",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"analysis_report_Climate_Change.txt\""
        );
        assert_eq!(body_text(response).await, "report body");
    }

    #[tokio::test]
    async fn test_download_without_generated_report_is_not_found() {
        let engine = Arc::new(ScriptedEngine::with_raw("report body"));
        let response = app(engine.clone())
            .oneshot(get_download("main_topic=AI&subtopics=Ethics"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let payload: ApiError = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(matches!(payload, ApiError::NotFound { .. }));
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_download_with_missing_input_is_a_warning() {
        let engine = Arc::new(ScriptedEngine::with_raw("report body"));
        let response = app(engine.clone())
            .oneshot(get_download("main_topic=AI&subtopics="))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_download_after_submit_reuses_cached_report() {
        let engine = Arc::new(ScriptedEngine::with_raw("report body"));
        let app = app(engine.clone());

        let response = app
            .clone()
            .oneshot(post_report("AI", "Ethics, Jobs"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get_download("main_topic=AI&subtopics=Ethics,Jobs"))
            .await
            .unwrap();
        assert_eq!(body_text(response).await, "report body");

        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_str(&body_text(response).await).unwrap();

        assert_eq!(engine.call_count(), 1);
        assert_eq!(health.status, "ok");
        assert_eq!(health.cached_reports, 1);
        assert_eq!(health.cache.cache_hits, 1);
        assert_eq!(health.cache.cache_writes, 1);
    }
}
