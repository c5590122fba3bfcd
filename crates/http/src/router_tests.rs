//! Router-level tests against an in-memory backend.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use simtrack_core::DialPlan;
    use simtrack_goip::GoipClient;
    use simtrack_provider::ProviderClient;
    use simtrack_service::{
        HistoryService, ProvisionService, ReconcileService, RegistryService, RetryPolicy,
    };
    use simtrack_storage::StorageBackend;

    use crate::{AppState, create_router};

    fn router(api_token: Option<&str>) -> Router {
        let storage = Arc::new(StorageBackend::new_memory());
        // Clients point at a closed port; no routed test exercises them.
        let provider = Arc::new(
            ProviderClient::new("http://127.0.0.1:9".to_owned(), "test-key".to_owned()).unwrap(),
        );
        let goip = Arc::new(
            GoipClient::new(
                "http://127.0.0.1:9".to_owned(),
                "admin".to_owned(),
                "admin".to_owned(),
            )
            .unwrap(),
        );

        let reconcile = Arc::new(ReconcileService::new(
            Arc::clone(&storage),
            Arc::clone(&provider),
            goip,
            DialPlan::default(),
            "col".to_owned(),
            RetryPolicy::default(),
        ));
        let provision =
            Arc::new(ProvisionService::new(Arc::clone(&storage), provider, "col".to_owned()));

        let state = Arc::new(AppState {
            reconcile,
            provision,
            history: Arc::new(HistoryService::new(Arc::clone(&storage))),
            registry: Arc::new(RegistryService::new(storage)),
            api_token: api_token.map(str::to_owned),
        });
        create_router(state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn pending_body(phone: &str) -> Value {
        json!({
            "item_id": "item-1",
            "phone_number": phone,
            "country_id": "col",
            "fetched_at": "2025-01-01 10:00:00"
        })
    }

    #[tokio::test]
    async fn health_is_served_without_auth() {
        let app = router(Some("secret"));
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn version_reports_crate_version() {
        let app = router(None);
        let response = app.oneshot(get("/api/version")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn missing_bearer_token_is_rejected() {
        let app = router(Some("secret"));
        let response = app.oneshot(get("/api/version")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_bearer_token_is_rejected() {
        let app = router(Some("secret"));
        let request = Request::builder()
            .uri("/api/version")
            .header(header::AUTHORIZATION, "Bearer nope")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn matching_bearer_token_is_accepted() {
        let app = router(Some("secret"));
        let request = Request::builder()
            .uri("/api/version")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn history_create_then_list_round_trips() {
        let app = router(None);

        let response = app
            .clone()
            .oneshot(post_json("/api/history", &pending_body("3001234567")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["success"], true);
        assert_eq!(created["data"]["phone_number"], "3001234567");
        assert_eq!(created["data"]["evaluated"], false);

        let response = app.oneshot(get("/api/history")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listed = body_json(response).await;
        assert_eq!(listed["pagination"]["total"], 1);
        assert_eq!(listed["pagination"]["hasMore"], false);
        assert_eq!(listed["data"][0]["phone_number"], "3001234567");
    }

    #[tokio::test]
    async fn duplicate_pending_phone_is_a_conflict() {
        let app = router(None);
        let body = pending_body("3007770001");

        let first = app.clone().oneshot(post_json("/api/history", &body)).await.unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app.oneshot(post_json("/api/history", &body)).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let error = body_json(second).await;
        assert_eq!(error["success"], false);
    }

    #[tokio::test]
    async fn unknown_history_id_is_not_found() {
        let app = router(None);
        let response = app.oneshot(get("/api/history/no-such-id")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_history_update_is_a_bad_request() {
        let app = router(None);

        let response = app
            .clone()
            .oneshot(post_json("/api/history", &pending_body("3002220002")))
            .await
            .unwrap();
        let created = body_json(response).await;
        let id = created["data"]["id"].as_str().unwrap().to_owned();

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/history/{id}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn history_update_raises_evaluated() {
        let app = router(None);

        let response = app
            .clone()
            .oneshot(post_json("/api/history", &pending_body("3002220003")))
            .await
            .unwrap();
        let created = body_json(response).await;
        let id = created["data"]["id"].as_str().unwrap().to_owned();

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/history/{id}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"evaluated": true}).to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated = body_json(response).await;
        assert_eq!(updated["data"]["evaluated"], true);
    }

    #[tokio::test]
    async fn history_delete_removes_the_record() {
        let app = router(None);

        let response = app
            .clone()
            .oneshot(post_json("/api/history", &pending_body("3002220004")))
            .await
            .unwrap();
        let created = body_json(response).await;
        let id = created["data"]["id"].as_str().unwrap().to_owned();

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/history/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get(&format!("/api/history/{id}"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unresolved_filter_hides_evaluated_records() {
        let app = router(None);

        for phone in ["3005550001", "3005550002"] {
            let response =
                app.clone().oneshot(post_json("/api/history", &pending_body(phone))).await.unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app.clone().oneshot(get("/api/history")).await.unwrap();
        let listed = body_json(response).await;
        let id = listed["data"][0]["id"].as_str().unwrap().to_owned();

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/history/{id}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"evaluated": true}).to_string()))
            .unwrap();
        app.clone().oneshot(request).await.unwrap();

        let response = app.oneshot(get("/api/history?unresolved=true")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let unresolved = body_json(response).await;
        let items = unresolved["data"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["evaluated"], false);
    }

    #[tokio::test]
    async fn registry_list_starts_empty() {
        let app = router(None);
        let response = app.oneshot(get("/api/numbers")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listed = body_json(response).await;
        assert_eq!(listed["pagination"]["total"], 0);
        assert_eq!(listed["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn empty_provision_body_is_a_bad_request() {
        let app = router(None);
        let response =
            app.oneshot(post_json("/api/provision", &json!({"devices": []}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn retire_all_reports_zero_on_empty_registry() {
        let app = router(None);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/numbers/retire-all")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["retired"], 0);
    }
}
