//! Widgets Module Tests
//!
//! ## Test Scopes
//! - **Page**: Splitting an over-fetched result into a page and its lookahead.
//! - **WidgetService**: Rate limiting in front of the store.
//! - **HTTP API**: End-to-end requests against a server bound to an ephemeral port.

#[cfg(test)]
mod tests {
    use crate::ratelimit::service::RateLimitService;
    use crate::ratelimit::types::RateLimitSettings;
    use crate::storage::memory::WidgetStore;
    use crate::storage::types::{StoreError, Widget, WidgetToCreate};
    use crate::widgets::pagination::parse_next_link;
    use crate::widgets::protocol::{ErrorResponse, Paging};
    use crate::widgets::routes::router;
    use crate::widgets::service::{Page, ServiceError, WidgetService};
    use reqwest::StatusCode;
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn service_with(limits: RateLimitSettings) -> WidgetService {
        WidgetService::new(
            Arc::new(WidgetStore::new()),
            Arc::new(RateLimitService::new(&limits)),
        )
    }

    fn draft(z: Option<i32>) -> WidgetToCreate {
        WidgetToCreate {
            x: 1,
            y: 2,
            z,
            width: 3,
            height: 4,
        }
    }

    // ============================================================
    // PAGE TESTS
    // ============================================================

    #[test]
    fn test_page_without_lookahead_has_no_next() {
        let page = Page::of(vec![1, 2], 2);
        assert_eq!(page.elements, vec![1, 2]);
        assert!(!page.has_next());
    }

    #[test]
    fn test_page_with_lookahead_exposes_next() {
        let page = Page::of(vec![1, 2, 3], 2);
        assert_eq!(page.elements, vec![1, 2]);
        assert_eq!(page.next, Some(3));
    }

    #[test]
    fn test_page_of_empty() {
        let page: Page<i32> = Page::of(vec![], 5);
        assert!(page.elements.is_empty());
        assert!(!page.has_next());
    }

    // ============================================================
    // SERVICE TESTS
    // ============================================================

    #[test]
    fn test_service_read_all_fetches_one_extra() {
        let service = service_with(RateLimitSettings::default());
        for z in 1..=3 {
            service.create(draft(Some(z))).unwrap();
        }

        let page = service.read_all(2, None).unwrap().model;

        assert_eq!(page.elements.len(), 2);
        assert_eq!(page.next.map(|w| w.z), Some(3));
    }

    #[test]
    fn test_service_reports_not_found() {
        let service = service_with(RateLimitSettings::default());

        let err = service.read_one("missing").unwrap_err();

        assert!(matches!(err, ServiceError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn test_service_rejects_when_rate_limited() {
        let service = service_with(RateLimitSettings {
            create: Some(1),
            ..Default::default()
        });

        let first = service.create(draft(None)).unwrap();
        assert_eq!(first.rate_limit.map(|s| s.available), Some(0));

        let err = service.create(draft(None)).unwrap_err();
        match err {
            ServiceError::TooManyRequests(stat) => {
                assert!(!stat.consumed);
                assert_eq!(stat.rpm, 1);
                assert!(stat.nanos_until_refill > 0);
            }
            other => panic!("expected rate limit error, got {:?}", other),
        }

        // a rejected request never reaches the store
        assert_eq!(service.read_all(10, None).unwrap().model.elements.len(), 1);
    }

    #[test]
    fn test_service_without_limits_has_no_stat() {
        let service = service_with(RateLimitSettings::default());
        let created = service.create(draft(None)).unwrap();
        assert!(created.rate_limit.is_none());
    }

    // ============================================================
    // HTTP API TESTS
    // ============================================================

    struct TestApp {
        base: String,
        client: reqwest::Client,
    }

    impl TestApp {
        async fn spawn(limits: RateLimitSettings, paging: Paging) -> Self {
            let app = router(Arc::new(service_with(limits)), paging);
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            Self {
                base: format!("http://{}", addr),
                client: reqwest::Client::new(),
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        async fn create(&self, z: Option<i32>) -> Widget {
            let resp = self
                .client
                .post(self.url("/widgets"))
                .json(&json!({ "x": 1, "y": 2, "z": z, "width": 3, "height": 4 }))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::CREATED);
            resp.json().await.unwrap()
        }

        async fn read_one(&self, id: &str) -> Widget {
            let resp = self
                .client
                .get(self.url(&format!("/widgets/{}", id)))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            resp.json().await.unwrap()
        }

        /// Returns the page and the URL of the next one.
        async fn list(&self, url: String) -> (Vec<Widget>, Option<String>) {
            let resp = self.client.get(url).send().await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let next = resp
                .headers()
                .get("link")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_next_link)
                .map(str::to_string);
            (resp.json().await.unwrap(), next)
        }

        async fn update(&self, id: &str, body: Value) -> reqwest::Response {
            self.client
                .put(self.url(&format!("/widgets/{}", id)))
                .json(&body)
                .send()
                .await
                .unwrap()
        }

        async fn delete(&self, id: &str) -> reqwest::Response {
            self.client
                .delete(self.url(&format!("/widgets/{}", id)))
                .send()
                .await
                .unwrap()
        }
    }

    fn zs(widgets: &[Widget]) -> Vec<i32> {
        widgets.iter().map(|w| w.z).collect()
    }

    #[tokio::test]
    async fn test_basic_scenario() {
        let app = TestApp::spawn(RateLimitSettings::default(), Paging::default()).await;

        let w1 = app.create(Some(1)).await;
        let w2 = app.create(None).await;
        assert_eq!(w2.z, 2);
        let w3 = app.create(None).await;
        assert_eq!(w3.z, 3);

        // shifts w2 and w3
        let w4 = app.create(Some(2)).await;
        assert_eq!(w4.z, 2);
        assert_eq!(app.read_one(&w2.id).await.z, 3);
        assert_eq!(app.read_one(&w3.id).await.z, 4);

        let w5 = app.create(Some(6)).await;

        let (page1, next1) = app.list(app.url("/widgets?perPage=2")).await;
        assert_eq!(zs(&page1), vec![1, 2]);
        assert_eq!(page1[0].id, w1.id);
        assert_eq!(page1[1].id, w4.id);
        let next1 = next1.expect("first page should link to the second");

        let (page2, next2) = app.list(next1).await;
        assert_eq!(zs(&page2), vec![3, 4]);
        assert_eq!(page2[0].id, w2.id);
        assert_eq!(page2[1].id, w3.id);

        let (page3, next3) = app.list(next2.unwrap()).await;
        assert_eq!(zs(&page3), vec![6]);
        assert_eq!(page3[0].id, w5.id);
        assert!(next3.is_none());

        // moving w2 onto w3 pushes w3 and w5 up
        let resp = app.update(&w2.id, json!({ "z": 4 })).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let w2_updated: Widget = resp.json().await.unwrap();
        assert_eq!(w2_updated.z, 4);

        let resp = app.delete(&w4.id).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let w4_deleted: Widget = resp.json().await.unwrap();
        assert_eq!(w4_deleted.z, 2);

        let (all, next) = app.list(app.url("/widgets?perPage=99")).await;
        assert!(next.is_none());
        let ids: Vec<&str> = all.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec![&w1.id, &w2.id, &w3.id, &w5.id]);
        assert_eq!(zs(&all), vec![1, 4, 5, 7]);
    }

    #[tokio::test]
    async fn test_list_uses_default_and_caps_per_page() {
        let paging = Paging {
            default_per_page: 2,
            max_per_page: 3,
        };
        let app = TestApp::spawn(RateLimitSettings::default(), paging).await;
        for z in 0..5 {
            app.create(Some(z)).await;
        }

        let (page, _) = app.list(app.url("/widgets")).await;
        assert_eq!(page.len(), 2);

        let (page, next) = app.list(app.url("/widgets?perPage=100")).await;
        assert_eq!(page.len(), 3);
        assert!(next.unwrap().ends_with("fromZ=3"));

        let (page, _) = app.list(app.url("/widgets?fromZ=4")).await;
        assert_eq!(zs(&page), vec![4]);
    }

    #[tokio::test]
    async fn test_list_rejects_invalid_per_page() {
        let app = TestApp::spawn(RateLimitSettings::default(), Paging::default()).await;

        for query in ["perPage=0", "perPage=-3", "perPage=abc", "fromZ=9999999999"] {
            let resp = app
                .client
                .get(app.url(&format!("/widgets?{}", query)))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "query {}", query);
        }
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let app = TestApp::spawn(RateLimitSettings::default(), Paging::default()).await;

        let resp = app
            .client
            .post(app.url("/widgets"))
            .json(&json!({ "y": 2, "width": 3, "height": 4 }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = resp.json().await.unwrap();
        assert_eq!(body.status, 400);
        assert_eq!(body.message, "Field x cannot be empty.");

        let resp = app
            .client
            .post(app.url("/widgets"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_requires_a_field() {
        let app = TestApp::spawn(RateLimitSettings::default(), Paging::default()).await;
        let widget = app.create(None).await;

        let resp = app.update(&widget.id, json!({})).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = resp.json().await.unwrap();
        assert_eq!(body.message, "Must provide at least one field for update.");
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let app = TestApp::spawn(RateLimitSettings::default(), Paging::default()).await;
        let widget = app.create(Some(5)).await;

        let resp = app.update(&widget.id, json!({ "width": 42 })).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let updated: Widget = resp.json().await.unwrap();
        assert_eq!(updated.width, 42);
        assert_eq!(updated.z, 5);
        assert_eq!((updated.x, updated.y, updated.height), (1, 2, 4));
        assert!(updated.last_modified >= widget.last_modified);
    }

    #[tokio::test]
    async fn test_missing_widget_is_404() {
        let app = TestApp::spawn(RateLimitSettings::default(), Paging::default()).await;

        let resp = app.client.get(app.url("/widgets/nope")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = resp.json().await.unwrap();
        assert_eq!(body.message, "Could not find Widget nope");

        assert_eq!(
            app.update("nope", json!({ "x": 1 })).await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(app.delete("nope").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_overflow_is_409() {
        let app = TestApp::spawn(RateLimitSettings::default(), Paging::default()).await;
        app.create(Some(i32::MAX)).await;

        let resp = app
            .client
            .post(app.url("/widgets"))
            .json(&json!({ "x": 1, "y": 2, "width": 3, "height": 4 }))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let (all, _) = app.list(app.url("/widgets")).await;
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_headers_and_429() {
        let limits = RateLimitSettings {
            read_one: Some(2),
            ..Default::default()
        };
        let app = TestApp::spawn(limits, Paging::default()).await;
        let widget = app.create(None).await;
        let url = app.url(&format!("/widgets/{}", widget.id));

        let first = app.client.get(&url).send().await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()["x-requests-per-minute"], "2");
        assert_eq!(first.headers()["x-requests-available"], "1");
        assert_eq!(first.headers()["x-nanos-until-refill"], "0");

        let second = app.client.get(&url).send().await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(second.headers()["x-requests-available"], "0");

        let third = app.client.get(&url).send().await.unwrap();
        assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(third.headers()["x-requests-available"], "0");
        let body: ErrorResponse = third.json().await.unwrap();
        assert_eq!(body.status, 429);
        assert_eq!(body.message, "Too many requests.");

        // other operations are not limited
        let resp = app.client.get(app.url("/widgets")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get("x-requests-per-minute").is_none());
    }

    #[tokio::test]
    async fn test_rate_limits_reconfigured_at_runtime() {
        let app = TestApp::spawn(RateLimitSettings::default(), Paging::default()).await;

        let resp = app
            .client
            .put(app.url("/admin/rate-limits"))
            .json(&json!({ "global": 1 }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let current: RateLimitSettings = app
            .client
            .get(app.url("/admin/rate-limits"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(current.global, Some(1));

        app.create(None).await;
        let resp = app.client.get(app.url("/widgets")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let resp = app
            .client
            .put(app.url("/admin/rate-limits"))
            .json(&json!({ "global": 0 }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
