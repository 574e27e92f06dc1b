use super::Router;
use crate::common::ExecutionResult;
use crate::execution::IncomingRequest;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

impl Router {
    /// Convert an axum request, dispatch it and write the result as JSON.
    ///
    /// Requests that cannot be read (oversized or malformed JSON body) are answered
    /// without reaching the dispatch table.
    pub async fn handle(&self, request: Request, body_limit: usize) -> Response {
        match IncomingRequest::from_http(request, body_limit).await {
            Ok(incoming) => self.dispatch(incoming).await.into_response(),
            Err(rejection) => {
                tracing::debug!("Rejected request: {}", rejection);
                ExecutionResult::from(rejection).into_response()
            }
        }
    }

    /// Install the dispatch table as the fallback of an `axum::Router`.
    pub fn into_axum(self, body_limit: usize) -> axum::Router {
        let router = Arc::new(self);
        axum::Router::new().fallback(move |request: Request| {
            let router = Arc::clone(&router);
            async move { router.handle(request, body_limit).await }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ControllerDescriptor, DescriptorRegistry};
    use crate::di::{ContainerBuilder, Injectable, Resolver};
    use crate::exception::ActionError;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, StatusCode};
    use serde::Deserialize;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct EchoController;

    #[async_trait]
    impl Injectable for EchoController {
        async fn inject(_resolver: &mut Resolver) -> crate::Result<Self> {
            Ok(EchoController)
        }
    }

    #[derive(Deserialize)]
    struct Shout {
        text: String,
    }

    impl EchoController {
        async fn shout(&self, shout: Shout) -> Result<String, ActionError> {
            Ok(shout.text.to_uppercase())
        }
    }

    fn app() -> axum::Router {
        let descriptor = ControllerDescriptor::builder::<EchoController>("/echo")
            .post("/", |route| {
                route
                    .body()
                    .action("shout", |echo, args| async move { echo.shout(args.body(0)?).await })
            })
            .build();

        let mut builder = ContainerBuilder::new();
        builder.register(descriptor.injectable.clone()).unwrap();
        let mut registry = DescriptorRegistry::new();
        registry.add_controller(descriptor).unwrap();

        let mut router = Router::new(builder.build(), Arc::new(registry));
        router.register::<EchoController>().unwrap();
        router.into_axum(1024)
    }

    async fn send(request: Request) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(uri: &str, body: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_round_trip_through_axum() {
        let (status, body) = send(post("/echo", r#"{"text":"roar"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("ROAR"));
    }

    #[tokio::test]
    async fn test_body_shape_mismatch_is_bad_request() {
        let (status, body) = send(post("/echo", r#"{"volume":11}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (status, _) = send(post("/echo", "{roar")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let request = Request::builder().uri("/nowhere").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not Found", "status": 404 }));
    }
}
