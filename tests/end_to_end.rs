use serde::Serialize;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use talon::axum::body::Body;
use talon::axum::extract::Request;
use talon::axum::http::Method;
use talon::prelude::*;
use tower::ServiceExt;

#[derive(Debug, Clone, Serialize)]
struct Dinosaur {
    name: &'static str,
    era: &'static str,
}

#[derive(Default)]
struct ActionCounter {
    calls: AtomicUsize,
}

#[async_trait]
impl Injectable for ActionCounter {
    async fn inject(_resolver: &mut Resolver) -> talon::Result<Self> {
        Ok(ActionCounter::default())
    }
}

struct DinosaurController {
    counter: Arc<ActionCounter>,
}

#[async_trait]
impl Injectable for DinosaurController {
    async fn inject(resolver: &mut Resolver) -> talon::Result<Self> {
        Ok(DinosaurController {
            counter: resolver.resolve::<ActionCounter>().await?,
        })
    }
}

impl DinosaurController {
    async fn list(&self) -> Result<Vec<Dinosaur>, ActionError> {
        self.counter.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![
            Dinosaur {
                name: "Tyrannosaurus",
                era: "Cretaceous",
            },
            Dinosaur {
                name: "Stegosaurus",
                era: "Jurassic",
            },
            Dinosaur {
                name: "Velociraptor",
                era: "Cretaceous",
            },
        ])
    }

    async fn reject(&self) -> Result<(), ActionError> {
        self.counter.calls.fetch_add(1, Ordering::SeqCst);
        Err(HttpException::bad_request("Bad Request").into())
    }

    async fn secret(&self) -> Result<&'static str, ActionError> {
        self.counter.calls.fetch_add(1, Ordering::SeqCst);
        Ok("eggs")
    }

    async fn count(&self, limit: i64) -> Result<i64, ActionError> {
        Ok(limit)
    }
}

struct DenyAll;

#[async_trait]
impl BeforeHook for DenyAll {
    async fn before(&self, _context: &RequestContext) -> Result<HookOutcome, ActionError> {
        Ok(HookOutcome::Respond(ExecutionResult::error(
            StatusCode::UNAUTHORIZED,
            "Unauthorized",
        )))
    }
}

fn config() -> ApplicationConfig {
    ApplicationConfig::new()
        .provider::<ActionCounter>(Scope::Singleton)
        .controller(
            ControllerDescriptor::builder::<DinosaurController>("/dinosaurs")
                .get("/", |route| {
                    route.action("list", |controller, _args| async move { controller.list().await })
                })
                .get("/reject", |route| {
                    route.action("reject", |controller, _args| async move {
                        controller.reject().await
                    })
                })
                .get("/secret/", |route| {
                    route.before(DenyAll).action("secret", |controller, _args| async move {
                        controller.secret().await
                    })
                })
                .get("/count", |route| {
                    route.query("limit").action("count", |controller, args| async move {
                        controller
                            .count(args.pipe(0, &DefaultValuePipe::new(ParseIntPipe, 10))?)
                            .await
                    })
                })
                .build(),
        )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .try_init();
}

async fn application() -> Application {
    init_tracing();
    Application::builder()
        .config(config())
        .settings(ConfigService::new())
        .build()
        .await
        .unwrap()
}

async fn calls(app: &Application) -> usize {
    app.container()
        .resolve::<ActionCounter>()
        .await
        .unwrap()
        .calls
        .load(Ordering::SeqCst)
}

#[tokio::test]
async fn test_list_returns_three_records() {
    let app = application().await;
    let result = app.router().dispatch(IncomingRequest::get("/dinosaurs")).await;

    assert_eq!(result.status, StatusCode::OK);
    assert_eq!(result.body.as_array().map(Vec::len), Some(3));
    assert_eq!(result.body[0]["name"], "Tyrannosaurus");
}

#[tokio::test]
async fn test_http_exception_becomes_structured_error() {
    let app = application().await;
    let result = app
        .router()
        .dispatch(IncomingRequest::get("/dinosaurs/reject"))
        .await;

    assert_eq!(result.status, StatusCode::BAD_REQUEST);
    assert_eq!(result.body, json!({ "error": "Bad Request", "status": 400 }));
}

#[tokio::test]
async fn test_short_circuit_hook_skips_action() {
    let app = application().await;
    let result = app
        .router()
        .dispatch(IncomingRequest::get("/dinosaurs/secret"))
        .await;

    assert_eq!(result.status, StatusCode::UNAUTHORIZED);
    assert_eq!(result.body["status"], 401);
    assert_eq!(calls(&app).await, 0);
}

#[tokio::test]
async fn test_unregistered_route_is_not_found() {
    let app = application().await;
    let result = app
        .router()
        .dispatch(IncomingRequest::new(Method::DELETE, "/dinosaurs"))
        .await;

    assert_eq!(result.status, StatusCode::NOT_FOUND);
    assert_eq!(result.body, json!({ "error": "Not Found", "status": 404 }));
}

#[tokio::test]
async fn test_pipes_coerce_query_values() {
    let app = application().await;

    let defaulted = app.router().dispatch(IncomingRequest::get("/dinosaurs/count")).await;
    assert_eq!(defaulted.body, json!(10));

    let explicit = app
        .router()
        .dispatch(IncomingRequest::get("/dinosaurs/count").with_query("limit", "3"))
        .await;
    assert_eq!(explicit.body, json!(3));

    let invalid = app
        .router()
        .dispatch(IncomingRequest::get("/dinosaurs/count").with_query("limit", "many"))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_singleton_state_is_shared_across_requests() {
    let app = application().await;
    for _ in 0..3 {
        app.router().dispatch(IncomingRequest::get("/dinosaurs/")).await;
    }
    assert_eq!(calls(&app).await, 3);
}

#[tokio::test]
async fn test_served_through_axum() {
    let service = application().await.into_axum();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/dinosaurs")
        .body(Body::empty())
        .unwrap();
    let response = service.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = talon::axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.as_array().map(Vec::len), Some(3));
}
