use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use taskforge_core::api::{ApiError, HttpTaskApi, TaskApi};
use taskforge_core::config::ApiSettings;
use taskforge_core::dashboard::{Dashboard, SubmitOutcome};
use taskforge_core::error::DashboardError;
use taskforge_shared::{TaskCreate, TaskDto};

#[derive(Clone, Default)]
struct Backend {
    tasks: Arc<Mutex<Vec<TaskDto>>>,
    content_types: Arc<Mutex<Vec<String>>>,
}

async fn list(State(backend): State<Backend>) -> Json<Vec<TaskDto>> {
    Json(backend.tasks.lock().expect("lock").clone())
}

async fn create(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(payload): Json<TaskCreate>,
) -> Json<TaskDto> {
    if let Some(value) = headers.get(header::CONTENT_TYPE) {
        backend
            .content_types
            .lock()
            .expect("lock")
            .push(value.to_str().unwrap_or_default().to_string());
    }
    let mut tasks = backend.tasks.lock().expect("lock");
    let id = tasks.iter().map(|task| task.id).max().unwrap_or(0) + 1;
    let task = TaskDto {
        id,
        title: payload.title,
        completed: payload.completed,
    };
    tasks.push(task.clone());
    Json(task)
}

async fn unavailable() -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, "maintenance")
}

async fn garbage() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "{\"tasks\": []}")
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    addr
}

fn client(addr: SocketAddr, path: &str) -> HttpTaskApi {
    HttpTaskApi::new(&ApiSettings {
        base_url: format!("http://{addr}"),
        path: path.to_string(),
        timeout: Duration::from_secs(5),
    })
    .expect("client")
}

fn seeded() -> Backend {
    let backend = Backend::default();
    backend.tasks.lock().expect("lock").extend([
        TaskDto {
            id: 1,
            title: "Set up CI".to_string(),
            completed: true,
        },
        TaskDto {
            id: 2,
            title: "Write README".to_string(),
            completed: false,
        },
    ]);
    backend
}

#[tokio::test]
async fn lists_and_creates_against_a_live_server() {
    let backend = seeded();
    let router = Router::new()
        .route("/api/tasks", get(list).post(create))
        .with_state(backend.clone());
    let api = client(serve(router).await, "/api/tasks");

    let tasks = api.list_tasks().await.expect("list");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].title, "Set up CI");

    let created = api
        .create_task(TaskCreate::new("Tag release", true))
        .await
        .expect("create");
    assert_eq!(
        created,
        TaskDto {
            id: 3,
            title: "Tag release".to_string(),
            completed: true,
        }
    );
    assert_eq!(
        backend.content_types.lock().expect("lock").as_slice(),
        ["application/json".to_string()]
    );
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let router = Router::new().route("/api/tasks", get(unavailable).post(unavailable));
    let api = client(serve(router).await, "/api/tasks");

    let err = api.list_tasks().await.expect_err("503");
    assert!(matches!(
        err,
        ApiError::Status {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            ..
        }
    ));

    let err = api
        .create_task(TaskCreate::new("x", false))
        .await
        .expect_err("503");
    assert!(matches!(err, ApiError::Status { .. }));
}

#[tokio::test]
async fn wrong_shape_is_a_decode_error() {
    let router = Router::new().route("/api/tasks", get(garbage));
    let api = client(serve(router).await, "/api/tasks");

    let err = api.list_tasks().await.expect_err("object instead of list");
    assert!(matches!(err, ApiError::InvalidJson(_)));
}

#[tokio::test]
async fn custom_collection_path_is_used() {
    let router = Router::new()
        .route("/tasks", get(list).post(create))
        .with_state(seeded());
    let api = client(serve(router).await, "/tasks");

    assert_eq!(api.list_tasks().await.expect("list").len(), 2);
}

#[tokio::test]
async fn dashboard_over_http_loads_and_creates() {
    let backend = seeded();
    let router = Router::new()
        .route("/api/tasks", get(list).post(create))
        .with_state(backend.clone());
    let mut dashboard = Dashboard::new(client(serve(router).await, "/api/tasks"));
    dashboard.mount();

    let state = dashboard.wait_until_loaded().await;
    assert_eq!(state.load_error, None);
    assert_eq!(state.stats().total, 2);
    assert_eq!(state.stats().done, 1);

    dashboard.set_title("Draft onboarding email");
    let outcome = dashboard.submit().await;
    let created = match outcome {
        SubmitOutcome::Created(task) => task,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(created.id, 3);
    assert_eq!(dashboard.snapshot().tasks[0], created);
    assert_eq!(backend.tasks.lock().expect("lock").len(), 3);

    dashboard.teardown();
}

#[tokio::test]
async fn unreachable_server_surfaces_transport_message() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let mut dashboard = Dashboard::new(client(addr, "/api/tasks"));
    dashboard.mount();
    let state = dashboard.wait_until_loaded().await;

    match state.load_error {
        Some(DashboardError::Request(message)) => {
            assert!(!message.is_empty());
            assert_ne!(message, "Failed to load tasks.");
        }
        other => panic!("unexpected load error: {other:?}"),
    }
    assert!(state.tasks.is_empty());
}
