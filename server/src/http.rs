use std::{
    collections::VecDeque,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{self, HeaderName, HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use entity::{EmployeeField, EmployeeFields, EmployeeId};
use products_hr::{CreateOutcome, DashboardView, Directory, Notice, NoticeReceiver, SyncError};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::view;

/// Most notices kept for the next dashboard render; older ones are dropped.
const FLASH_CAPACITY: usize = 8;

/// Directory plus the notices it has published but nobody has seen yet.
pub struct Session {
    pub directory: Directory,
    notices: NoticeReceiver,
    flash: VecDeque<Notice>,
}

impl Session {
    fn new(directory: Directory, notices: NoticeReceiver) -> Self {
        Self {
            directory,
            notices,
            flash: VecDeque::with_capacity(FLASH_CAPACITY),
        }
    }

    /// Moves published notices into the flash list.
    fn collect_notices(&mut self) {
        while let Ok(notice) = self.notices.try_recv() {
            if self.flash.len() == FLASH_CAPACITY {
                self.flash.pop_front();
            }
            self.flash.push_back(notice);
        }
    }

    fn take_flash(&mut self) -> Vec<Notice> {
        self.collect_notices();
        self.flash.drain(..).collect()
    }
}

#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<Session>>,
    cors_allowed_origins: Arc<[String]>,
}

impl AppState {
    pub fn new(directory: Directory, notices: NoticeReceiver, cors_allowed_origins: Vec<String>) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new(directory, notices))),
            cors_allowed_origins: cors_allowed_origins.into(),
        }
    }

    /// Locks the session, first moving any pending notices into the flash
    /// list.
    async fn session(&self) -> MutexGuard<'_, Session> {
        let mut session = self.session.lock().await;
        session.collect_notices();
        session
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "staff dashboard listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::POST, Method::GET])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let header_name = HeaderName::from_static("x-request-id");
    let cors = cors_layer(&state.cors_allowed_origins);
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/health", get(health_handler))
        .route("/employees", post(create_handler))
        .route("/employees/new", get(add_form_handler))
        .route("/employees/{id}/edit", post(edit_handler))
        .route("/employees/{id}/save", post(save_handler))
        .route("/employees/{id}/cancel", post(cancel_handler))
        .route("/employees/{id}/delete", post(delete_handler))
        .route("/employees/{id}/notify", post(notify_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Refreshes on every load, like the initial fetch of a page visit.
async fn dashboard_handler(State(state): State<AppState>) -> Html<String> {
    let mut session = state.session().await;
    // A failed fetch keeps the last list; the error is already logged.
    let _ = session.directory.refresh().await;
    let notices = session.take_flash();
    Html(view::dashboard(&DashboardView::new(&session.directory), &notices))
}

async fn add_form_handler(State(state): State<AppState>) -> Html<String> {
    let session = state.session().await;
    Html(view::add_form(session.directory.draft()))
}

async fn create_handler(
    State(state): State<AppState>,
    Form(fields): Form<EmployeeFields>,
) -> HttpResult<Redirect> {
    let mut session = state.session().await;
    for field in EmployeeField::ALL {
        session.directory.set_draft_field(field, fields.get(field));
    }
    match session.directory.submit_draft().await {
        Ok(CreateOutcome::Created { .. }) => Ok(Redirect::to("/")),
        Ok(CreateOutcome::Skipped) => Ok(Redirect::to("/employees/new")),
        // The draft is kept; the store error is only logged.
        Err(err) if err.is_remote() => {
            warn!(error = %err, "create failed; returning to the form");
            Ok(Redirect::to("/employees/new"))
        }
        Err(err) => Err(err.into()),
    }
}

async fn edit_handler(State(state): State<AppState>, Path(id): Path<String>) -> HttpResult<Redirect> {
    let id = parse_id(&id);
    state.session().await.directory.begin_edit(&id)?;
    Ok(Redirect::to("/"))
}

async fn save_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(fields): Form<EmployeeFields>,
) -> HttpResult<Redirect> {
    let id = parse_id(&id);
    let mut session = state.session().await;
    session.directory.set_edit_fields(&id, fields)?;
    swallow_remote(session.directory.save_edit(&id).await)?;
    Ok(Redirect::to("/"))
}

async fn cancel_handler(State(state): State<AppState>) -> Redirect {
    state.session().await.directory.cancel_edit();
    Redirect::to("/")
}

async fn delete_handler(State(state): State<AppState>, Path(id): Path<String>) -> HttpResult<Redirect> {
    let id = parse_id(&id);
    swallow_remote(state.session().await.directory.remove(&id).await)?;
    Ok(Redirect::to("/"))
}

async fn notify_handler(State(state): State<AppState>, Path(id): Path<String>) -> HttpResult<Redirect> {
    let id = parse_id(&id);
    let session = state.session().await;
    let employee = session
        .directory
        .get(&id)
        .cloned()
        .ok_or_else(|| SyncError::UnknownEmployee(id.clone()))?;
    // Detached: the outcome arrives as a notice.
    drop(session.directory.notify(employee));
    Ok(Redirect::to("/"))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let employees = state.session().await.directory.len();
    Json(HealthResponse {
        ok: true,
        employees,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    employees: usize,
    version: &'static str,
}

fn parse_id(raw: &str) -> EmployeeId {
    match raw.parse() {
        Ok(id) => id,
        Err(never) => match never {},
    }
}

/// Edits and deletes give the user no failure feedback; the store error has
/// been logged by the directory.
fn swallow_remote(result: Result<(), SyncError>) -> Result<(), SyncError> {
    match result {
        Err(err) if err.is_remote() => {
            warn!(error = %err, "store call failed; continuing");
            Ok(())
        }
        other => other,
    }
}

type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug)]
struct HttpError {
    status: StatusCode,
    message: String,
}

impl From<SyncError> for HttpError {
    fn from(err: SyncError) -> Self {
        let status = match &err {
            SyncError::Store(_) => StatusCode::BAD_GATEWAY,
            SyncError::UnknownEmployee(_) => StatusCode::NOT_FOUND,
            SyncError::NoActiveEdit | SyncError::EditTargetMismatch { .. } => StatusCode::CONFLICT,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };

    info!("shutdown signal received");
}
