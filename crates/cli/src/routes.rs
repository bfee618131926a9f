use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Redirect, Response,
    },
    routing::{get, post},
    Form, Json, Router,
};
use language_assistant_core::controller::FormEvent;
use language_assistant_core::form::{FailureKind, FormSnapshot, TranslationRequest, UiStatus};
use language_assistant_core::options::{Language, OptionParseError, Politeness, Proficiency};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tower_http::trace::TraceLayer;

use crate::page::{self, PageView};
use crate::state::AppState;

const BUSY_MESSAGE: &str = "A translation is already in progress.";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/translate", post(translate_form))
        .route("/api/translate", post(translate_json))
        .route("/api/state", get(form_state))
        .route("/api/options", get(options))
        .route("/api/events", get(events))
        .route("/api/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    if let Some(request) = state.in_flight() {
        return Html(render_busy(&state, &request));
    }

    let mut form = state.form.lock().await;
    let notice = form.take_notice();
    let result = if form.is_done() { form.result() } else { None };
    Html(page::render(&PageView {
        app_name: &state.app_name,
        request: form.request(),
        busy: form.is_processing(),
        result,
        notice,
    }))
}

/// Page shown while a submission runs, keeping the user's selections.
fn render_busy(state: &AppState, request: &TranslationRequest) -> String {
    page::render(&PageView {
        app_name: &state.app_name,
        request,
        busy: true,
        result: None,
        notice: None,
    })
}

/// Field names match the page's form controls.
#[derive(Debug, Deserialize)]
struct TranslateForm {
    #[serde(default)]
    text: String,
    #[serde(default)]
    text_opt: String,
    input_lang: String,
    output_lang: String,
    polite_level: String,
    #[serde(default)]
    proficiency: Option<String>,
}

impl TranslateForm {
    fn into_request(self) -> Result<TranslationRequest, OptionParseError> {
        Ok(TranslationRequest {
            source_text: self.text,
            optional_instructions: self.text_opt,
            input_language: self.input_lang.parse::<Language>()?,
            output_language: self.output_lang.parse::<Language>()?,
            politeness: self.polite_level.parse::<Politeness>()?,
            proficiency: match self.proficiency {
                Some(p) => p.parse::<Proficiency>()?,
                None => Proficiency::default(),
            },
        })
    }
}

enum SubmitOutcome {
    Finished(FormSnapshot),
    Busy(TranslationRequest),
}

/// Stores the request on the form and runs one submission in its own task,
/// so a dropped connection cannot cut it short and leave the form processing.
async fn run_submission(
    state: &AppState,
    request: TranslationRequest,
    consume_notice: bool,
) -> Result<SubmitOutcome, StatusCode> {
    let Some(in_flight) = state.claim(&request) else {
        let running = state.in_flight().unwrap_or(request);
        return Ok(SubmitOutcome::Busy(running));
    };
    let mut form = state.form.clone().lock_owned().await;
    form.apply(request);

    let controller = state.controller.clone();
    let task = tokio::spawn(async move {
        // The outcome is recorded on the form itself.
        let _ = controller.submit(&mut form).await;
        let snapshot = form.snapshot();
        if consume_notice {
            form.take_notice();
        }
        drop(form);
        drop(in_flight);
        snapshot
    });

    task.await.map(SubmitOutcome::Finished).map_err(|e| {
        tracing::error!(error = %e, "submission task failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

async fn translate_form(State(state): State<AppState>, Form(form): Form<TranslateForm>) -> Response {
    let request = match form.into_request() {
        Ok(request) => request,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match run_submission(&state, request, false).await {
        Ok(SubmitOutcome::Finished(_)) => Redirect::to("/").into_response(),
        Ok(SubmitOutcome::Busy(running)) => {
            (StatusCode::CONFLICT, Html(render_busy(&state, &running))).into_response()
        }
        Err(status) => status.into_response(),
    }
}

async fn translate_json(
    State(state): State<AppState>,
    Json(request): Json<TranslationRequest>,
) -> Result<(StatusCode, Json<FormSnapshot>), (StatusCode, Json<Value>)> {
    match run_submission(&state, request, true).await {
        Ok(SubmitOutcome::Finished(snapshot)) => Ok((status_for(snapshot.status), Json(snapshot))),
        Ok(SubmitOutcome::Busy(_)) => Err((
            StatusCode::CONFLICT,
            Json(json!({ "error": BUSY_MESSAGE })),
        )),
        Err(status) => Err((status, Json(json!({ "error": "submission failed" })))),
    }
}

fn status_for(status: UiStatus) -> StatusCode {
    match status {
        UiStatus::Failed(FailureKind::EmptyInput) => StatusCode::UNPROCESSABLE_ENTITY,
        UiStatus::Failed(FailureKind::Configuration) => StatusCode::SERVICE_UNAVAILABLE,
        UiStatus::Failed(FailureKind::Execution) => StatusCode::BAD_GATEWAY,
        UiStatus::Idle | UiStatus::Processing | UiStatus::Done => StatusCode::OK,
    }
}

async fn form_state(State(state): State<AppState>) -> Json<Value> {
    if let Some(request) = state.in_flight() {
        return Json(json!({
            "request": request,
            "status": UiStatus::Processing,
            "processing": true,
            "done": false,
        }));
    }
    Json(json!(state.form.lock().await.snapshot()))
}

async fn options() -> Json<Value> {
    Json(json!({
        "languages": Language::ALL,
        "politeness": Politeness::ALL,
        "proficiency": Proficiency::ALL,
    }))
}

async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = BroadcastStream::new(state.controller.subscribe())
        .filter_map(|event| event.ok())
        .map(|event| Event::default().event(event_name(&event)).json_data(event));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn event_name(event: &FormEvent) -> &'static str {
    match event {
        FormEvent::StatusChanged { .. } => "status_changed",
        FormEvent::Notification { .. } => "notification",
    }
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "credential_configured": state.controller.has_credential(),
    }))
}
