mod render;

use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::chart::{ChartOptions, balance_chart_data_uri};
use crate::config::ServerConfig;
use crate::core::{
    Engine, ProjectionReport, parse_projection_input, projection_input_from_values,
    yearly_breakdown,
};
use crate::error::ProjectionError;

pub use render::{GENERIC_INPUT_ERROR, format_currency};
use render::{FormEcho, Outcome, render_page};

const CALCULATOR_HTML: &str = include_str!("../../web/calculator.html");
const CALCULATOR_JS: &str = include_str!("../../web/calculator.js");
const STYLES_CSS: &str = include_str!("../../web/styles.css");

/// Immutable per-process state shared by every handler.
#[derive(Debug)]
pub struct AppState {
    pub engine: Engine,
    pub chart: ChartOptions,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            engine: Engine::new(config.engine),
            chart: config.chart,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectionForm {
    principal: String,
    monthly: String,
    rate: String,
    years: String,
}

impl ProjectionForm {
    fn echo(&self) -> FormEcho<'_> {
        FormEcho {
            principal: &self.principal,
            monthly: &self.monthly,
            rate: &self.rate,
            years: &self.years,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectionPayload {
    principal: Option<f64>,
    monthly: Option<f64>,
    rate: Option<f64>,
    years: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(form_handler).post(calculate_handler))
        .route("/index.html", get(form_handler))
        .route("/calculator", get(calculator_handler))
        .route("/calculator.js", get(calculator_js_handler))
        .route("/styles.css", get(styles_handler))
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let addr = config.socket_addr();
    let state = Arc::new(AppState::from_config(&config));
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, max_years = config.engine.max_years, "compound interest server listening");
    info!("local access: http://127.0.0.1:{}/", config.port);

    axum::serve(listener, app).await
}

async fn form_handler() -> Response {
    html_response(
        StatusCode::OK,
        render_page(FormEcho::default(), Outcome::Blank),
    )
}

async fn calculate_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ProjectionForm>,
) -> Response {
    let projected = parse_projection_input(&form.principal, &form.monthly, &form.rate, &form.years)
        .and_then(|input| Ok((input, state.engine.project(&input)?)));
    let (input, result) = match projected {
        Ok(projected) => projected,
        Err(e) => {
            debug!(error = %e, "rejected calculator form");
            return html_response(
                StatusCode::BAD_REQUEST,
                render_page(form.echo(), Outcome::InputError),
            );
        }
    };

    let breakdown = yearly_breakdown(&input, &result);
    let chart_uri = match balance_chart_data_uri(&result.monthly_balances, &state.chart) {
        Ok(uri) => Some(uri),
        Err(e) => {
            warn!(error = %e, "balance chart could not be rendered");
            None
        }
    };

    let page = render_page(
        form.echo(),
        Outcome::Projection {
            years: input.years(),
            result: &result,
            breakdown: &breakdown,
            chart_uri: chart_uri.as_deref(),
        },
    );
    html_response(StatusCode::OK, page)
}

async fn calculator_handler() -> Response {
    html_response(StatusCode::OK, CALCULATOR_HTML.to_string())
}

async fn calculator_js_handler() -> Response {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        CALCULATOR_JS,
    ))
}

async fn styles_handler() -> Response {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projection_get_handler(
    State(state): State<Arc<AppState>>,
    Query(payload): Query<ProjectionPayload>,
) -> Response {
    projection_handler_impl(&state.engine, payload)
}

async fn projection_post_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProjectionPayload>,
) -> Response {
    projection_handler_impl(&state.engine, payload)
}

fn projection_handler_impl(engine: &Engine, payload: ProjectionPayload) -> Response {
    match projection_from_payload(engine, payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

fn projection_from_payload(
    engine: &Engine,
    payload: ProjectionPayload,
) -> Result<ProjectionReport, ProjectionError> {
    let input = projection_input_from_values(
        required(payload.principal, "principal")?,
        required(payload.monthly, "monthly")?,
        required(payload.rate, "rate")?,
        required(payload.years, "years")?,
    )?;
    engine.report(&input)
}

fn required(value: Option<f64>, field: &'static str) -> Result<f64, ProjectionError> {
    value.ok_or_else(|| ProjectionError::invalid(field, "is required"))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn html_response(status: StatusCode, body: String) -> Response {
    with_cache_control((status, Html(body)))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
