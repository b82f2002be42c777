//! HTTP surface: the edge gate in front of a placeholder page handler, plus
//! small JSON endpoints for the settings UI and for observability.

use crate::config::Config;
use crate::cookie::{cookie_from_headers, preference_cookie, PREFERRED_LANGUAGE_COOKIE};
use crate::gate::{locale_gate, CurrentLocale, RoutingGate};
use crate::i18n::{resolve_server_preference, DetectionMetrics, SupportedLocaleSet};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub struct AppState {
    pub locales: Arc<SupportedLocaleSet>,
    pub metrics: Arc<DetectionMetrics>,
    pub secure_cookies: bool,
}

#[derive(Debug, Serialize)]
struct LocalesResponse<'a> {
    locales: &'a [String],
    fallback: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SetPreferenceRequest {
    pub locale: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Build the application router with the locale gate in front of every route.
pub fn router(config: &Config) -> Router {
    let locales = Arc::new(config.locales.clone());
    let metrics = Arc::new(DetectionMetrics::new());
    let gate = Arc::new(RoutingGate::from_config(
        config,
        Arc::clone(&locales),
        Arc::clone(&metrics),
    ));

    let state = Arc::new(AppState {
        locales,
        metrics,
        secure_cookies: config.secure_cookies,
    });

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/locales", get(list_locales))
        .route(
            "/api/preferred-language",
            get(get_preferred_language).put(set_preferred_language),
        )
        .route("/api/locale-metrics", get(locale_metrics))
        .fallback(page)
        .with_state(state)
        .layer(middleware::from_fn_with_state(gate, locale_gate))
        .layer(TraceLayer::new_for_http())
}

async fn list_locales(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(LocalesResponse {
        locales: state.locales.list(),
        fallback: state.locales.fallback(),
    })
    .into_response()
}

/// Resolve the caller's preference with the same chain the gate uses.
async fn get_preferred_language(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let cookie = cookie_from_headers(&headers, PREFERRED_LANGUAGE_COOKIE);
    let accept_language = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());

    let preference = resolve_server_preference(&state.locales, cookie, accept_language);
    state.metrics.record_resolution(preference.source);
    Json(preference)
}

/// Persist a preference chosen in the settings UI.
async fn set_preferred_language(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetPreferenceRequest>,
) -> Response {
    let Some(code) = state.locales.get(request.locale.trim()) else {
        warn!("Rejected unsupported preferred language '{}'", request.locale);
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: crate::error::LocaleError::InvalidLocale(request.locale).to_string(),
            }),
        )
            .into_response();
    };

    info!("Preferred language set to '{}'", code);
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, preference_cookie(code, state.secure_cookies))],
    )
        .into_response()
}

async fn locale_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.metrics.report())
}

/// Stand-in for page rendering; reports the locale the gate resolved.
async fn page(uri: Uri, locale: Option<Extension<CurrentLocale>>) -> Response {
    match locale {
        Some(Extension(CurrentLocale(locale))) => {
            format!("{} rendered in '{}'", uri.path(), locale).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
