use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use sprinkler_core::{
    AdjustmentOptions, AdjustmentRequest, EncodedMethod, OutputFormat, WeatherError,
    WeatherService, response::first_forwarded,
};

type AppState = Arc<WeatherService>;

const NOT_FOUND_BODY: &str = "Error: Request not found";

pub fn build_app(service: AppState) -> Router {
    Router::new()
        .route("/weatherData", get(weather_data))
        // `/weather{N}.py` and the bare `/{N}` used by older firmware.
        .route("/:segment", get(adjust))
        .fallback(not_found)
        .with_state(service)
}

/// Bind and serve until the process is stopped.
pub async fn serve(service: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(%addr, "sprinkler weather service listening");

    axum::serve(
        listener,
        build_app(service).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("HTTP server terminated")
}

/// Method byte digits from `weather12.py` or `12`.
fn method_digits(segment: &str) -> Option<&str> {
    let digits = segment
        .strip_prefix("weather")
        .and_then(|s| s.strip_suffix(".py"))
        .unwrap_or(segment);

    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(digits)
}

/// Forwarded client address if a proxy set one, otherwise the peer.
fn client_addr(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| first_forwarded(v).to_string())
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_default()
}

/// Engine errors go back as 200 plain text; the firmware only looks at the body.
fn error_response(err: WeatherError) -> Response {
    (StatusCode::OK, format!("Error: {err}")).into_response()
}

/// Query pairs in request order. Repeated keys are allowed; the first one wins.
type QueryPairs = Vec<(String, String)>;

fn first_param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

async fn adjust(
    State(service): State<AppState>,
    Path(segment): Path<String>,
    Query(query): Query<QueryPairs>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Response {
    let Some(digits) = method_digits(&segment) else {
        return not_found().await.into_response();
    };

    let request = AdjustmentRequest {
        method: EncodedMethod::from_path_segment(digits),
        options: AdjustmentOptions::from_wto_lenient(first_param(&query, "wto")),
        location: first_param(&query, "loc").map(str::to_string),
        remote_addr: client_addr(&headers, peer.map(|ConnectInfo(addr)| addr)),
    };

    tracing::debug!(
        method = ?request.method,
        location = request.location.as_deref().unwrap_or_default(),
        remote = %request.remote_addr,
        "adjustment request"
    );

    match service.adjust(&request).await {
        Ok(result) => match OutputFormat::from_query(first_param(&query, "format")) {
            OutputFormat::Json => Json(result).into_response(),
            OutputFormat::KeyValue => result.to_query_string().into_response(),
        },
        Err(e) => error_response(e),
    }
}

async fn weather_data(
    State(service): State<AppState>,
    Query(query): Query<QueryPairs>,
) -> Response {
    match service.report(first_param(&query, "loc")).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn method_segment_forms() {
        assert_eq!(method_digits("weather1.py"), Some("1"));
        assert_eq!(method_digits("weather129.py"), Some("129"));
        assert_eq!(method_digits("2"), Some("2"));
        assert_eq!(method_digits("weather.py"), None);
        assert_eq!(method_digits("weatherx.py"), None);
        assert_eq!(method_digits("favicon.ico"), None);
    }

    #[test]
    fn first_param_takes_earliest_value() {
        let pairs: QueryPairs = vec![
            ("format".into(), "json".into()),
            ("loc".into(), "40,-75".into()),
            ("format".into(), "kv".into()),
        ];

        assert_eq!(first_param(&pairs, "format"), Some("json"));
        assert_eq!(first_param(&pairs, "loc"), Some("40,-75"));
        assert_eq!(first_param(&pairs, "wto"), None);
    }

    #[test]
    fn forwarded_header_wins_over_peer() {
        let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_addr(&headers, Some(peer)), "10.0.0.9");
        assert_eq!(client_addr(&headers, None), "");

        headers.insert("x-forwarded-for", HeaderValue::from_static("192.168.1.1, 10.0.0.1"));
        assert_eq!(client_addr(&headers, Some(peer)), "192.168.1.1");
    }
}
