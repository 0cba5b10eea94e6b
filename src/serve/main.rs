//! Interactive server for the office Voronoi map.
//!
//! Renders the tessellation filtered by district, exposes regions as JSON
//! and answers "which office region contains this location" lookups.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use voronoi_offices::colors::Rgba;
use voronoi_offices::config::Config;
use voronoi_offices::models::{DistrictCode, RegionShape};
use voronoi_offices::render::{render_html, Controls, InteractiveRenderer, Selection};

mod state;
use state::AppState;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "serve")]
#[command(about = "Interactive office Voronoi map server")]
struct Args {
    /// Office CSV file (plain or .gz)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path).context("Failed to load config file")?,
        None => Config::default(),
    };
    if let Some(file) = args.file {
        config.input.path = file;
    }
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    config.validate()?;

    info!("Office Voronoi server");
    let listen = config.server.listen.clone();
    let state = Arc::new(AppState::load(config).context("Failed to build initial map")?);

    info!("Starting server on {}", listen);
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/districts", get(districts_handler))
        .route("/v1/regions", get(regions_handler))
        .route("/v1/render", get(render_handler))
        .route("/v1/reverse", get(reverse_handler))
        .route("/v1/reload", post(reload_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    offices: usize,
    regions: usize,
    content_hash: String,
    loaded_at: String,
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.snapshot().await;
    Json(HealthResponse {
        status: "ok",
        offices: snapshot.points.len(),
        regions: snapshot.tessellation.regions.len(),
        content_hash: format!("{:016x}", snapshot.content_hash),
        loaded_at: snapshot.loaded_at.to_rfc3339(),
    })
}

#[derive(Serialize)]
struct DistrictEntry {
    code: DistrictCode,
    color: Rgba,
    offices: usize,
}

/// Distinct districts in first-seen order with their colors
async fn districts_handler(State(state): State<Arc<AppState>>) -> Json<Vec<DistrictEntry>> {
    let snapshot = state.snapshot().await;
    let entries = snapshot
        .tessellation
        .colors
        .iter()
        .map(|(code, color)| DistrictEntry {
            code,
            color,
            offices: snapshot.points.in_district(code).count(),
        })
        .collect();
    Json(entries)
}

#[derive(Deserialize)]
struct FilterParams {
    /// Comma-separated district codes; absent means all
    districts: Option<String>,
    /// Overlay office markers (defaults to true)
    show_points: Option<bool>,
}

#[derive(Serialize)]
struct RegionResponse {
    point_id: usize,
    district: DistrictCode,
    kind: &'static str,
    ring: Vec<[f64; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    gaps: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    area: Option<f64>,
}

/// Regions of the selected districts
async fn regions_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Vec<RegionResponse>>, (StatusCode, String)> {
    let snapshot = state.snapshot().await;
    let selection = selection(&params, snapshot.tessellation.colors.codes())?;

    let regions = snapshot
        .tessellation
        .regions
        .iter()
        .filter(|r| selection.contains(r.district))
        .map(|r| RegionResponse {
            point_id: r.point_id.0,
            district: r.district,
            kind: r.shape.kind(),
            ring: r.shape.polygon().iter().map(|c| [c.x, c.y]).collect(),
            gaps: match &r.shape {
                RegionShape::Partial { gaps, .. } => gaps.clone(),
                _ => Vec::new(),
            },
            area: r.area(),
        })
        .collect();

    Ok(Json(regions))
}

/// Interactive page for the selected districts
async fn render_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Result<Html<String>, (StatusCode, String)> {
    let snapshot = state.snapshot().await;
    let tessellation = &snapshot.tessellation;
    let selection = selection(&params, tessellation.colors.codes())?;

    let renderer =
        InteractiveRenderer::new(&tessellation.regions, &snapshot.points, &tessellation.colors);
    let figure = renderer.figure(&selection);
    let controls = Controls {
        action: "/v1/render".to_string(),
        districts: tessellation
            .colors
            .codes()
            .iter()
            .map(|code| (*code, selection.contains(*code)))
            .collect(),
        show_points: selection.show_points,
    };

    Ok(Html(render_html(&figure, Some(&controls))))
}

#[derive(Deserialize)]
struct ReverseParams {
    /// Point longitude
    #[serde(rename = "point.lon")]
    point_lon: f64,
    /// Point latitude
    #[serde(rename = "point.lat")]
    point_lat: f64,
}

#[derive(Serialize)]
struct ReverseResponse {
    point_id: usize,
    name: String,
    district: DistrictCode,
    region: &'static str,
    lon: f64,
    lat: f64,
}

/// Office whose region contains the given location
async fn reverse_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReverseParams>,
) -> Result<Json<ReverseResponse>, (StatusCode, String)> {
    let snapshot = state.snapshot().await;
    let office = snapshot
        .index
        .locate(params.point_lon, params.point_lat)
        .ok_or_else(|| (StatusCode::NOT_FOUND, "No assigned offices".to_string()))?;

    let region = snapshot
        .tessellation
        .regions
        .iter()
        .find(|r| r.point_id == office.id)
        .map_or("degenerate", |r| r.shape.kind());

    Ok(Json(ReverseResponse {
        point_id: office.id.0,
        name: office.label(),
        district: office.district,
        region,
        lon: office.x,
        lat: office.y,
    }))
}

/// Drop memoized data and reload the dataset from disk
async fn reload_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, (StatusCode, String)> {
    let snapshot = state.reload().await.map_err(|e| {
        tracing::error!("Reload failed: {}", e);
        (StatusCode::UNPROCESSABLE_ENTITY, format!("{:#}", e))
    })?;

    Ok(Json(HealthResponse {
        status: "reloaded",
        offices: snapshot.points.len(),
        regions: snapshot.tessellation.regions.len(),
        content_hash: format!("{:016x}", snapshot.content_hash),
        loaded_at: snapshot.loaded_at.to_rfc3339(),
    }))
}

fn selection(
    params: &FilterParams,
    known: &[DistrictCode],
) -> Result<Selection, (StatusCode, String)> {
    let districts = match params.districts.as_deref() {
        None => known.to_vec(),
        Some(raw) => parse_districts(raw).map_err(|e| (StatusCode::BAD_REQUEST, e))?,
    };
    Ok(Selection {
        districts,
        show_points: params.show_points.unwrap_or(true),
    })
}

/// Parse "1,2,5" into district codes, keeping order and dropping repeats
fn parse_districts(raw: &str) -> Result<Vec<DistrictCode>, String> {
    let mut codes = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let code = part
            .parse::<u32>()
            .map(DistrictCode)
            .map_err(|_| format!("Invalid district code '{}'", part))?;
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    Ok(codes)
}
