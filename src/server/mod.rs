//! HTTP/JSON serving layer.
//!
//! Every endpoint answers HTTP 200; failures travel as `{"erro": ...}`
//! bodies so the frontend never branches on status codes. This mirrors the
//! contract the frontend was built against.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use quotes_config::ServerSettings;
use quotes_core::{QuoteError, QuoteResult, QuoteSource, Watchlist};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Hits returned by the discovery endpoint.
const SEARCH_LIMIT: usize = 10;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    quotes: Arc<dyn QuoteSource>,
    watchlist: Watchlist,
    smoke_epic: String,
}

impl AppState {
    pub fn new(quotes: Arc<dyn QuoteSource>, watchlist: Watchlist, smoke_epic: String) -> Self {
        Self {
            quotes,
            watchlist,
            smoke_epic,
        }
    }
}

/// Create the Axum router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/elite", get(elite))
        .route("/descobrir-epic/{term}", get(discover_epic))
        .route("/teste-btc", get(smoke_test))
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(state: AppState, settings: &ServerSettings) -> anyhow::Result<()> {
    let router = create_router(state);
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

/// Success-or-error body.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiPayload<T> {
    Ok(T),
    Erro { erro: String },
}

impl<T> ApiPayload<T> {
    fn erro(e: &QuoteError) -> Self {
        Self::Erro {
            erro: e.to_string(),
        }
    }
}

/// One watch-list slot: a price, or that instrument's own failure.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum SlotPayload {
    Preco { preco: f64 },
    Erro { erro: String },
}

impl From<QuoteResult<Decimal>> for SlotPayload {
    fn from(result: QuoteResult<Decimal>) -> Self {
        match result {
            Ok(price) => Self::Preco {
                preco: price.to_f64().unwrap_or_default(),
            },
            Err(e) => Self::Erro {
                erro: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    status: &'static str,
    servico: String,
    versao: String,
}

/// Liveness endpoint.
async fn status() -> Json<StatusPayload> {
    Json(StatusPayload {
        status: "Online",
        servico: env!("CARGO_PKG_NAME").to_string(),
        versao: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Batch quote for the configured watch-list.
async fn elite(State(state): State<AppState>) -> Json<BTreeMap<String, SlotPayload>> {
    let results = state.quotes.batch(&state.watchlist).await;
    let failures = results.values().filter(|r| r.is_err()).count();
    debug!(total = results.len(), failures, "watch-list batch composed");
    Json(
        results
            .into_iter()
            .map(|(name, result)| (name, result.into()))
            .collect(),
    )
}

#[derive(Debug, Serialize)]
struct SearchPayload {
    termo_buscado: String,
    total_encontrados: usize,
    resultados: Vec<HitPayload>,
}

#[derive(Debug, Serialize)]
struct HitPayload {
    epic: String,
    nome: String,
    tipo: String,
}

/// Free-text epic discovery.
async fn discover_epic(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Json<ApiPayload<SearchPayload>> {
    match state.quotes.search(&term, SEARCH_LIMIT).await {
        Ok(hits) => {
            let resultados: Vec<HitPayload> = hits
                .into_iter()
                .map(|hit| HitPayload {
                    epic: hit.epic,
                    nome: hit.name,
                    tipo: hit.instrument_type,
                })
                .collect();
            Json(ApiPayload::Ok(SearchPayload {
                termo_buscado: term,
                total_encontrados: resultados.len(),
                resultados,
            }))
        }
        Err(e) => Json(ApiPayload::erro(&e)),
    }
}

#[derive(Debug, Serialize)]
struct SmokePayload {
    ativo: String,
    preco_atual: f64,
    status: &'static str,
}

/// Connectivity smoke test against an always-open market.
///
/// Queries the configured epic exactly as given, bypassing venue
/// normalization, and reports the snapshot bid.
async fn smoke_test(State(state): State<AppState>) -> Json<ApiPayload<SmokePayload>> {
    match state.quotes.quote(&state.smoke_epic).await {
        Ok(quote) => match quote.bid.and_then(|bid| bid.to_f64()) {
            Some(preco_atual) => Json(ApiPayload::Ok(SmokePayload {
                ativo: state.smoke_epic.clone(),
                preco_atual,
                status: "CONECTADO",
            })),
            None => Json(ApiPayload::erro(&QuoteError::PriceNotFound(
                state.smoke_epic.clone(),
            ))),
        },
        Err(e) => Json(ApiPayload::erro(&e)),
    }
}
