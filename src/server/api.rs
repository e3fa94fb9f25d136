use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum_typed_multipart::TypedMultipart;
use log::{info, warn};
use tokio::task::block_in_place;
use utoipa::OpenApi;

use super::ApiDoc;
use super::error::Result;
use super::state::AppState;
use super::types::*;
use crate::matcher::MatchResult;
use crate::metrics;

/// 搜索与上传图片最相似的图片
#[utoipa::path(
    post,
    path = "/search",
    request_body(content = SearchForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = SearchResponse),
        (status = 400, description = "图片无法解码", body = ErrorResponse),
        (status = 503, description = "向量库未加载", body = ErrorResponse),
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    data: TypedMultipart<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let start = Instant::now();

    info!("正在搜索上传图片 ({} 字节)", data.file.len());

    let result = search(&state, &data.file);
    let elapsed = start.elapsed();

    let result = match result {
        Ok(result) => {
            metrics::inc_search_count("ok");
            metrics::observe_search_duration(elapsed.as_secs_f32());
            metrics::observe_best_score(result.score);
            result
        }
        Err(e) => {
            warn!("搜索失败: {}", e);
            metrics::inc_search_count(e.kind());
            return Err(e.into());
        }
    };

    let url = state.resolver.as_ref().map(|r| r.resolve(&result.identifier));
    Ok(Json(SearchResponse {
        percentage: result.percentage(),
        identifier: result.identifier,
        index: result.index,
        score: result.score,
        url,
        time: elapsed.as_millis() as u64,
    }))
}

fn search(state: &AppState, image: &[u8]) -> crate::Result<MatchResult> {
    // 未就绪时不必编码
    let engine = state.engine()?;
    let query = block_in_place(|| state.encoder.encode(image))?;
    engine.best_match(&query)
}

/// 服务状态
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ready: state.engine.is_some(),
        entries: state.engine.as_ref().map_or(0, |e| e.size()),
    })
}

/// Prometheus 指标
pub async fn metrics_handler() -> String {
    metrics::gather_text()
}

/// OpenAPI 文档
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
