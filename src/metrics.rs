use std::sync::LazyLock;

use prometheus::*;

static METRIC_SEARCH_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "lookalike_search_count",
        "count of the search requests by outcome",
        &["outcome"]
    )
    .unwrap()
});

static METRIC_SEARCH_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "lookalike_search_duration",
        "duration of the per-image encode and match in seconds"
    )
    .unwrap()
});

static METRIC_SEARCH_BEST_SCORE: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "lookalike_search_best_score",
        "best match score of the per-image search in percent",
        (5..=100).step_by(5).map(|x| x as f64).collect()
    )
    .unwrap()
});

/// 记录一次搜索请求，`outcome` 为 `ok` 或错误类型
pub fn inc_search_count(outcome: &str) {
    METRIC_SEARCH_COUNT.with_label_values(&[outcome]).inc();
}

pub fn observe_search_duration(duration: f32) {
    METRIC_SEARCH_DURATION.observe(duration as f64);
}

/// `score` 为 [-1, 1] 的相似度，按百分比记录
pub fn observe_best_score(score: f32) {
    METRIC_SEARCH_BEST_SCORE.observe(score as f64 * 100.);
}

/// 以文本格式导出所有指标
pub fn gather_text() -> String {
    TextEncoder::new().encode_to_string(&prometheus::gather()).unwrap_or_default()
}
