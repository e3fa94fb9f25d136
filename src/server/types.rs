use axum::body::Bytes;
use axum_typed_multipart::TryFromMultipart;
use serde::Serialize;
use utoipa::ToSchema;

/// 搜索请求参数
#[derive(TryFromMultipart)]
pub struct SearchRequest {
    pub file: Bytes,
}

/// 搜索表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct SearchForm {
    /// 上传的图片文件
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// 搜索响应
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// 最相似图片的标识符
    pub identifier: String,
    /// 在向量库中的位置
    pub index: usize,
    /// 余弦相似度，范围 [-1, 1]
    pub score: f32,
    /// 百分比形式的相似度，如 `87.65%`
    pub percentage: String,
    /// 图片地址，仅在配置了 `--asset-base-url` 时返回
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// 搜索耗时，单位为毫秒
    pub time: u64,
}

/// 服务状态
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// 向量库是否已加载
    pub ready: bool,
    /// 向量库中的记录数量
    pub entries: usize,
}

/// 错误响应
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// 错误类型，如 `service_not_ready`、`invalid_image`
    pub error: String,
    pub message: String,
}
