use std::path::PathBuf;

use ndarray_npy::{ReadNpyError, WriteNpyError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 向量模长为 0 或不是有限值，无法归一化
    #[error("无法归一化退化向量（模长为 {norm}）")]
    DegenerateVector { norm: f32 },

    #[error("向量维度不一致: 期望 {expected}，实际 {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 同一个库中第 `index` 条向量的维度与前面的向量不同
    #[error("第 {index} 条向量维度为 {actual}，与库维度 {expected} 不一致")]
    InconsistentDimension { index: usize, expected: usize, actual: usize },

    #[error("向量库为空")]
    EmptyStore,

    #[error("无法加载向量库 {}: {source}", .path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("服务尚未就绪，向量库未加载")]
    ServiceNotReady,

    #[error("编码器错误: {0}")]
    EncoderFailure(String),

    #[error("无效图片: {0}")]
    InvalidImage(String),

    #[error("标识符数量 {ids} 与向量数量 {vectors} 不一致")]
    PairingMismatch { ids: usize, vectors: usize },

    #[error("向量文件与标识符列表不属于同一次保存: {}", .0.display())]
    ChecksumMismatch(PathBuf),

    #[error("图片目录不存在: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("目录中没有可用的图片: {}", .0.display())]
    NoEligibleImages(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ReadNpy(#[from] ReadNpyError),

    #[error(transparent)]
    WriteNpy(#[from] WriteNpyError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 稳定的错误类型标签，用于 HTTP 响应
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DegenerateVector { .. } => "degenerate_vector",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::InconsistentDimension { .. } => "inconsistent_dimension",
            Self::EmptyStore => "empty_store",
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::ServiceNotReady => "service_not_ready",
            Self::EncoderFailure(_) => "encoder_failure",
            Self::InvalidImage(_) => "invalid_image",
            Self::PairingMismatch { .. } => "pairing_mismatch",
            Self::ChecksumMismatch(_) => "checksum_mismatch",
            Self::SourceMissing(_) => "source_missing",
            Self::NoEligibleImages(_) => "no_eligible_images",
            Self::Io(_) | Self::ReadNpy(_) | Self::WriteNpy(_) | Self::Json(_) => "io",
        }
    }
}
