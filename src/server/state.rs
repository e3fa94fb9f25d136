use std::sync::Arc;

use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::matcher::MatchEngine;
use crate::resolver::AssetResolver;

/// 应用状态
///
/// 启动后不再修改，所有请求共享
pub struct AppState {
    /// 向量库，加载失败且允许未就绪启动时为 `None`
    pub engine: Option<MatchEngine>,
    /// 图片编码器
    pub encoder: Arc<dyn Encoder>,
    /// 图片地址生成器
    pub resolver: Option<AssetResolver>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(
        engine: Option<MatchEngine>,
        encoder: Arc<dyn Encoder>,
        resolver: Option<AssetResolver>,
    ) -> Arc<Self> {
        Arc::new(AppState { engine, encoder, resolver })
    }

    pub fn engine(&self) -> Result<&MatchEngine> {
        self.engine.as_ref().ok_or(Error::ServiceNotReady)
    }
}
