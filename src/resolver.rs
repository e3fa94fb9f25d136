use std::time::{SystemTime, UNIX_EPOCH};

/// 把匹配到的标识符转换为图片 URL
///
/// URL 末尾带有 `nocache` 参数，避免浏览器或 CDN 返回旧的缓存
#[derive(Debug, Clone)]
pub struct AssetResolver {
    base_url: String,
}

impl AssetResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 使用当前时间（毫秒）作为 `nocache` 参数
    pub fn resolve(&self, identifier: &str) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        self.resolve_at(identifier, millis)
    }

    /// 空标识符会得到一个指向目录本身的 URL，由调用方自行检查
    pub fn resolve_at(&self, identifier: &str, millis: u128) -> String {
        format!("{}/{}?nocache={}", self.base_url, urlencoding::encode(identifier), millis)
    }
}
