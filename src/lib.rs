//! 以图搜图：在预先计算好的向量库中找到与查询图片最相似的一张
//!
//! - [`builder`]：扫描图片目录，编码并保存向量库
//! - [`store`]：有序的 (标识符, 向量) 集合及其持久化
//! - [`matcher`]：加载向量库并回答最近邻查询
//! - [`resolver`]：把标识符转换为图片 URL

pub mod builder;
pub mod cli;
pub mod config;
pub mod encoder;
pub mod error;
pub mod matcher;
mod metrics;
pub mod resolver;
pub mod server;
pub mod store;
pub mod utils;
pub mod vector;

pub use builder::{BuildReport, StoreBuilder};
pub use config::Opts;
pub use encoder::{Encoder, ThumbnailEncoder};
pub use error::{Error, Result};
pub use matcher::{MatchEngine, MatchResult};
pub use resolver::AssetResolver;
pub use store::{EmbeddingStore, StoreEntry};
