use std::sync::Arc;

use anyhow::bail;
use clap::Parser;
use log::{error, info, warn};
use tokio::net::TcpListener;

use crate::cli::SubCommandExtend;
use crate::config::{EncoderOptions, Opts};
use crate::encoder::{Encoder, ThumbnailEncoder};
use crate::matcher::MatchEngine;
use crate::resolver::AssetResolver;
use crate::server;

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    #[command(flatten)]
    pub encoder: EncoderOptions,
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: String,
    /// 图片托管地址，设置后搜索结果中会附带图片 URL
    #[arg(long, value_name = "URL")]
    pub asset_base_url: Option<String>,
    /// 向量库加载失败时仍然启动服务，所有搜索请求返回 503
    #[arg(long)]
    pub allow_unready: bool,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let encoder = ThumbnailEncoder::from(&self.encoder);

        let engine = match MatchEngine::open(opts.store_prefix()) {
            Ok(engine) => Some(engine),
            Err(e) if self.allow_unready => {
                error!("{}", e);
                warn!("向量库未加载，服务以未就绪状态启动");
                None
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(engine) = &engine {
            if !engine.is_empty() && engine.dimensionality() != encoder.dimensionality() {
                bail!(
                    "编码器维度 {} 与向量库维度 {} 不一致",
                    encoder.dimensionality(),
                    engine.dimensionality()
                );
            }
        }

        let resolver = self.asset_base_url.clone().map(AssetResolver::new);

        // 创建应用状态
        let state = server::AppState::new(engine, Arc::new(encoder), resolver);

        // 创建应用
        let app = server::create_app(state);

        // 启动服务器
        info!("服务器启动：http://{}", &self.addr);
        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
