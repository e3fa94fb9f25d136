use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::debug;
use tokio::task::block_in_place;

use crate::cli::SubCommandExtend;
use crate::config::{EncoderOptions, Opts, SearchOptions};
use crate::encoder::{Encoder, ThumbnailEncoder};
use crate::matcher::{MatchEngine, MatchResult};

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub encoder: EncoderOptions,
    #[command(flatten)]
    pub search: SearchOptions,
    /// 被搜索的图片路径
    pub image: PathBuf,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let engine = MatchEngine::open(opts.store_prefix())?;
        let data = tokio::fs::read(&self.image)
            .await
            .with_context(|| format!("无法读取图片: {}", self.image.display()))?;

        let encoder = ThumbnailEncoder::from(&self.encoder);
        let query = block_in_place(|| encoder.encode(&data))?;
        debug!("查询向量维度: {}", query.len());

        let result = engine.top_k(&query, self.search.count)?;
        print_result(&result, self)
    }
}

fn print_result(result: &[MatchResult], opts: &SearchCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?)
        }
        OutputFormat::Table => {
            for r in result {
                println!("{}\t{}\t{}", r.percentage(), r.index, r.identifier);
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}
