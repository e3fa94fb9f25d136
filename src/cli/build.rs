use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use indicatif::ProgressBar;
use log::info;
use tokio::task::spawn_blocking;

use crate::builder::{DEFAULT_SUFFIX, StoreBuilder};
use crate::cli::SubCommandExtend;
use crate::config::{EncoderOptions, Opts};
use crate::encoder::ThumbnailEncoder;
use crate::error::Error;
use crate::utils::pb_style;

#[derive(Parser, Debug, Clone)]
pub struct BuildCommand {
    #[command(flatten)]
    pub encoder: EncoderOptions,
    /// 图片所在目录
    pub path: PathBuf,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    pub suffix: String,
    /// 同时扫描子目录，标识符为相对路径
    #[arg(short, long)]
    pub recursive: bool,
}

impl SubCommandExtend for BuildCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let prefix = opts.store_prefix();
        let encoder = ThumbnailEncoder::from(&self.encoder);
        let builder = StoreBuilder::new(encoder)
            .suffix(&self.suffix)
            .recursive(self.recursive)
            .progress(ProgressBar::no_length().with_style(pb_style()));
        let path = self.path.clone();

        let report = spawn_blocking(move || builder.build_and_save(path, prefix)).await??;

        for failure in &report.failed {
            println!("[ERR] {}: {}", failure.identifier, failure.reason);
        }
        println!(
            "成功 {}，失败 {}，重复内容 {}",
            report.succeeded,
            report.failed.len(),
            report.duplicate_content
        );
        if report.is_empty() {
            bail!(Error::EmptyStore);
        }
        info!("向量库构建完成: {}", opts.store_prefix().display());
        Ok(())
    }
}
