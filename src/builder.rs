use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indicatif::{ParallelProgressIterator, ProgressBar};
use log::{info, warn};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use walkdir::WalkDir;

use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::store::EmbeddingStore;
use crate::vector::{self, Vector};

/// 默认扫描的图片后缀
pub const DEFAULT_SUFFIX: &str = "jpg,jpeg,png,webp";

/// 待编码的图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// 相对于图片目录的路径，使用 `/` 分隔
    pub identifier: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildFailure {
    pub identifier: String,
    pub kind: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub succeeded: usize,
    pub failed: Vec<BuildFailure>,
    /// 内容与之前某张图片完全相同的图片数量
    pub duplicate_content: usize,
}

impl BuildReport {
    /// 没有任何图片编码成功
    pub fn is_empty(&self) -> bool {
        self.succeeded == 0
    }
}

/// 从图片目录生成向量库
///
/// 单张图片失败只会记录并跳过，不会中断整个批次
pub struct StoreBuilder<E> {
    encoder: E,
    suffix: Regex,
    recursive: bool,
    pb: ProgressBar,
}

impl<E: Encoder> StoreBuilder<E> {
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            suffix: suffix_regex(DEFAULT_SUFFIX),
            recursive: false,
            pb: ProgressBar::hidden(),
        }
    }

    /// 扫描的文件后缀名，多个后缀用逗号分隔，不区分大小写
    pub fn suffix(mut self, suffix: &str) -> Self {
        self.suffix = suffix_regex(suffix);
        self
    }

    /// 是否扫描子目录
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn progress(mut self, pb: ProgressBar) -> Self {
        self.pb = pb;
        self
    }

    /// 列出目录中符合后缀的图片，按标识符字典序排列
    pub fn scan(&self, dir: impl AsRef<Path>) -> Result<Vec<SourceImage>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::SourceMissing(dir.to_path_buf()));
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut images = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("扫描失败: {}", e);
                    None
                }
            })
            .filter(|entry| {
                let path = entry.path();
                path.is_file()
                    && path.extension().is_some_and(|ext| self.suffix.is_match(&ext.to_string_lossy()))
            })
            .map(|entry| SourceImage {
                identifier: identifier_of(dir, entry.path()),
                path: entry.into_path(),
            })
            .collect::<Vec<_>>();
        images.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        if images.is_empty() {
            return Err(Error::NoEligibleImages(dir.to_path_buf()));
        }
        Ok(images)
    }

    /// 编码目录中所有图片并归一化
    ///
    /// 只有目录不存在或没有可用图片时才会失败，全部图片编码失败时返回空库，
    /// 失败原因记录在 [`BuildReport`] 中
    pub fn build(&self, dir: impl AsRef<Path>) -> Result<(EmbeddingStore, BuildReport)> {
        let dir = dir.as_ref();
        info!("开始扫描目录: {}", dir.display());
        let images = self.scan(dir)?;
        info!("扫描完成，共 {} 张图片", images.len());

        self.pb.set_length(images.len() as u64);
        let encoded = images
            .par_iter()
            .progress_with(self.pb.clone())
            .map(|image| self.encode_file(&image.path))
            .collect::<Vec<_>>();
        self.pb.finish_and_clear();

        let mut store = EmbeddingStore::with_capacity(images.len());
        let mut report = BuildReport::default();
        let mut seen = HashMap::new();
        let mut dimensionality = None;

        for (image, result) in images.into_iter().zip(encoded) {
            let result = match (result, dimensionality) {
                (Ok((_, v)), Some(expected)) if v.len() != expected => {
                    Err(Error::DimensionMismatch { expected, actual: v.len() })
                }
                (result, _) => result,
            };
            match result {
                Ok((hash, v)) => {
                    dimensionality.get_or_insert(v.len());
                    match seen.get(&hash) {
                        Some(first) => {
                            warn!("图片内容与 {} 相同: {}", first, image.identifier);
                            report.duplicate_content += 1;
                        }
                        None => {
                            seen.insert(hash, image.identifier.clone());
                        }
                    }
                    store.append(image.identifier, v);
                    report.succeeded += 1;
                }
                Err(e) => {
                    warn!("跳过图片 {}: {}", image.identifier, e);
                    report.failed.push(BuildFailure {
                        identifier: image.identifier,
                        kind: e.kind(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!("编码完成: 成功 {}，失败 {}", report.succeeded, report.failed.len());

        store.normalize_all()?;
        store.finalize()?;
        Ok((store, report))
    }

    /// 生成向量库并保存到 `prefix`
    ///
    /// 没有任何图片编码成功时不会写入文件，调用方需要检查 [`BuildReport::is_empty`]
    pub fn build_and_save(
        &self,
        dir: impl AsRef<Path>,
        prefix: impl AsRef<Path>,
    ) -> Result<BuildReport> {
        let (store, report) = self.build(dir)?;
        if store.is_empty() {
            warn!("没有图片编码成功，未保存向量库");
        } else {
            store.save(prefix)?;
        }
        Ok(report)
    }

    fn encode_file(&self, path: &Path) -> Result<(blake3::Hash, Vector)> {
        let data = std::fs::read(path)?;
        let hash = blake3::hash(&data);
        let v = self.encoder.encode(&data)?;
        vector::ensure_normalizable(&v)?;
        Ok((hash, v))
    }
}

fn suffix_regex(suffix: &str) -> Regex {
    let alternatives = suffix
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| regex::escape(s.trim_start_matches('.')))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)^({})$", alternatives)).expect("failed to build regex")
}

fn identifier_of(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
