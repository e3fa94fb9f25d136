use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use ndarray::Array2;
use ndarray_npy::{read_npy, write_npy};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vector::{self, Vector};

/// 一条 (标识符, 向量) 记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEntry {
    pub identifier: String,
    pub vector: Vector,
}

/// 有序的向量库
///
/// 标识符与向量一一对应，位置即为索引，保存后重新加载时顺序不变。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingStore {
    entries: Vec<StoreEntry>,
}

impl EmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    /// 追加一条记录，不检查维度，维度由 [`Self::finalize`] 统一检查
    pub fn append(&mut self, identifier: impl Into<String>, vector: Vector) {
        self.entries.push(StoreEntry { identifier: identifier.into(), vector });
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 向量维度，空库返回 [`Error::EmptyStore`]
    pub fn dimensionality(&self) -> Result<usize> {
        self.entries.first().map(|e| e.vector.len()).ok_or(Error::EmptyStore)
    }

    pub fn entries(&self) -> &[StoreEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&StoreEntry> {
        self.entries.get(index)
    }

    pub fn identifier(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| e.identifier.as_str())
    }

    /// 检查所有向量维度一致
    ///
    /// 重复的标识符只会输出警告
    pub fn finalize(&self) -> Result<()> {
        self.check_dimensions()?;
        for (identifier, count) in self.duplicate_identifiers() {
            warn!("标识符重复 {} 次: {}", count, identifier);
        }
        Ok(())
    }

    fn check_dimensions(&self) -> Result<()> {
        if let Some(first) = self.entries.first() {
            let expected = first.vector.len();
            for (index, entry) in self.entries.iter().enumerate() {
                if entry.vector.len() != expected {
                    return Err(Error::InconsistentDimension {
                        index,
                        expected,
                        actual: entry.vector.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// 返回出现多于一次的标识符及其次数，按标识符排序
    pub fn duplicate_identifiers(&self) -> Vec<(&str, usize)> {
        let mut counter = HashMap::new();
        for entry in &self.entries {
            *counter.entry(entry.identifier.as_str()).or_insert(0usize) += 1;
        }
        let mut duplicates =
            counter.into_iter().filter(|&(_, count)| count > 1).collect::<Vec<_>>();
        duplicates.sort_unstable();
        duplicates
    }

    /// 归一化所有向量
    ///
    /// 只要有一条向量无法归一化就返回错误，此时库内容不会被修改
    pub fn normalize_all(&mut self) -> Result<()> {
        for entry in &self.entries {
            vector::ensure_normalizable(&entry.vector).inspect_err(|_| {
                warn!("无法归一化: {}", entry.identifier);
            })?;
        }
        for entry in &mut self.entries {
            vector::normalize_in_place(&mut entry.vector)?;
        }
        Ok(())
    }

    /// 保存到 `<prefix>.npy` 与 `<prefix>.ids.json`
    ///
    /// 先写入临时文件再重命名。标识符文件记录矩阵的校验和，
    /// 两次重命名之间中断时，加载会发现两个文件不属于同一次保存
    pub fn save(&self, prefix: impl AsRef<Path>) -> Result<()> {
        let prefix = prefix.as_ref();
        self.check_dimensions()?;
        let (n, d) = (self.size(), self.dimensionality()?);

        let matrix = Array2::from_shape_fn((n, d), |(i, j)| self.entries[i].vector[j]);
        let ids = IdsFile::Checked {
            checksum: checksum(&matrix),
            ids: self.entries.iter().map(|e| e.identifier.clone()).collect(),
        };

        if let Some(parent) = prefix.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let (npy, npy_tmp) = (npy_path(prefix), with_suffix(prefix, ".npy.tmp"));
        let (json, json_tmp) = (ids_path(prefix), with_suffix(prefix, ".ids.json.tmp"));

        write_npy(&npy_tmp, &matrix)?;
        let mut writer = BufWriter::new(File::create(&json_tmp)?);
        serde_json::to_writer(&mut writer, &ids)?;
        writer.flush()?;
        drop(writer);

        std::fs::rename(&npy_tmp, &npy)?;
        std::fs::rename(&json_tmp, &json)?;

        info!("已保存 {} 条向量 (维度 {}) 到 {}", n, d, npy.display());
        Ok(())
    }

    /// 从 `<prefix>.npy` 与 `<prefix>.ids.json` 加载
    pub fn load(prefix: impl AsRef<Path>) -> Result<Self> {
        let prefix = prefix.as_ref();
        debug!("正在读取向量库: {}", prefix.display());

        let matrix: Array2<f32> = read_npy(npy_path(prefix))?;
        let ids: IdsFile =
            serde_json::from_reader(BufReader::new(File::open(ids_path(prefix))?))?;

        let (ids, expected) = match ids {
            IdsFile::Checked { checksum, ids } => (ids, Some(checksum)),
            IdsFile::Plain(ids) => (ids, None),
        };
        if ids.len() != matrix.nrows() {
            return Err(Error::PairingMismatch { ids: ids.len(), vectors: matrix.nrows() });
        }
        if expected.is_some_and(|expected| expected != checksum(&matrix)) {
            return Err(Error::ChecksumMismatch(prefix.to_path_buf()));
        }

        let entries = ids
            .into_iter()
            .zip(matrix.rows())
            .map(|(identifier, row)| StoreEntry { identifier, vector: row.to_vec() })
            .collect();

        Ok(Self { entries })
    }

    /// 转换为标识符列表与 `(N, D)` 的连续矩阵
    pub fn into_matrix(self) -> Result<(Vec<String>, Array2<f32>)> {
        self.finalize()?;
        let d = self.dimensionality().unwrap_or(0);
        let n = self.size();
        let mut ids = Vec::with_capacity(n);
        let mut data = Vec::with_capacity(n * d);
        for entry in self.entries {
            ids.push(entry.identifier);
            data.extend(entry.vector);
        }
        let matrix = Array2::from_shape_vec((n, d), data)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        Ok((ids, matrix))
    }
}

/// `<prefix>.ids.json` 的内容
///
/// 其他工具生成的库可以只有标识符数组，此时不校验矩阵
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum IdsFile {
    Checked { checksum: String, ids: Vec<String> },
    Plain(Vec<String>),
}

/// 矩阵按行优先、小端序排列后的 blake3 值
fn checksum(matrix: &Array2<f32>) -> String {
    let mut hasher = blake3::Hasher::new();
    for x in matrix.iter() {
        hasher.update(&x.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// 向量矩阵文件路径
pub fn npy_path(prefix: impl AsRef<Path>) -> PathBuf {
    with_suffix(prefix.as_ref(), ".npy")
}

/// 标识符列表文件路径
pub fn ids_path(prefix: impl AsRef<Path>) -> PathBuf {
    with_suffix(prefix.as_ref(), ".ids.json")
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(prefix.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}
