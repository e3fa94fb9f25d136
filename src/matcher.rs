//! 穷举式最近邻匹配
//!
//! 库在启动时加载一次，此后只读，可以在多个请求之间通过 `Arc` 共享。
//! 每次查询都与全部 N 条向量计算内积，复杂度为 O(N·D)。

use std::path::Path;

use log::info;
use ndarray::{Array1, Array2};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::EmbeddingStore;
use crate::vector;

/// 一次匹配的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub identifier: String,
    pub index: usize,
    /// 余弦相似度，范围 [-1, 1]
    pub score: f32,
}

impl MatchResult {
    /// 以百分比显示的相似度
    pub fn percentage(&self) -> String {
        format!("{:.2}%", self.score * 100.)
    }
}

#[derive(Debug)]
pub struct MatchEngine {
    ids: Vec<String>,
    /// 已归一化的 `(N, D)` 矩阵
    matrix: Array2<f32>,
}

impl MatchEngine {
    /// 从向量库构建，所有向量会被（再次）归一化
    pub fn from_store(mut store: EmbeddingStore) -> Result<Self> {
        store.normalize_all()?;
        let (ids, matrix) = store.into_matrix()?;
        Ok(Self { ids, matrix })
    }

    /// 从 `<prefix>.npy` 与 `<prefix>.ids.json` 加载
    pub fn open(prefix: impl AsRef<Path>) -> Result<Self> {
        let prefix = prefix.as_ref();
        let unavailable =
            |e: Error| Error::StoreUnavailable { path: prefix.to_path_buf(), source: Box::new(e) };
        let store = EmbeddingStore::load(prefix).map_err(unavailable)?;
        let engine = Self::from_store(store).map_err(unavailable)?;
        info!("已加载 {} 条向量，维度 {}", engine.size(), engine.dimensionality());
        Ok(engine)
    }

    pub fn size(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// 向量维度，空库为 0
    pub fn dimensionality(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn identifier(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    /// 找到与查询最相似的一条记录
    ///
    /// 分数完全相同时返回索引最小的记录
    pub fn best_match(&self, query: &[f32]) -> Result<MatchResult> {
        let scores = self.scores(query)?;

        let mut best = 0;
        for (i, &score) in scores.iter().enumerate().skip(1) {
            if score > scores[best] {
                best = i;
            }
        }

        Ok(self.result(best, scores[best]))
    }

    /// 按分数从高到低返回前 `k` 条记录，同分时索引小的在前
    pub fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<MatchResult>> {
        let scores = self.scores(query)?;

        let mut order = (0..scores.len()).collect::<Vec<_>>();
        // 稳定排序，同分保持索引顺序
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(k);

        Ok(order.into_iter().map(|i| self.result(i, scores[i])).collect())
    }

    fn scores(&self, query: &[f32]) -> Result<Array1<f32>> {
        if self.is_empty() {
            return Err(Error::EmptyStore);
        }
        if query.len() != self.dimensionality() {
            return Err(Error::DimensionMismatch {
                expected: self.dimensionality(),
                actual: query.len(),
            });
        }
        let query = Array1::from(vector::normalize(query)?);
        // 逐行计算，相同的行一定得到相同的分数
        Ok(self.matrix.rows().into_iter().map(|row| row.dot(&query)).collect())
    }

    fn result(&self, index: usize, score: f32) -> MatchResult {
        MatchResult { identifier: self.ids[index].clone(), index, score }
    }
}
