//! 向量的基本运算
//!
//! 库中与查询时的向量都必须经过同一套归一化，余弦相似度才能退化为内积。

use crate::error::{Error, Result};

pub type Vector = Vec<f32>;

/// 欧几里得模长
pub fn norm(v: &[f32]) -> f32 {
    norm_f64(v) as f32
}

// 在 f64 中累加，f32 的平方和对很大或很小的分量会溢出或下溢
fn norm_f64(v: &[f32]) -> f64 {
    v.iter().map(|&x| x as f64 * x as f64).sum::<f64>().sqrt()
}

/// 检查向量能否归一化，模长为 0 或非有限值时返回 [`Error::DegenerateVector`]
pub fn ensure_normalizable(v: &[f32]) -> Result<()> {
    checked_norm(v).map(|_| ())
}

fn checked_norm(v: &[f32]) -> Result<f64> {
    let n = norm_f64(v);
    if n == 0. || !n.is_finite() {
        return Err(Error::DegenerateVector { norm: n as f32 });
    }
    Ok(n)
}

/// 返回 `v / |v|`
///
/// 模长为 0 或非有限值时返回 [`Error::DegenerateVector`]，而不是产生 NaN。
pub fn normalize(v: &[f32]) -> Result<Vector> {
    let mut v = v.to_vec();
    normalize_in_place(&mut v)?;
    Ok(v)
}

/// 原地归一化，失败时 `v` 保持不变
pub fn normalize_in_place(v: &mut [f32]) -> Result<()> {
    let n = checked_norm(v)?;
    v.iter_mut().for_each(|x| *x = (*x as f64 / n) as f32);
    Ok(())
}

/// 内积，两个向量长度必须相同
pub fn dot(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch { expected: a.len(), actual: b.len() });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}
