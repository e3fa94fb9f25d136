#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use lookalike::{Encoder, Error, Result};

/// 把 `"1,0.5,-2"` 形式的文本解析为向量，用于替代真实的编码器
pub struct TextEncoder(pub usize);

impl Encoder for TextEncoder {
    fn encode(&self, image: &[u8]) -> Result<Vec<f32>> {
        let text = std::str::from_utf8(image).map_err(|e| Error::InvalidImage(e.to_string()))?;
        text.trim()
            .split(',')
            .map(|s| s.trim().parse::<f32>().map_err(|e| Error::InvalidImage(e.to_string())))
            .collect()
    }

    fn dimensionality(&self) -> usize {
        self.0
    }
}

/// 任何输入都返回 [`Error::EncoderFailure`]，模拟模型内部错误
pub struct BrokenEncoder(pub usize);

impl Encoder for BrokenEncoder {
    fn encode(&self, _image: &[u8]) -> Result<Vec<f32>> {
        Err(Error::EncoderFailure("model crashed".to_string()))
    }

    fn dimensionality(&self) -> usize {
        self.0
    }
}

/// 生成一张带有渐变与色块的 PNG，`seed` 不同则内容不同
pub fn png_bytes(seed: u8) -> Vec<u8> {
    let img = RgbImage::from_fn(48, 48, |x, y| {
        let block = ((x / 12 + y / 12) as u8).wrapping_mul(seed.wrapping_add(17));
        Rgb([
            (x as u8).wrapping_mul(5).wrapping_add(seed.wrapping_mul(40)),
            (y as u8).wrapping_mul(5).wrapping_add(seed.wrapping_mul(90)),
            block,
        ])
    });
    let mut buf = Cursor::new(vec![]);
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

pub fn write_png(path: impl AsRef<Path>, seed: u8) {
    std::fs::write(path, png_bytes(seed)).unwrap();
}
