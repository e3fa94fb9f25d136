use image::imageops::FilterType;

use crate::config::EncoderOptions;
use crate::error::{Error, Result};
use crate::vector::Vector;

/// 把一张图片编码为定长向量
///
/// 同一个编码器输出的向量维度必须固定，不需要归一化
pub trait Encoder: Send + Sync {
    /// 编码图片的原始字节，无法解码时返回 [`Error::InvalidImage`]
    fn encode(&self, image: &[u8]) -> Result<Vector>;

    /// 输出向量的维度
    fn dimensionality(&self) -> usize;
}

/// 缩略图编码器
///
/// 将图片缩放为 `size x size` 的 RGB 缩略图，每个通道映射到 `[-0.5, 0.5]`，
/// 拼接为 `size * size * 3` 维的向量。
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailEncoder {
    size: u32,
}

impl ThumbnailEncoder {
    pub fn new(size: u32) -> Self {
        Self { size }
    }
}

impl From<&EncoderOptions> for ThumbnailEncoder {
    fn from(opts: &EncoderOptions) -> Self {
        Self::new(opts.thumbnail_size)
    }
}

impl Encoder for ThumbnailEncoder {
    fn encode(&self, image: &[u8]) -> Result<Vector> {
        if self.size == 0 {
            return Err(Error::EncoderFailure("缩略图尺寸不能为 0".to_string()));
        }
        let img = image::load_from_memory(image).map_err(|e| Error::InvalidImage(e.to_string()))?;
        let thumb = img.resize_exact(self.size, self.size, FilterType::Triangle).to_rgb8();
        Ok(thumb.as_raw().iter().map(|&c| c as f32 / 255. - 0.5).collect())
    }

    fn dimensionality(&self) -> usize {
        let size = self.size as usize;
        size * size * 3
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    fn png(color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(32, 24, Rgb(color));
        let mut buf = Cursor::new(vec![]);
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn output_has_fixed_dimensionality() {
        let encoder = ThumbnailEncoder::new(8);
        let v = encoder.encode(&png([255, 0, 0])).unwrap();
        assert_eq!(v.len(), encoder.dimensionality());
        assert_eq!(v.len(), 8 * 8 * 3);
        assert!((v[0] - 0.5).abs() < 0.01);
        assert!((v[1] + 0.5).abs() < 0.01);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn large_size_dimensionality_does_not_overflow() {
        assert_eq!(ThumbnailEncoder::new(40_000).dimensionality(), 4_800_000_000);
    }

    #[test]
    fn garbage_is_invalid_image() {
        let encoder = ThumbnailEncoder::new(8);
        assert!(matches!(encoder.encode(b"definitely not an image"), Err(Error::InvalidImage(_))));
    }

    #[test]
    fn zero_size_is_encoder_failure() {
        let encoder = ThumbnailEncoder::new(0);
        assert!(matches!(encoder.encode(&png([1, 2, 3])), Err(Error::EncoderFailure(_))));
    }
}
