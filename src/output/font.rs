// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/font.rs - 点阵字模
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::Path;

use image::{ImageFormat, RgbImage};
use thiserror::Error;
use tracing::{debug, error};

/// 字模每行 16 个字符，共 6 行，从 ASCII 32 开始
pub const FONT_COLUMNS: u32 = 16;
pub const FONT_ROWS: u32 = 6;
const FIRST_GLYPH_ROW: u32 = 2;

#[derive(Error, Debug)]
pub enum FontError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字模图像解析失败: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("字模尺寸 {width}x{height} 无法按 16x6 切分")]
  InvalidLayout { width: u32, height: u32 },
}

#[derive(Debug, Clone)]
pub struct BitmapFont {
  sprite: RgbImage,
  glyph_w: u32,
  glyph_h: u32,
}

impl BitmapFont {
  pub fn from_sprite(sprite: RgbImage) -> Result<Self, FontError> {
    let (width, height) = sprite.dimensions();
    if width == 0 || height == 0 || width % FONT_COLUMNS != 0 || height % FONT_ROWS != 0 {
      error!("字模尺寸无效: {}x{}", width, height);
      return Err(FontError::InvalidLayout { width, height });
    }
    Ok(Self {
      sprite,
      glyph_w: width / FONT_COLUMNS,
      glyph_h: height / FONT_ROWS,
    })
  }

  /// 二进制 PPM (P6, maxval 255)
  pub fn from_ppm(bytes: &[u8]) -> Result<Self, FontError> {
    let sprite = image::load_from_memory_with_format(bytes, ImageFormat::Pnm)?.into_rgb8();
    Self::from_sprite(sprite)
  }

  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FontError> {
    let path = path.as_ref();
    debug!("加载字模文件: {}", path.display());
    let bytes = std::fs::read(path)?;
    Self::from_ppm(&bytes)
  }

  /// 单个字符的 (宽, 高)
  pub fn glyph_size(&self) -> (u32, u32) {
    (self.glyph_w, self.glyph_h)
  }

  /// 字符在字模中的左上角像素坐标，不可打印字符按空格处理
  pub fn glyph_origin(&self, c: char) -> (u32, u32) {
    let c = if (' '..='~').contains(&c) { c } else { ' ' };
    let code = c as u32;
    let fx = code % FONT_COLUMNS;
    let fy = code / FONT_COLUMNS - FIRST_GLYPH_ROW;
    (fx * self.glyph_w, fy * self.glyph_h)
  }

  /// 按原始字模尺寸拼出一行文字
  pub fn render_text(&self, text: &str) -> RgbImage {
    let origins: Vec<(u32, u32)> = text.chars().map(|c| self.glyph_origin(c)).collect();
    let width = self.glyph_w * origins.len() as u32;

    RgbImage::from_fn(width, self.glyph_h, |x, y| {
      let (ox, oy) = origins[(x / self.glyph_w) as usize];
      *self.sprite.get_pixel(ox + x % self.glyph_w, oy + y)
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  /// 每个字符格子填充为 (列, 行, 0)
  fn tagged_sprite(glyph_w: u32, glyph_h: u32) -> RgbImage {
    RgbImage::from_fn(glyph_w * FONT_COLUMNS, glyph_h * FONT_ROWS, |x, y| {
      Rgb([(x / glyph_w) as u8, (y / glyph_h) as u8, 0])
    })
  }

  #[test]
  fn glyph_lookup() {
    let font = BitmapFont::from_sprite(tagged_sprite(2, 3)).unwrap();
    assert_eq!(font.glyph_size(), (2, 3));
    assert_eq!(font.glyph_origin(' '), (0, 0));
    // 'A' = 65 -> 第 1 列, 第 2 行
    assert_eq!(font.glyph_origin('A'), (2, 6));
    assert_eq!(font.glyph_origin('~'), (28, 15));
    assert_eq!(font.glyph_origin('\n'), (0, 0));
    assert_eq!(font.glyph_origin('中'), (0, 0));
  }

  #[test]
  fn render_strip() {
    let font = BitmapFont::from_sprite(tagged_sprite(2, 3)).unwrap();
    let strip = font.render_text("A!");
    assert_eq!(strip.dimensions(), (4, 3));
    assert_eq!(strip.get_pixel(0, 0), &Rgb([1, 2, 0]));
    assert_eq!(strip.get_pixel(3, 2), &Rgb([1, 0, 0]));
    assert_eq!(font.render_text("").dimensions(), (0, 3));
  }

  #[test]
  fn parses_ppm() {
    let (w, h) = (16u32, 6u32);
    let mut bytes = format!("P6 {} {} 255\n", w, h).into_bytes();
    bytes.extend((0..w * h * 3).map(|i| (i % 251) as u8));
    let font = BitmapFont::from_ppm(&bytes).unwrap();
    assert_eq!(font.glyph_size(), (1, 1));

    assert!(matches!(
      BitmapFont::from_sprite(RgbImage::new(15, 6)),
      Err(FontError::InvalidLayout { .. })
    ));
    assert!(BitmapFont::from_ppm(b"P6 16 6 255\n").is_err());
  }
}
