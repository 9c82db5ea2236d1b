// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/canvas.rs - 可写的 RGB 像素缓冲区
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

use image::RgbImage;
use thiserror::Error;

const RGB_CHANNELS: usize = 3;

#[derive(Error, Debug)]
pub enum CanvasError {
  #[error("像素缓冲区长度不匹配: {width}x{height}x3 应为 {expected}, 实际 {actual}")]
  LengthMismatch {
    width: u32,
    height: u32,
    expected: usize,
    actual: usize,
  },
  #[error("画布尺寸不匹配: 期望 {expected_w}x{expected_h}, 实际 {actual_w}x{actual_h}")]
  SizeMismatch {
    expected_w: u32,
    expected_h: u32,
    actual_w: u32,
    actual_h: u32,
  },
}

/// 行优先、每像素 3 字节的 RGB 缓冲区，所有写入都裁剪到画布范围内
#[derive(Debug)]
pub struct RgbCanvas<'a> {
  data: &'a mut [u8],
  width: u32,
  height: u32,
}

impl<'a> RgbCanvas<'a> {
  pub fn new(data: &'a mut [u8], width: u32, height: u32) -> Result<Self, CanvasError> {
    let expected = width as usize * height as usize * RGB_CHANNELS;
    if data.len() != expected {
      return Err(CanvasError::LengthMismatch {
        width,
        height,
        expected,
        actual: data.len(),
      });
    }
    Ok(Self {
      data,
      width,
      height,
    })
  }

  pub fn from_image(image: &'a mut RgbImage) -> Self {
    let (width, height) = image.dimensions();
    let data: &'a mut [u8] = image;
    Self {
      data,
      width,
      height,
    }
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn dimensions(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  pub fn ensure_size(&self, width: u32, height: u32) -> Result<(), CanvasError> {
    if (self.width, self.height) != (width, height) {
      return Err(CanvasError::SizeMismatch {
        expected_w: width,
        expected_h: height,
        actual_w: self.width,
        actual_h: self.height,
      });
    }
    Ok(())
  }

  pub fn as_bytes(&self) -> &[u8] {
    self.data
  }

  #[inline]
  fn offset(&self, x: i64, y: i64) -> Option<usize> {
    if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
      return None;
    }
    Some((y as usize * self.width as usize + x as usize) * RGB_CHANNELS)
  }

  pub fn pixel(&self, x: i64, y: i64) -> Option<[u8; 3]> {
    let offset = self.offset(x, y)?;
    let mut rgb = [0u8; 3];
    rgb.copy_from_slice(&self.data[offset..offset + RGB_CHANNELS]);
    Some(rgb)
  }

  /// 越界时忽略，返回是否写入
  #[inline]
  pub fn put_pixel(&mut self, x: i64, y: i64, color: [u8; 3]) -> bool {
    match self.offset(x, y) {
      Some(offset) => {
        self.data[offset..offset + RGB_CHANNELS].copy_from_slice(&color);
        true
      }
      None => false,
    }
  }

  /// 不透明拷贝 `image` 到 `(x, y)`，超出画布的部分被裁掉
  pub fn blit(&mut self, image: &RgbImage, x: i64, y: i64) {
    let (src_w, src_h) = image.dimensions();
    let x0 = x.max(0);
    let x1 = (x + src_w as i64).min(self.width as i64);
    if x0 >= x1 {
      return;
    }
    let row_bytes = (x1 - x0) as usize * RGB_CHANNELS;
    let src_stride = src_w as usize * RGB_CHANNELS;
    let src: &[u8] = image;

    for row in 0..src_h as i64 {
      let Some(dst) = self.offset(x0, y + row) else {
        continue;
      };
      let src_offset = row as usize * src_stride + (x0 - x) as usize * RGB_CHANNELS;
      self.data[dst..dst + row_bytes].copy_from_slice(&src[src_offset..src_offset + row_bytes]);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn rejects_wrong_length() {
    let mut data = vec![0u8; 10];
    assert!(matches!(
      RgbCanvas::new(&mut data, 2, 2),
      Err(CanvasError::LengthMismatch { expected: 12, .. })
    ));
  }

  #[test]
  fn put_pixel_clips() {
    let mut data = vec![0u8; 2 * 2 * 3];
    let mut canvas = RgbCanvas::new(&mut data, 2, 2).unwrap();
    assert!(canvas.put_pixel(1, 1, [1, 2, 3]));
    assert!(!canvas.put_pixel(2, 0, [9, 9, 9]));
    assert!(!canvas.put_pixel(-1, 0, [9, 9, 9]));
    assert_eq!(canvas.pixel(1, 1), Some([1, 2, 3]));
    assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0]));
    assert_eq!(data[9..12], [1, 2, 3]);
  }

  #[test]
  fn blit_clips_right_and_bottom() {
    let mut image = RgbImage::new(4, 4);
    let mut canvas = RgbCanvas::from_image(&mut image);
    let patch = RgbImage::from_pixel(3, 3, Rgb([7, 7, 7]));
    canvas.blit(&patch, 2, 2);
    canvas.blit(&patch, -2, -2);

    assert_eq!(canvas.pixel(3, 3), Some([7, 7, 7]));
    assert_eq!(canvas.pixel(2, 2), Some([7, 7, 7]));
    assert_eq!(canvas.pixel(0, 0), Some([7, 7, 7]));
    assert_eq!(canvas.pixel(1, 0), Some([0, 0, 0]));
    assert_eq!(canvas.pixel(1, 2), Some([0, 0, 0]));
  }
}
