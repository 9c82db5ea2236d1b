// 该文件是 Shanan （山南西风） 项目的一部分。
// src/preprocess.rs - letterbox 缩放与网络输入构造
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

use image::{RgbImage, imageops::FilterType};
use thiserror::Error;
use tracing::debug;

const RGB_CHANNELS: usize = 3;

#[derive(Error, Debug)]
pub enum PreprocessError {
  #[error("图像尺寸无效: {width}x{height}")]
  InvalidSize { width: u32, height: u32 },
  #[error("图像尺寸不匹配: 期望 {expected_w}x{expected_h}, 实际 {actual_w}x{actual_h}")]
  SizeMismatch {
    expected_w: u32,
    expected_h: u32,
    actual_w: u32,
    actual_h: u32,
  },
}

/// 原图到网络输入的映射关系
///
/// 保持宽高比时 `ratio_x == ratio_y`，并且只在较短的一侧居中填充。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeInfo {
  pub original_width: u32,
  pub original_height: u32,
  pub network_width: u32,
  pub network_height: u32,
  pub ratio_x: f32,
  pub ratio_y: f32,
  pub pad_x: u32,
  pub pad_y: u32,
  pub keep_aspect_ratio: bool,
  /// 缩放后（填充前）的图像尺寸
  pub resized_width: u32,
  pub resized_height: u32,
}

impl ResizeInfo {
  pub fn new(
    original_width: u32,
    original_height: u32,
    network_width: u32,
    network_height: u32,
    keep_aspect_ratio: bool,
  ) -> Result<Self, PreprocessError> {
    for (width, height) in [
      (original_width, original_height),
      (network_width, network_height),
    ] {
      if width == 0 || height == 0 {
        return Err(PreprocessError::InvalidSize { width, height });
      }
    }

    let mut info = Self {
      original_width,
      original_height,
      network_width,
      network_height,
      ratio_x: network_width as f32 / original_width as f32,
      ratio_y: network_height as f32 / original_height as f32,
      pad_x: 0,
      pad_y: 0,
      keep_aspect_ratio,
      resized_width: network_width,
      resized_height: network_height,
    };

    if keep_aspect_ratio {
      if info.ratio_x < info.ratio_y {
        info.resized_height = ((original_height as f32 * info.ratio_x) as u32).min(network_height);
        info.pad_y = (network_height - info.resized_height) / 2;
        info.ratio_y = info.ratio_x;
      } else {
        info.resized_width = ((original_width as f32 * info.ratio_y) as u32).min(network_width);
        info.pad_x = (network_width - info.resized_width) / 2;
        info.ratio_x = info.ratio_y;
      }
    }

    debug!(
      "letterbox: {}x{} -> {}x{}, 比例 ({:.4}, {:.4}), 填充 ({}, {})",
      original_width,
      original_height,
      info.resized_width,
      info.resized_height,
      info.ratio_x,
      info.ratio_y,
      info.pad_x,
      info.pad_y
    );

    Ok(info)
  }

  /// 原图坐标 -> 网络输入坐标，`(x, y, w, h)`
  pub fn forward(&self, x: f32, y: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    (
      x * self.ratio_x + self.pad_x as f32,
      y * self.ratio_y + self.pad_y as f32,
      w * self.ratio_x,
      h * self.ratio_y,
    )
  }
}

/// 按 `info` 缩放图像并写入零填充的 CHW 浮点输入，像素值归一化到 [0, 1]
pub fn letterbox_chw(image: &RgbImage, info: &ResizeInfo) -> Result<Vec<f32>, PreprocessError> {
  let (actual_w, actual_h) = image.dimensions();
  if (actual_w, actual_h) != (info.original_width, info.original_height) {
    return Err(PreprocessError::SizeMismatch {
      expected_w: info.original_width,
      expected_h: info.original_height,
      actual_w,
      actual_h,
    });
  }

  let resized = image::imageops::resize(
    image,
    info.resized_width,
    info.resized_height,
    FilterType::Triangle,
  );

  let net_w = info.network_width as usize;
  let net_area = net_w * info.network_height as usize;
  let mut input = vec![0.0f32; RGB_CHANNELS * net_area];

  for (x, y, pixel) in resized.enumerate_pixels() {
    let offset = (y + info.pad_y) as usize * net_w + (x + info.pad_x) as usize;
    for c in 0..RGB_CHANNELS {
      input[c * net_area + offset] = pixel[c] as f32 / 255.0;
    }
  }

  Ok(input)
}
