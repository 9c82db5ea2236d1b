// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/draw.rs - 检测框与标签绘制
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

use std::sync::Arc;

use image::imageops::{self, FilterType};

use crate::{
  label::{LabelError, LabelResolver},
  model::{DetectResult, Detection, YOLOV5_LABEL_SCALE},
  output::{canvas::RgbCanvas, font::BitmapFont},
};

/// 边框颜色表，按 `class_id % 25` 取色
pub const PALETTE: [[u8; 3]; 25] = [
  [255, 0, 0],
  [255, 85, 0],
  [255, 170, 0],
  [255, 255, 0],
  [170, 255, 0],
  [85, 255, 0],
  [0, 255, 0],
  [0, 255, 85],
  [0, 255, 170],
  [0, 255, 255],
  [0, 170, 255],
  [0, 85, 255],
  [0, 0, 255],
  [85, 0, 255],
  [170, 0, 255],
  [255, 0, 255],
  [255, 0, 170],
  [255, 0, 85],
  [255, 0, 0],
  [255, 0, 255],
  [255, 85, 255],
  [255, 170, 255],
  [255, 255, 255],
  [170, 255, 255],
  [85, 255, 255],
];

pub fn class_color(class_id: u32) -> [u8; 3] {
  PALETTE[class_id as usize % PALETTE.len()]
}

#[derive(Debug, Clone)]
pub struct Draw {
  font: Arc<BitmapFont>,
  label_scale: f32,
}

impl Draw {
  pub fn new(font: Arc<BitmapFont>) -> Self {
    Self {
      font,
      label_scale: YOLOV5_LABEL_SCALE,
    }
  }

  pub fn label_scale(mut self, label_scale: f32) -> Self {
    self.label_scale = label_scale;
    self
  }

  pub fn font(&self) -> &BitmapFont {
    &self.font
  }

  /// 1 像素宽的闭合矩形边框，四条边都包含 `(x + w, y + h)` 角点，越界像素被裁掉
  ///
  /// 上下两条边各画 `w + 1` 个像素，左右两条边各画 `h + 1` 个像素，
  /// 比只画 `w` / `h` 个像素的开区间画法多出右下角那一行和一列。
  pub fn draw_rect(&self, canvas: &mut RgbCanvas<'_>, det: &Detection, color: [u8; 3]) {
    let x0 = det.x as i64;
    let y0 = det.y as i64;
    let x1 = x0 + det.w as i64;
    let y1 = y0 + det.h as i64;

    for x in x0..=x1 {
      canvas.put_pixel(x, y0, color);
      canvas.put_pixel(x, y1, color);
    }
    for y in y0..=y1 {
      canvas.put_pixel(x0, y, color);
      canvas.put_pixel(x1, y, color);
    }
  }

  /// 在 `(pos_x, pos_y)` 上方绘制缩放后的标签，右侧超出时按比例缩小，顶部不低于 0
  pub fn put_text(&self, canvas: &mut RgbCanvas<'_>, text: &str, pos_x: i64, pos_y: i64) {
    let strip = self.font.render_text(text);
    let (strip_w, strip_h) = strip.dimensions();
    if strip_w == 0 || strip_h == 0 {
      return;
    }

    let width = canvas.width() as i64;
    let mut new_w = (strip_w as f32 * self.label_scale) as i64;
    let mut new_h = (strip_h as f32 * self.label_scale) as i64;
    if pos_x + new_w > width {
      new_w = width - pos_x;
      new_h = (new_w as f32 * strip_h as f32 / strip_w as f32) as i64;
    }
    if new_w <= 0 || new_h <= 0 {
      return;
    }

    let pos_y = (pos_y - new_h).max(0);
    let resized = imageops::resize(&strip, new_w as u32, new_h as u32, FilterType::Triangle);
    canvas.blit(&resized, pos_x, pos_y);
  }

  pub fn draw_detection(&self, canvas: &mut RgbCanvas<'_>, det: &Detection, label: &str) {
    self.draw_rect(canvas, det, class_color(det.class_id));
    self.put_text(canvas, label, det.x as i64, det.y as i64);
  }

  /// 先解析全部类别名称，任意一个失败则不绘制
  pub fn draw_detections<L: LabelResolver + ?Sized>(
    &self,
    canvas: &mut RgbCanvas<'_>,
    result: &DetectResult,
    labels: &L,
  ) -> Result<(), LabelError> {
    let names = result.resolve_labels(labels)?;
    for (det, name) in result.iter().zip(names) {
      self.draw_detection(canvas, det, name);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::label::BuiltinLabels;
  use crate::output::font::{FONT_COLUMNS, FONT_ROWS};
  use image::{Rgb, RgbImage};

  fn solid_font(glyph_w: u32, glyph_h: u32, color: [u8; 3]) -> Arc<BitmapFont> {
    let sprite = RgbImage::from_pixel(glyph_w * FONT_COLUMNS, glyph_h * FONT_ROWS, Rgb(color));
    Arc::new(BitmapFont::from_sprite(sprite).unwrap())
  }

  fn det(x: f32, y: f32, w: f32, h: f32, class_id: u32) -> Detection {
    Detection {
      x,
      y,
      w,
      h,
      score: 0.9,
      class_id,
    }
  }

  fn changed(image: &RgbImage) -> Vec<(u32, u32)> {
    image
      .enumerate_pixels()
      .filter(|(_, _, p)| p.0 != [0, 0, 0])
      .map(|(x, y, _)| (x, y))
      .collect()
  }

  #[test]
  fn palette_wraps() {
    assert_eq!(class_color(0), [255, 0, 0]);
    assert_eq!(class_color(12), [0, 0, 255]);
    assert_eq!(class_color(25), class_color(0));
    assert_eq!(class_color(79), class_color(4));
  }

  #[test]
  fn rect_outline_only() {
    let mut image = RgbImage::new(10, 10);
    let draw = Draw::new(solid_font(2, 2, [0, 0, 0]));
    draw.draw_rect(&mut RgbCanvas::from_image(&mut image), &det(2.0, 3.0, 4.0, 2.0, 0), [9, 9, 9]);

    let pixels = changed(&image);
    // 5 x 3 的外框：2 * 5 + 2 * 1
    assert_eq!(pixels.len(), 12);
    assert!(pixels.contains(&(6, 5)));
    assert!(pixels.contains(&(2, 4)));
    assert!(!pixels.contains(&(3, 4)));
  }

  #[test]
  fn rect_at_right_edge_is_clipped() {
    let mut image = RgbImage::new(8, 8);
    let draw = Draw::new(solid_font(2, 2, [0, 0, 0]));
    draw.draw_rect(&mut RgbCanvas::from_image(&mut image), &det(4.0, 4.0, 4.0, 4.0, 0), [1, 1, 1]);
    let pixels = changed(&image);
    assert!(pixels.iter().all(|&(x, y)| x == 4 || y == 4));
    assert_eq!(pixels.len(), 7);
  }

  #[test]
  fn label_sits_above_box() {
    let mut image = RgbImage::new(64, 64);
    let draw = Draw::new(solid_font(4, 8, [200, 200, 200]));
    draw.put_text(&mut RgbCanvas::from_image(&mut image), "ab", 10, 20);

    // 8x8 的字条缩放到 4x4，放在 (10, 16)
    let pixels = changed(&image);
    assert_eq!(pixels.len(), 16);
    assert!(pixels
      .iter()
      .all(|&(x, y)| (10..14).contains(&x) && (16..20).contains(&y)));
  }

  #[test]
  fn label_shrinks_at_right_edge() {
    let mut image = RgbImage::new(12, 12);
    let draw = Draw::new(solid_font(4, 8, [200, 200, 200]));
    draw.put_text(&mut RgbCanvas::from_image(&mut image), "abcd", 10, 0);

    // 16x8 -> 本应 8x4, 只剩 2 列 -> 2x1, 顶部截到 0
    let pixels = changed(&image);
    assert_eq!(pixels, vec![(10, 0), (11, 0)]);
  }

  #[test]
  fn unknown_class_draws_nothing() {
    let mut image = RgbImage::new(16, 16);
    let draw = Draw::new(solid_font(2, 2, [5, 5, 5]));
    let result = DetectResult::from(vec![det(1.0, 1.0, 4.0, 4.0, 0), det(1.0, 1.0, 4.0, 4.0, 200)]);
    let mut canvas = RgbCanvas::from_image(&mut image);
    assert!(draw.draw_detections(&mut canvas, &result, &BuiltinLabels).is_err());
    assert!(changed(&image).is_empty());
  }
}
