// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/remap.rs - 网络坐标还原到原图坐标
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

use crate::model::Detection;
use crate::preprocess::ResizeInfo;

/// 把框限制在图像内：宽高截断到图像尺寸，越界时平移而不缩小
pub fn fix_box(det: &mut Detection, width: f32, height: f32) {
  det.w = det.w.max(0.0).min(width);
  det.h = det.h.max(0.0).min(height);

  if det.x + det.w > width {
    det.x = width - det.w;
  } else if det.x < 0.0 {
    det.x = 0.0;
  }

  if det.y + det.h > height {
    det.y = height - det.h;
  } else if det.y < 0.0 {
    det.y = 0.0;
  }
}

/// letterbox 逆变换后再限制到原图范围
pub fn remap_box(det: &mut Detection, info: &ResizeInfo) {
  det.x = (det.x - info.pad_x as f32) / info.ratio_x;
  det.y = (det.y - info.pad_y as f32) / info.ratio_y;
  det.w /= info.ratio_x;
  det.h /= info.ratio_y;
  fix_box(
    det,
    info.original_width as f32,
    info.original_height as f32,
  );
}

pub fn remap(dets: &mut [Detection], info: &ResizeInfo) {
  for det in dets.iter_mut() {
    remap_box(det, info);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn det(x: f32, y: f32, w: f32, h: f32) -> Detection {
    Detection {
      x,
      y,
      w,
      h,
      score: 0.9,
      class_id: 0,
    }
  }

  #[test]
  fn shifts_instead_of_shrinking() {
    let mut d = det(90.0, 95.0, 20.0, 10.0);
    fix_box(&mut d, 100.0, 100.0);
    assert_eq!((d.x, d.y, d.w, d.h), (80.0, 90.0, 20.0, 10.0));

    let mut d = det(-5.0, -1.0, 20.0, 10.0);
    fix_box(&mut d, 100.0, 100.0);
    assert_eq!((d.x, d.y, d.w, d.h), (0.0, 0.0, 20.0, 10.0));
  }

  #[test]
  fn oversized_box_fills_image() {
    let mut d = det(-10.0, -10.0, 300.0, -4.0);
    fix_box(&mut d, 100.0, 50.0);
    assert_eq!((d.x, d.y, d.w, d.h), (0.0, 0.0, 100.0, 0.0));
  }

  #[test]
  fn inverse_letterbox() {
    let info = ResizeInfo {
      original_width: 1280,
      original_height: 1120,
      network_width: 640,
      network_height: 640,
      ratio_x: 0.5,
      ratio_y: 0.5,
      pad_x: 0,
      pad_y: 40,
      keep_aspect_ratio: true,
      resized_width: 640,
      resized_height: 560,
    };
    let mut d = det(100.0, 100.0, 50.0, 50.0);
    remap_box(&mut d, &info);
    assert_eq!((d.x, d.y, d.w, d.h), (200.0, 120.0, 100.0, 100.0));
  }
}
