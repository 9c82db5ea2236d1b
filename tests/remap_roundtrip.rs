// 该文件是 Shanan （山南西风） 项目的一部分。
// tests/remap_roundtrip.rs - letterbox 正变换与坐标还原互逆
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

use rand::{Rng, SeedableRng, rngs::StdRng};
use shanan_yolov5::{
  model::Detection,
  postprocess::{remap, remap_box},
  preprocess::ResizeInfo,
};

const SIZES: [(u32, u32); 5] = [(1280, 720), (720, 1280), (640, 640), (1920, 1080), (333, 517)];

fn roundtrip(keep_aspect_ratio: bool, seed: u64) {
  let mut rng = StdRng::seed_from_u64(seed);
  for (ori_w, ori_h) in SIZES {
    let info = ResizeInfo::new(ori_w, ori_h, 640, 640, keep_aspect_ratio).unwrap();
    if keep_aspect_ratio {
      assert_eq!(info.ratio_x, info.ratio_y);
    }

    for _ in 0..200 {
      let w = rng.random_range(1.0..ori_w as f32 / 2.0);
      let h = rng.random_range(1.0..ori_h as f32 / 2.0);
      let x = rng.random_range(0.0..ori_w as f32 - w);
      let y = rng.random_range(0.0..ori_h as f32 - h);

      let (nx, ny, nw, nh) = info.forward(x, y, w, h);
      let mut det = Detection {
        x: nx,
        y: ny,
        w: nw,
        h: nh,
        score: 0.9,
        class_id: 0,
      };
      remap_box(&mut det, &info);

      let tol = 1e-3 * ori_w.max(ori_h) as f32;
      assert!((det.x - x).abs() < tol, "x {} vs {}", det.x, x);
      assert!((det.y - y).abs() < tol, "y {} vs {}", det.y, y);
      assert!((det.w - w).abs() < tol, "w {} vs {}", det.w, w);
      assert!((det.h - h).abs() < tol, "h {} vs {}", det.h, h);
    }
  }
}

#[test]
fn keep_aspect_roundtrip() {
  roundtrip(true, 1);
}

#[test]
fn stretch_roundtrip() {
  roundtrip(false, 2);
}

#[test]
fn half_scale_with_vertical_padding() {
  let info = ResizeInfo::new(1280, 1120, 640, 640, true).unwrap();
  assert_eq!(info.ratio_x, 0.5);
  assert_eq!((info.pad_x, info.pad_y), (0, 40));

  let mut dets = [Detection {
    x: 100.0,
    y: 100.0,
    w: 50.0,
    h: 50.0,
    score: 0.7,
    class_id: 3,
  }];
  remap(&mut dets, &info);
  assert_eq!((dets[0].x, dets[0].y, dets[0].w, dets[0].h), (200.0, 120.0, 100.0, 100.0));
}

#[test]
fn overflow_is_shifted_not_cropped() {
  let info = ResizeInfo::new(640, 480, 640, 640, true).unwrap();
  // 网络坐标中超出原图右下方
  let mut det = Detection {
    x: 600.0,
    y: 500.0,
    w: 100.0,
    h: 80.0,
    score: 0.7,
    class_id: 1,
  };
  remap_box(&mut det, &info);
  assert_eq!((det.w, det.h), (100.0, 80.0));
  assert_eq!((det.x, det.y), (540.0, 400.0));
}
