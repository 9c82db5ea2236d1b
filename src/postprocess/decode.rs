// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/decode.rs - 锚框解码
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

use tracing::debug;

use crate::model::{
  YOLOV5_ANCHOR_NUM, YOLOV5_ANCHORS, YOLOV5_BOX_NUM, YOLOV5_CHANNELS, YOLOV5_CLASS_NUM,
};
use crate::postprocess::tensor::{RawOutputView, ScaleView};

#[inline]
pub fn sigmoid(x: f32) -> f32 {
  1.0 / (1.0 + (-x).exp())
}

/// 解码后的稠密数组，每个 (scale, anchor, cell) 占 85 个 f32：
/// `[cx, cy, w, h, objectness, class_0 .. class_79]`
///
/// 只有 objectness 超过阈值的记录才会写入类别分数，其余记录的类别分数保持为 0。
#[derive(Debug, Clone)]
pub struct DecodedTensor {
  data: Vec<f32>,
}

/// 一条解码记录的只读视图
#[derive(Debug, Clone, Copy)]
pub struct DecodedRecord<'a> {
  attrs: &'a [f32],
}

impl<'a> DecodedRecord<'a> {
  pub fn cx(&self) -> f32 {
    self.attrs[0]
  }

  pub fn cy(&self) -> f32 {
    self.attrs[1]
  }

  pub fn w(&self) -> f32 {
    self.attrs[2]
  }

  pub fn h(&self) -> f32 {
    self.attrs[3]
  }

  pub fn objectness(&self) -> f32 {
    self.attrs[4]
  }

  /// 仅当 objectness 超过解码阈值时有意义
  pub fn class_scores(&self) -> &'a [f32] {
    &self.attrs[5..]
  }
}

impl DecodedTensor {
  pub fn len(&self) -> usize {
    self.data.len() / YOLOV5_CHANNELS
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn record(&self, index: usize) -> DecodedRecord<'_> {
    let offset = index * YOLOV5_CHANNELS;
    DecodedRecord {
      attrs: &self.data[offset..offset + YOLOV5_CHANNELS],
    }
  }

  pub fn records(&self) -> impl Iterator<Item = DecodedRecord<'_>> {
    self
      .data
      .chunks_exact(YOLOV5_CHANNELS)
      .map(|attrs| DecodedRecord { attrs })
  }
}

/// 网格偏移 + 锚框缩放解码器
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
  conf_threshold: f32,
  net_w: f32,
  net_h: f32,
}

impl Decoder {
  pub fn new(conf_threshold: f32, net_w: u32, net_h: u32) -> Self {
    Self {
      conf_threshold,
      net_w: net_w as f32,
      net_h: net_h as f32,
    }
  }

  /// 解码单个检测头，`dst` 长度必须为 `anchors * cells * 85`
  pub fn decode_head(
    &self,
    head: &ScaleView<'_>,
    anchors: &[(f32, f32); YOLOV5_ANCHOR_NUM],
    dst: &mut [f32],
  ) {
    let (map_h, map_w) = head.grid();
    let cells = head.cells();
    debug_assert_eq!(dst.len(), YOLOV5_ANCHOR_NUM * cells * YOLOV5_CHANNELS);

    let mut records = dst.chunks_exact_mut(YOLOV5_CHANNELS);
    for (anchor_idx, &(anchor_w, anchor_h)) in anchors.iter().enumerate() {
      for cell in 0..cells {
        let Some(out) = records.next() else {
          return;
        };
        let src = head.channels(anchor_idx, cell);
        let col = (cell % map_w) as f32;
        let row = (cell / map_w) as f32;

        out[0] = (sigmoid(src[0]) * 2.0 - 0.5 + col) / map_w as f32 * self.net_w;
        out[1] = (sigmoid(src[1]) * 2.0 - 0.5 + row) / map_h as f32 * self.net_h;
        out[2] = (sigmoid(src[2]) * 2.0).powi(2) * anchor_w;
        out[3] = (sigmoid(src[3]) * 2.0).powi(2) * anchor_h;
        out[4] = sigmoid(src[4]);

        // 低置信度记录下游不会读取类别分数
        if out[4] > self.conf_threshold {
          for (d, &s) in out[5..].iter_mut().zip(&src[5..5 + YOLOV5_CLASS_NUM]) {
            *d = sigmoid(s);
          }
        }
      }
    }
  }

  pub fn decode(&self, raw: &RawOutputView<'_>) -> DecodedTensor {
    let mut data = vec![0.0f32; YOLOV5_BOX_NUM * YOLOV5_CHANNELS];
    let mut offset = 0;
    for (head, anchors) in raw.heads().iter().zip(YOLOV5_ANCHORS.iter()) {
      let len = YOLOV5_ANCHOR_NUM * head.cells() * YOLOV5_CHANNELS;
      self.decode_head(head, anchors, &mut data[offset..offset + len]);
      offset += len;
    }
    debug!("解码完成: {} 个候选框", offset / YOLOV5_CHANNELS);
    DecodedTensor { data }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{YOLOV5_HEAD_SIZES, head_len};
  use crate::postprocess::tensor::RawOutput;

  fn raw_heads(fill: f32) -> [Vec<f32>; 3] {
    [
      vec![fill; head_len(0)],
      vec![fill; head_len(1)],
      vec![fill; head_len(2)],
    ]
  }

  #[test]
  fn sigmoid_values() {
    assert_eq!(sigmoid(0.0), 0.5);
    assert!((sigmoid(9.0f32.ln()) - 0.9).abs() < 1e-6);
    assert!(sigmoid(-20.0) < 1e-8);
  }

  #[test]
  fn decodes_grid_offset_and_anchor() {
    let raw = RawOutput::new(raw_heads(0.0)).unwrap();
    let decoded = Decoder::new(0.5, 640, 640).decode(&raw.view());
    assert_eq!(decoded.len(), YOLOV5_BOX_NUM);

    // sigmoid(0) = 0.5 => 中心偏移 0.5，宽高等于锚框
    let first = decoded.record(0);
    assert!((first.cx() - 0.5 / 80.0 * 640.0).abs() < 1e-4);
    assert!((first.cy() - 0.5 / 80.0 * 640.0).abs() < 1e-4);
    assert!((first.w() - 10.0).abs() < 1e-5);
    assert!((first.h() - 13.0).abs() < 1e-5);
    assert_eq!(first.objectness(), 0.5);

    // 第二个检测头、第三个锚框、第 (row 2, col 5) 个网格
    let idx = 3 * 6400 + 2 * 1600 + 2 * 40 + 5;
    let rec = decoded.record(idx);
    assert!((rec.cx() - 5.5 / 40.0 * 640.0).abs() < 1e-3);
    assert!((rec.cy() - 2.5 / 40.0 * 640.0).abs() < 1e-3);
    assert!((rec.w() - 59.0).abs() < 1e-4);
    assert!((rec.h() - 119.0).abs() < 1e-4);
  }

  #[test]
  fn centers_stay_near_network_input() {
    // 中心偏移范围是 (-0.5, 1.5) 个网格，因此最多越出半个步长
    for fill in [-20.0f32, -1.0, 0.0, 1.0, 20.0] {
      let raw = RawOutput::new(raw_heads(fill)).unwrap();
      let decoded = Decoder::new(0.5, 640, 640).decode(&raw.view());
      let mut offset = 0;
      for (&(map_h, map_w), cells) in YOLOV5_HEAD_SIZES.iter().zip([6400usize, 1600, 400]) {
        let half_stride = 640.0 / map_w as f32 / 2.0 + 1e-3;
        assert_eq!(map_h * map_w, cells);
        for rec in (offset..offset + 3 * cells).map(|i| decoded.record(i)) {
          assert!(rec.cx() >= -half_stride && rec.cx() <= 640.0 + half_stride);
          assert!(rec.cy() >= -half_stride && rec.cy() <= 640.0 + half_stride);
          if fill == 0.0 {
            assert!(rec.cx() > 0.0 && rec.cx() < 640.0);
          }
        }
        offset += 3 * cells;
      }
    }
  }

  #[test]
  fn class_scores_only_for_confident_records() {
    let mut heads = raw_heads(-10.0);
    let cell = 3 * 20 + 4;
    let base = cell * YOLOV5_CHANNELS;
    heads[2][base + 4] = 3.0;
    heads[2][base + 5 + 7] = 2.0;
    let raw = RawOutput::new(heads).unwrap();
    let decoded = Decoder::new(0.5, 640, 640).decode(&raw.view());

    let offset = 3 * 6400 + 3 * 1600;
    let hit = decoded.record(offset + cell);
    assert!(hit.objectness() > 0.9);
    assert!((hit.class_scores()[7] - sigmoid(2.0)).abs() < 1e-6);
    assert!(hit.class_scores()[0] > 0.0);

    let miss = decoded.record(offset + cell + 1);
    assert!(miss.objectness() < 0.5);
    assert!(miss.class_scores().iter().all(|&v| v == 0.0));
  }
}
