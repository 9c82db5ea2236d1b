// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/nms.rs - 非极大值抑制
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

use crate::model::Detection;

/// 交集宽高上的偏移，避免零宽重叠被舍入为 0
pub const IOU_EPSILON: f32 = 1e-5;

/// 计算两个边界框的 IoU，面积由调用方预先计算
#[inline]
pub fn iou_with_areas(a: &Detection, b: &Detection, area_a: f32, area_b: f32) -> f32 {
  let x1 = a.x.max(b.x);
  let y1 = a.y.max(b.y);
  let x2 = a.right().min(b.right());
  let y2 = a.bottom().min(b.bottom());

  let intersection = (x2 - x1 + IOU_EPSILON).max(0.0) * (y2 - y1 + IOU_EPSILON).max(0.0);
  intersection / (area_a + area_b - intersection)
}

pub fn iou(a: &Detection, b: &Detection) -> f32 {
  iou_with_areas(a, b, a.area(), b.area())
}

/// 按类别的贪心 NMS，只标记不移动
///
/// 对每一对仍保留的同类框 (i, j)，i < j，IoU 超过阈值时抑制分数较低者；
/// 分数相同时抑制 j。`keep` 中已经为 `false` 的框不参与比较。
pub fn nms_in_place(dets: &[Detection], keep: &mut [bool], iou_threshold: f32) {
  debug_assert_eq!(dets.len(), keep.len());
  let areas: Vec<f32> = dets.iter().map(Detection::area).collect();

  for i in 0..dets.len() {
    if !keep[i] {
      continue;
    }
    for j in (i + 1)..dets.len() {
      if !keep[j] || dets[i].class_id != dets[j].class_id {
        continue;
      }
      if iou_with_areas(&dets[i], &dets[j], areas[i], areas[j]) > iou_threshold {
        if dets[i].score >= dets[j].score {
          keep[j] = false;
        } else {
          keep[i] = false;
          break;
        }
      }
    }
  }
}

/// 返回与 `dets` 等长的保留掩码
pub fn nms(dets: &[Detection], iou_threshold: f32) -> Vec<bool> {
  let mut keep = vec![true; dets.len()];
  nms_in_place(dets, &mut keep, iou_threshold);
  debug!(
    "NMS: {} 个候选框保留 {} 个",
    dets.len(),
    keep.iter().filter(|&&k| k).count()
  );
  keep
}

/// 按掩码收集保留的框，保持原有顺序
pub fn apply_keep(dets: &[Detection], keep: &[bool]) -> Vec<Detection> {
  dets
    .iter()
    .zip(keep)
    .filter_map(|(det, &k)| k.then_some(*det))
    .collect()
}
