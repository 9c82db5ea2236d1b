// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/score.rs - 类别打分与阈值过滤
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
use crate::postprocess::{
  argmax::ArgmaxStrategy,
  decode::{DecodedRecord, DecodedTensor},
};

#[derive(Debug, Clone, Copy)]
pub struct Scorer {
  conf_threshold: f32,
  argmax: ArgmaxStrategy,
}

impl Scorer {
  pub fn new(conf_threshold: f32, argmax: ArgmaxStrategy) -> Self {
    Self {
      conf_threshold,
      argmax,
    }
  }

  /// 单条记录：objectness 与最终分数都必须严格大于阈值，NaN 一律丢弃
  pub fn score_record(&self, record: &DecodedRecord<'_>) -> Option<Detection> {
    let objectness = record.objectness();
    if !(objectness > self.conf_threshold) {
      return None;
    }

    let (class_id, confidence) = self.argmax.argmax(record.class_scores());
    let score = objectness * confidence;
    if !(score > self.conf_threshold) {
      return None;
    }

    let (w, h) = (record.w(), record.h());
    Some(Detection {
      x: record.cx() - w / 2.0,
      y: record.cy() - h / 2.0,
      w,
      h,
      score,
      class_id: class_id as u32,
    })
  }

  pub fn score(&self, decoded: &DecodedTensor) -> Vec<Detection> {
    let items: Vec<Detection> = decoded
      .records()
      .filter_map(|record| self.score_record(&record))
      .collect();
    debug!("阈值过滤后剩余 {} 个候选框 (argmax: {})", items.len(), self.argmax);
    items
  }
}
