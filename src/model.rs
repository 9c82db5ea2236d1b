// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model.rs - 检测结果与模型常量
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

use crate::label::{LabelError, LabelResolver};

mod yolov5;
pub use self::yolov5::*;

/// 单个检测框
///
/// 坐标为左上角 + 宽高。NMS 之前位于网络输入像素空间，
/// 经过 [`crate::postprocess::remap`] 之后位于原图像素空间。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
  pub x: f32,
  pub y: f32,
  pub w: f32,
  pub h: f32,
  /// 目标置信度 × 类别置信度
  pub score: f32,
  pub class_id: u32,
}

impl Detection {
  pub fn area(&self) -> f32 {
    self.w * self.h
  }

  pub fn right(&self) -> f32 {
    self.x + self.w
  }

  pub fn bottom(&self) -> f32 {
    self.y + self.h
  }
}

#[derive(Debug, Clone, Default)]
pub struct DetectResult {
  pub items: Box<[Detection]>,
}

impl From<Vec<Detection>> for DetectResult {
  fn from(items: Vec<Detection>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

impl DetectResult {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
    self.items.iter()
  }

  /// 逐个检测框解析类别名称；任意一个越界则整体失败，不返回部分结果
  pub fn resolve_labels<'l, L: LabelResolver + ?Sized>(
    &self,
    labels: &'l L,
  ) -> Result<Vec<&'l str>, LabelError> {
    self
      .items
      .iter()
      .map(|item| labels.label(item.class_id))
      .collect()
  }

  /// 每个检测框一行：`class[00]: scores = 0.812345, label = person`
  pub fn report_lines<L: LabelResolver + ?Sized>(
    &self,
    labels: &L,
  ) -> Result<Vec<String>, LabelError> {
    let names = self.resolve_labels(labels)?;
    Ok(
      self
        .items
        .iter()
        .zip(names)
        .enumerate()
        .map(|(idx, (item, name))| {
          format!("class[{:02}]: scores = {:.6}, label = {}", idx, item.score, name)
        })
        .collect(),
    )
  }
}
