// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess.rs - 检测后处理
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

//! 原始输出 -> 解码 -> 打分过滤 -> NMS -> 坐标还原

pub mod argmax;
pub mod decode;
pub mod nms;
pub mod remap;
pub mod score;
pub mod tensor;

pub use self::argmax::ArgmaxStrategy;
pub use self::decode::{DecodedTensor, Decoder, sigmoid};
pub use self::nms::{apply_keep, iou, nms};
pub use self::remap::{fix_box, remap, remap_box};
pub use self::score::Scorer;
pub use self::tensor::{RawOutput, RawOutputView, ScaleView, TensorError};

use crate::model::{
  YOLOV5_INPUT_H, YOLOV5_INPUT_W, YOLOV5_LABEL_SCALE, YOLOV5_NMS_THRESH, YOLOV5_OBJECT_THRESH,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostprocessConfig {
  pub conf_threshold: f32,
  pub nms_threshold: f32,
  pub net_width: u32,
  pub net_height: u32,
  pub argmax: ArgmaxStrategy,
  /// 标签文字相对字模尺寸的缩放
  pub label_scale: f32,
}

impl Default for PostprocessConfig {
  fn default() -> Self {
    Self {
      conf_threshold: YOLOV5_OBJECT_THRESH,
      nms_threshold: YOLOV5_NMS_THRESH,
      net_width: YOLOV5_INPUT_W,
      net_height: YOLOV5_INPUT_H,
      argmax: ArgmaxStrategy::detect(),
      label_scale: YOLOV5_LABEL_SCALE,
    }
  }
}

impl PostprocessConfig {
  pub fn with_conf_threshold(mut self, conf_threshold: f32) -> Self {
    self.conf_threshold = conf_threshold;
    self
  }

  pub fn with_nms_threshold(mut self, nms_threshold: f32) -> Self {
    self.nms_threshold = nms_threshold;
    self
  }

  pub fn with_network_size(mut self, width: u32, height: u32) -> Self {
    self.net_width = width;
    self.net_height = height;
    self
  }

  pub fn with_argmax(mut self, argmax: ArgmaxStrategy) -> Self {
    self.argmax = argmax;
    self
  }

  pub fn with_label_scale(mut self, label_scale: f32) -> Self {
    self.label_scale = label_scale;
    self
  }

  pub fn decoder(&self) -> Decoder {
    Decoder::new(self.conf_threshold, self.net_width, self.net_height)
  }

  pub fn scorer(&self) -> Scorer {
    Scorer::new(self.conf_threshold, self.argmax)
  }
}
