// 该文件是 Shanan （山南西风） 项目的一部分。
// src/pipeline.rs - 单张图像的完整后处理流程
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

use thiserror::Error;
use tracing::{debug, error};

use crate::{
  label::{LabelError, LabelResolver},
  model::DetectResult,
  output::{BitmapFont, CanvasError, Draw, FontError, RgbCanvas},
  postprocess::{PostprocessConfig, RawOutputView, TensorError, apply_keep, nms, remap},
  preprocess::{PreprocessError, ResizeInfo},
};

#[derive(Error, Debug)]
pub enum PipelineError {
  #[error("张量错误: {0}")]
  TensorError(#[from] TensorError),
  #[error("类别名称错误: {0}")]
  LabelError(#[from] LabelError),
  #[error("画布错误: {0}")]
  CanvasError(#[from] CanvasError),
  #[error("预处理错误: {0}")]
  PreprocessError(#[from] PreprocessError),
  #[error("字模错误: {0}")]
  FontError(#[from] FontError),
  #[error("网络输入尺寸不匹配: 配置为 {expected_w}x{expected_h}, 缩放信息为 {actual_w}x{actual_h}")]
  NetworkSizeMismatch {
    expected_w: u32,
    expected_h: u32,
    actual_w: u32,
    actual_h: u32,
  },
}

/// 解码 -> 打分 -> NMS -> 坐标还原 -> 绘制
///
/// 只持有只读状态，可以在多个线程间共享，每次调用的中间数据都在调用内部分配。
#[derive(Clone)]
pub struct Pipeline {
  config: PostprocessConfig,
  labels: Arc<dyn LabelResolver + Send + Sync>,
  draw: Draw,
}

impl Pipeline {
  pub fn new(
    config: PostprocessConfig,
    labels: Arc<dyn LabelResolver + Send + Sync>,
    font: Arc<BitmapFont>,
  ) -> Self {
    let draw = Draw::new(font).label_scale(config.label_scale);
    Self {
      config,
      labels,
      draw,
    }
  }

  pub fn config(&self) -> &PostprocessConfig {
    &self.config
  }

  pub fn labels(&self) -> &Arc<dyn LabelResolver + Send + Sync> {
    &self.labels
  }

  pub fn draw(&self) -> &Draw {
    &self.draw
  }

  /// 返回原图坐标系下的检测框
  pub fn detect(
    &self,
    raw: &RawOutputView<'_>,
    info: &ResizeInfo,
  ) -> Result<DetectResult, PipelineError> {
    if (info.network_width, info.network_height) != (self.config.net_width, self.config.net_height) {
      error!(
        "网络输入尺寸不匹配: 配置 {}x{}, 缩放信息 {}x{}",
        self.config.net_width, self.config.net_height, info.network_width, info.network_height
      );
      return Err(PipelineError::NetworkSizeMismatch {
        expected_w: self.config.net_width,
        expected_h: self.config.net_height,
        actual_w: info.network_width,
        actual_h: info.network_height,
      });
    }

    let decoded = self.config.decoder().decode(raw);
    let candidates = self.config.scorer().score(&decoded);
    let keep = nms(&candidates, self.config.nms_threshold);
    let mut items = apply_keep(&candidates, &keep);
    remap(&mut items, info);

    debug!("检测完成: {} 个目标", items.len());
    Ok(DetectResult::from(items))
  }

  /// 在原图画布上绘制，画布尺寸必须与 `info` 记录的原图尺寸一致
  pub fn render(
    &self,
    canvas: &mut RgbCanvas<'_>,
    info: &ResizeInfo,
    result: &DetectResult,
  ) -> Result<(), PipelineError> {
    canvas.ensure_size(info.original_width, info.original_height)?;
    self
      .draw
      .draw_detections(canvas, result, self.labels.as_ref())?;
    Ok(())
  }

  pub fn process(
    &self,
    raw: &RawOutputView<'_>,
    info: &ResizeInfo,
    canvas: &mut RgbCanvas<'_>,
  ) -> Result<DetectResult, PipelineError> {
    // 先检查画布，避免检测完成后才发现无法绘制
    canvas.ensure_size(info.original_width, info.original_height)?;
    let result = self.detect(raw, info)?;
    self.render(canvas, info, &result)?;
    Ok(result)
  }

  pub fn report_lines(&self, result: &DetectResult) -> Result<Vec<String>, PipelineError> {
    Ok(result.report_lines(self.labels.as_ref())?)
  }
}
