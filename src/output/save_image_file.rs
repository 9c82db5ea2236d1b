// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/save_image_file.rs - 绘制检测结果并保存为图像文件
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

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  label::{LabelError, LabelResolver},
  model::DetectResult,
  output::{
    Render,
    canvas::RgbCanvas,
    draw::Draw,
    record::{Record, RecordError},
  },
  url_path,
};

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("类别名称错误: {0}")]
  LabelError(#[from] LabelError),
  #[error("记录错误: {0}")]
  RecordError(#[from] RecordError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 由 `image:<path>` 解析得到的保存目标
#[derive(Debug, Clone)]
pub struct SaveImageFileBuilder {
  path: PathBuf,
  record: Option<Record>,
}

impl FromUrlWithScheme for SaveImageFileBuilder {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileBuilder {
  type Error = SaveImageFileError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    // image:results/a.bmp?record 或 ?record=id
    let record = url.query_pairs().find(|(k, _)| k == "record").map(|(_, v)| Record {
      label_with_name: v != "id",
    });

    Ok(Self {
      path: PathBuf::from(url_path(url)),
      record,
    })
  }
}

impl SaveImageFileBuilder {
  pub fn new<P: Into<PathBuf>>(path: P) -> Self {
    Self {
      path: path.into(),
      record: None,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn record(mut self, record: Record) -> Self {
    self.record = Some(record);
    self
  }

  pub fn build(self, draw: Draw, labels: Arc<dyn LabelResolver + Send + Sync>) -> SaveImageFileOutput {
    SaveImageFileOutput {
      path: self.path,
      record: self.record,
      draw,
      labels,
    }
  }
}

pub struct SaveImageFileOutput {
  path: PathBuf,
  record: Option<Record>,
  draw: Draw,
  labels: Arc<dyn LabelResolver + Send + Sync>,
}

impl SaveImageFileOutput {
  pub fn path(&self) -> &Path {
    &self.path
  }

  fn save_image(&self, image: &RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
      && !parent.exists()
    {
      std::fs::create_dir_all(parent)?;
      info!("创建输出目录: {}", parent.display());
    }

    image.save(&self.path)?;
    info!("保存图像到文件: {}", self.path.display());

    Ok(())
  }
}

impl Render<RgbImage, DetectResult> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, frame: &RgbImage, result: &DetectResult) -> Result<(), Self::Error> {
    let mut image = frame.clone();
    let mut canvas = RgbCanvas::from_image(&mut image);
    self.draw.draw_detections(&mut canvas, result, self.labels.as_ref())?;
    self.save_image(&image)?;

    if let Some(record) = &self.record {
      record.record(result, self.labels.as_ref(), &self.path)?;
    }
    Ok(())
  }
}
