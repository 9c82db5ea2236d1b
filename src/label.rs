// 该文件是 Shanan （山南西风） 项目的一部分。
// src/label.rs - 类别名称解析
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

use std::path::Path;

use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{COCO_CLASSES, YOLOV5_CLASS_NUM},
};

/// 类别名称文件中单行的最大字节数（含换行符）
pub const LABEL_LINE_MAX: usize = 256;

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("类别名称不足: 期望 {expected} 行, 实际 {actual} 行")]
  TooFewLines { expected: usize, actual: usize },
  #[error("第 {line} 行过长: {len} 字节, 最多 {max} 字节")]
  LineTooLong { line: usize, len: usize, max: usize },
  #[error("类别编号越界: {class_id}, 共 {len} 个类别")]
  ClassOutOfRange { class_id: u32, len: usize },
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// class_id → 类别名称
pub trait LabelResolver {
  fn len(&self) -> usize;

  fn name(&self, index: usize) -> &str;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn label(&self, class_id: u32) -> Result<&str, LabelError> {
    let index = class_id as usize;
    if index >= self.len() {
      return Err(LabelError::ClassOutOfRange {
        class_id,
        len: self.len(),
      });
    }
    Ok(self.name(index))
  }
}

/// 编译期内置的 COCO 80 类名称
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLabels;

impl LabelResolver for BuiltinLabels {
  fn len(&self) -> usize {
    COCO_CLASSES.len()
  }

  fn name(&self, index: usize) -> &str {
    COCO_CLASSES[index]
  }
}

/// 运行时从文本文件加载的类别名称，每行一个
#[derive(Debug, Clone)]
pub struct FileLabels {
  names: Box<[String]>,
}

impl FileLabels {
  /// 只读取前 `expected` 行；不足 `expected` 行时报错
  pub fn parse(text: &str, expected: usize) -> Result<Self, LabelError> {
    let mut names = Vec::with_capacity(expected);
    for (idx, line) in text.split_inclusive('\n').take(expected).enumerate() {
      if line.len() >= LABEL_LINE_MAX {
        return Err(LabelError::LineTooLong {
          line: idx + 1,
          len: line.len(),
          max: LABEL_LINE_MAX - 1,
        });
      }
      names.push(line.trim_end_matches(['\n', '\r']).to_string());
    }

    if names.len() < expected {
      return Err(LabelError::TooFewLines {
        expected,
        actual: names.len(),
      });
    }

    Ok(Self {
      names: names.into_boxed_slice(),
    })
  }

  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
    let path = path.as_ref();
    debug!("加载类别名称文件: {}", path.display());
    let text = std::fs::read_to_string(path).inspect_err(|e| {
      error!("无法读取类别名称文件 {}: {}", path.display(), e);
    })?;
    Self::parse(&text, YOLOV5_CLASS_NUM)
  }
}

impl LabelResolver for FileLabels {
  fn len(&self) -> usize {
    self.names.len()
  }

  fn name(&self, index: usize) -> &str {
    &self.names[index]
  }
}

/// 通过 URL 选择名称来源：`builtin:coco` 或 `labels:<path>`
#[derive(Debug, Clone)]
pub enum Labels {
  Builtin(BuiltinLabels),
  File(FileLabels),
}

const BUILTIN_LABELS_SCHEME: &str = "builtin";

impl FromUrlWithScheme for Labels {
  const SCHEME: &'static str = "labels";
}

impl FromUrl for Labels {
  type Error = LabelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      BUILTIN_LABELS_SCHEME if url.path() == "coco" => Ok(Labels::Builtin(BuiltinLabels)),
      scheme if scheme == Self::SCHEME || scheme == "file" => {
        Ok(Labels::File(FileLabels::load(crate::url_path(url))?))
      }
      scheme => Err(LabelError::SchemeMismatch(format!(
        "期望 '{}:coco' 或 '{}:<path>', 实际为 '{}'",
        BUILTIN_LABELS_SCHEME,
        Self::SCHEME,
        scheme
      ))),
    }
  }
}

impl LabelResolver for Labels {
  fn len(&self) -> usize {
    match self {
      Labels::Builtin(labels) => labels.len(),
      Labels::File(labels) => labels.len(),
    }
  }

  fn name(&self, index: usize) -> &str {
    match self {
      Labels::Builtin(labels) => labels.name(index),
      Labels::File(labels) => labels.name(index),
    }
  }
}
