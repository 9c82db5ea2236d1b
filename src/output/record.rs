// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/record.rs - 检测结果文本记录
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

use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

use crate::{
  label::{LabelError, LabelResolver},
  model::DetectResult,
};

#[derive(Error, Debug)]
pub enum RecordError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("类别名称错误: {0}")]
  LabelError(#[from] LabelError),
}

/// 每个检测框一行 `name, score, x, y, w, h`
#[derive(Debug, Clone, Copy)]
pub struct Record {
  /// 为 false 时写类别编号
  pub label_with_name: bool,
}

impl Default for Record {
  fn default() -> Self {
    Self {
      label_with_name: true,
    }
  }
}

impl Record {
  pub fn lines<L: LabelResolver + ?Sized>(
    &self,
    result: &DetectResult,
    labels: &L,
  ) -> Result<Vec<String>, LabelError> {
    let names = result.resolve_labels(labels)?;
    Ok(
      result
        .iter()
        .zip(names)
        .map(|(item, name)| {
          let name = if self.label_with_name {
            name.to_string()
          } else {
            item.class_id.to_string()
          };
          format!(
            "{}, {:.4}, {:.4}, {:.4}, {:.4}, {:.4}",
            name, item.score, item.x, item.y, item.w, item.h
          )
        })
        .collect(),
    )
  }

  /// 写入 `path` 同名的 `.txt` 文件，返回实际路径
  pub fn record<L: LabelResolver + ?Sized>(
    &self,
    result: &DetectResult,
    labels: &L,
    path: &Path,
  ) -> Result<PathBuf, RecordError> {
    let lines = self.lines(result, labels)?;
    let path = path.with_extension("txt");
    std::fs::write(&path, lines.join("\n"))?;
    info!("保存检测记录到文件: {}", path.display());
    Ok(path)
  }
}

/// 每个检测框一个 JSON 对象
pub fn to_json<L: LabelResolver + ?Sized>(
  result: &DetectResult,
  labels: &L,
) -> Result<Vec<Value>, LabelError> {
  let names = result.resolve_labels(labels)?;
  Ok(
    result
      .iter()
      .zip(names)
      .map(|(item, name)| {
        json!({
          "class_id": item.class_id,
          "label": name,
          "score": item.score,
          "bbox": [item.x, item.y, item.w, item.h],
        })
      })
      .collect(),
  )
}
