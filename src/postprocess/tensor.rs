// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/tensor.rs - 原始输出张量视图
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

use crate::model::{YOLOV5_ANCHOR_NUM, YOLOV5_CHANNELS, YOLOV5_HEAD_SIZES, YOLOV5_SCALE_NUM, head_len};

#[derive(Error, Debug)]
pub enum TensorError {
  #[error("检测头 {scale}: 输出大小不匹配, 期望 {expected}, 实际 {actual}")]
  LengthMismatch {
    scale: usize,
    expected: usize,
    actual: usize,
  },
  #[error("预期输出数量为 {expected}, 实际为 {actual}")]
  ScaleCount { expected: usize, actual: usize },
  #[error("张量字节数 {0} 不是 4 的倍数")]
  Misaligned(usize),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 单个检测头的输出，布局为 `[anchor][cell][channel]`
#[derive(Debug, Clone, Copy)]
pub struct ScaleView<'a> {
  data: &'a [f32],
  scale: usize,
  map_h: usize,
  map_w: usize,
}

impl<'a> ScaleView<'a> {
  pub fn new(data: &'a [f32], scale: usize) -> Result<Self, TensorError> {
    if scale >= YOLOV5_SCALE_NUM {
      return Err(TensorError::ScaleCount {
        expected: YOLOV5_SCALE_NUM,
        actual: scale + 1,
      });
    }

    let expected = head_len(scale);
    if data.len() != expected {
      error!(
        "检测头 {}: 输出大小不匹配 - 期望 {}, 实际 {}",
        scale,
        expected,
        data.len()
      );
      return Err(TensorError::LengthMismatch {
        scale,
        expected,
        actual: data.len(),
      });
    }

    let (map_h, map_w) = YOLOV5_HEAD_SIZES[scale];
    Ok(Self {
      data,
      scale,
      map_h,
      map_w,
    })
  }

  pub fn scale(&self) -> usize {
    self.scale
  }

  /// (map_h, map_w)
  pub fn grid(&self) -> (usize, usize) {
    (self.map_h, self.map_w)
  }

  pub fn cells(&self) -> usize {
    self.map_h * self.map_w
  }

  /// 单个 (anchor, cell) 的 85 个通道
  #[inline]
  pub fn channels(&self, anchor: usize, cell: usize) -> &'a [f32] {
    debug_assert!(anchor < YOLOV5_ANCHOR_NUM);
    debug_assert!(cell < self.cells());
    let offset = (anchor * self.cells() + cell) * YOLOV5_CHANNELS;
    &self.data[offset..offset + YOLOV5_CHANNELS]
  }
}

/// 三个检测头输出的借用视图
#[derive(Debug, Clone, Copy)]
pub struct RawOutputView<'a> {
  heads: [ScaleView<'a>; YOLOV5_SCALE_NUM],
}

impl<'a> RawOutputView<'a> {
  pub fn new(buffers: &[&'a [f32]]) -> Result<Self, TensorError> {
    let [b0, b1, b2] = buffers else {
      return Err(TensorError::ScaleCount {
        expected: YOLOV5_SCALE_NUM,
        actual: buffers.len(),
      });
    };

    Ok(Self {
      heads: [
        ScaleView::new(*b0, 0)?,
        ScaleView::new(*b1, 1)?,
        ScaleView::new(*b2, 2)?,
      ],
    })
  }

  pub fn heads(&self) -> &[ScaleView<'a>; YOLOV5_SCALE_NUM] {
    &self.heads
  }
}

/// 持有所有权的原始输出，一般从推理引擎导出的文件中读取
#[derive(Debug, Clone)]
pub struct RawOutput {
  buffers: [Vec<f32>; YOLOV5_SCALE_NUM],
}

impl RawOutput {
  pub fn new(buffers: [Vec<f32>; YOLOV5_SCALE_NUM]) -> Result<Self, TensorError> {
    for (scale, buffer) in buffers.iter().enumerate() {
      ScaleView::new(buffer, scale)?;
    }
    Ok(Self { buffers })
  }

  /// 小端 f32 字节流转换为浮点数组
  pub fn decode_le_bytes(bytes: &[u8]) -> Result<Vec<f32>, TensorError> {
    if bytes.len() % 4 != 0 {
      return Err(TensorError::Misaligned(bytes.len()));
    }
    Ok(
      bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect(),
    )
  }

  pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, TensorError> {
    let [p0, p1, p2] = paths else {
      return Err(TensorError::ScaleCount {
        expected: YOLOV5_SCALE_NUM,
        actual: paths.len(),
      });
    };

    let read = |path: &Path| -> Result<Vec<f32>, TensorError> {
      debug!("读取输出张量文件: {}", path.display());
      let bytes = std::fs::read(path)?;
      Self::decode_le_bytes(&bytes)
    };

    Self::new([read(p0.as_ref())?, read(p1.as_ref())?, read(p2.as_ref())?])
  }

  pub fn view(&self) -> RawOutputView<'_> {
    let [b0, b1, b2] = &self.buffers;
    // 长度已在构造时校验
    RawOutputView {
      heads: [
        ScaleView {
          data: b0,
          scale: 0,
          map_h: YOLOV5_HEAD_SIZES[0].0,
          map_w: YOLOV5_HEAD_SIZES[0].1,
        },
        ScaleView {
          data: b1,
          scale: 1,
          map_h: YOLOV5_HEAD_SIZES[1].0,
          map_w: YOLOV5_HEAD_SIZES[1].1,
        },
        ScaleView {
          data: b2,
          scale: 2,
          map_h: YOLOV5_HEAD_SIZES[2].0,
          map_w: YOLOV5_HEAD_SIZES[2].1,
        },
      ],
    }
  }
}
