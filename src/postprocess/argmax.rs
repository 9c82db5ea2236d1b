// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/argmax.rs - 类别分数 argmax（标量 / SSE4.1 / NEON）
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

//! 所有实现都返回第一个最大值的 `(index, value)`，与平台无关。

use std::fmt;
use std::str::FromStr;

const LANES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgmaxStrategy {
  Scalar,
  /// x86_64，4 路 SSE4.1
  Sse41,
  /// aarch64，4 路 NEON
  Neon,
}

impl Default for ArgmaxStrategy {
  fn default() -> Self {
    Self::detect()
  }
}

impl ArgmaxStrategy {
  pub const ALL: [ArgmaxStrategy; 3] = [Self::Scalar, Self::Sse41, Self::Neon];

  /// 按当前 CPU 能力选择最快的实现
  pub fn detect() -> Self {
    [Self::Sse41, Self::Neon]
      .into_iter()
      .find(|s| s.is_supported())
      .unwrap_or(Self::Scalar)
  }

  pub fn is_supported(self) -> bool {
    match self {
      Self::Scalar => true,
      #[cfg(all(feature = "simd", target_arch = "x86_64"))]
      Self::Sse41 => std::arch::is_x86_feature_detected!("sse4.1"),
      #[cfg(all(feature = "simd", target_arch = "aarch64"))]
      Self::Neon => std::arch::is_aarch64_feature_detected!("neon"),
      #[allow(unreachable_patterns)]
      _ => false,
    }
  }

  /// 不支持的策略退回标量实现
  #[inline]
  pub fn argmax(self, data: &[f32]) -> (usize, f32) {
    match self {
      #[cfg(all(feature = "simd", target_arch = "x86_64"))]
      Self::Sse41 if self.is_supported() => {
        // SAFETY: 已在运行时确认 CPU 支持 SSE4.1
        unsafe { argmax_sse41(data) }
      }
      #[cfg(all(feature = "simd", target_arch = "aarch64"))]
      Self::Neon if self.is_supported() => {
        // SAFETY: 已在运行时确认 CPU 支持 NEON
        unsafe { argmax_neon(data) }
      }
      _ => argmax_scalar(data),
    }
  }
}

impl fmt::Display for ArgmaxStrategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Scalar => "scalar",
      Self::Sse41 => "sse41",
      Self::Neon => "neon",
    };
    f.write_str(name)
  }
}

impl FromStr for ArgmaxStrategy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "auto" => Ok(Self::detect()),
      "scalar" => Ok(Self::Scalar),
      "sse41" | "sse4.1" => Ok(Self::Sse41),
      "neon" => Ok(Self::Neon),
      other => Err(format!(
        "未知的 argmax 实现 '{}', 可选: auto, scalar, sse41, neon",
        other
      )),
    }
  }
}

/// 空输入返回 `(0, -inf)`
pub fn argmax_scalar(data: &[f32]) -> (usize, f32) {
  let Some((&first, rest)) = data.split_first() else {
    return (0, f32::NEG_INFINITY);
  };

  let mut max_index = 0;
  let mut max_value = first;
  for (i, &value) in rest.iter().enumerate() {
    if value > max_value {
      max_value = value;
      max_index = i + 1;
    }
  }
  (max_index, max_value)
}

/// 每个 lane 保存的是该 lane 上第一次出现的最大值；
/// 合并时相等的值取较小的下标，才能与标量实现一致。
///
/// lane 初值为 `-inf`，NaN 永远不会被选中。首元素为 NaN 时标量实现返回 `(0, NaN)`，
/// 向量实现在入口处直接交给标量实现。
#[allow(dead_code)]
#[inline]
fn reduce_lanes(
  values: [f32; LANES],
  indices: [usize; LANES],
  data: &[f32],
  tail: usize,
) -> (usize, f32) {
  let mut best = (indices[0], values[0]);
  for lane in 1..LANES {
    let (index, value) = (indices[lane], values[lane]);
    if value > best.1 || (value == best.1 && index < best.0) {
      best = (index, value);
    }
  }

  // 尾部元素下标都大于向量部分，严格大于即可保持“第一个最大值”
  for (i, &value) in data[tail..].iter().enumerate() {
    if value > best.1 {
      best = (tail + i, value);
    }
  }
  best
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "sse4.1")]
unsafe fn argmax_sse41(data: &[f32]) -> (usize, f32) {
  use std::arch::x86_64::*;

  if data.len() < LANES || data[0].is_nan() {
    return argmax_scalar(data);
  }
  let vector_end = data.len() / LANES * LANES;

  let (values, indices) = unsafe {
    let ptr = data.as_ptr();
    let index_inc = _mm_set1_epi32(LANES as i32);
    let mut index = _mm_setr_epi32(0, 1, 2, 3);
    let mut max_index = index;
    let mut max_value = _mm_set1_ps(f32::NEG_INFINITY);

    let mut i = 0;
    while i < vector_end {
      let v = _mm_loadu_ps(ptr.add(i));
      let gt = _mm_cmpgt_ps(v, max_value);
      max_value = _mm_blendv_ps(max_value, v, gt);
      max_index = _mm_blendv_epi8(max_index, index, _mm_castps_si128(gt));
      index = _mm_add_epi32(index, index_inc);
      i += LANES;
    }

    let mut values = [0.0f32; LANES];
    let mut indices = [0i32; LANES];
    _mm_storeu_ps(values.as_mut_ptr(), max_value);
    _mm_storeu_si128(indices.as_mut_ptr() as *mut __m128i, max_index);
    (values, indices)
  };

  reduce_lanes(values, indices.map(|i| i as usize), data, vector_end)
}

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
#[target_feature(enable = "neon")]
unsafe fn argmax_neon(data: &[f32]) -> (usize, f32) {
  use std::arch::aarch64::*;

  if data.len() < LANES || data[0].is_nan() {
    return argmax_scalar(data);
  }
  let vector_end = data.len() / LANES * LANES;

  let (values, indices) = unsafe {
    let ptr = data.as_ptr();
    let base: [u32; LANES] = [0, 1, 2, 3];
    let index_inc = vdupq_n_u32(LANES as u32);
    let mut index = vld1q_u32(base.as_ptr());
    let mut max_index = index;
    let mut max_value = vdupq_n_f32(f32::NEG_INFINITY);

    let mut i = 0;
    while i < vector_end {
      let v = vld1q_f32(ptr.add(i));
      let gt = vcgtq_f32(v, max_value);
      max_value = vbslq_f32(gt, v, max_value);
      max_index = vbslq_u32(gt, index, max_index);
      index = vaddq_u32(index, index_inc);
      i += LANES;
    }

    let mut values = [0.0f32; LANES];
    let mut indices = [0u32; LANES];
    vst1q_f32(values.as_mut_ptr(), max_value);
    vst1q_u32(indices.as_mut_ptr(), max_index);
    (values, indices)
  };

  reduce_lanes(values, indices.map(|i| i as usize), data, vector_end)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn supported() -> impl Iterator<Item = ArgmaxStrategy> {
    ArgmaxStrategy::ALL.into_iter().filter(|s| s.is_supported())
  }

  #[test]
  fn scalar_first_max_wins() {
    assert_eq!(argmax_scalar(&[1.0, 3.0, 3.0, 2.0]), (1, 3.0));
    assert_eq!(argmax_scalar(&[5.0]), (0, 5.0));
    assert_eq!(argmax_scalar(&[]), (0, f32::NEG_INFINITY));
  }

  #[test]
  fn ties_across_lanes() {
    // lane 1 的最大值出现在下标 1，lane 0 的同值出现在下标 4
    let mut data = vec![0.0f32; 80];
    data[1] = 9.0;
    data[4] = 9.0;
    data[8] = 9.0;
    for s in supported() {
      assert_eq!(s.argmax(&data), (1, 9.0), "strategy {}", s);
    }
  }

  #[test]
  fn ties_at_group_boundaries() {
    for (a, b) in [(3usize, 4usize), (7, 8), (11, 12), (75, 76), (0, 79)] {
      let mut data = vec![0.25f32; 80];
      data[a] = 0.75;
      data[b] = 0.75;
      for s in supported() {
        assert_eq!(s.argmax(&data), (a, 0.75), "strategy {} pair {:?}", s, (a, b));
      }

      // 相邻的近似最大值
      data[b] = f32::from_bits(0.75f32.to_bits() + 1);
      for s in supported() {
        assert_eq!(s.argmax(&data), (b, data[b]), "strategy {} pair {:?}", s, (a, b));
      }
    }
  }

  #[test]
  fn nan_in_first_group_is_skipped() {
    let mut data = vec![0.0f32; 80];
    data[1] = f32::NAN;
    data[5] = 9.0;
    for s in supported() {
      assert_eq!(s.argmax(&data), (5, 9.0), "strategy {}", s);
    }

    data[0] = f32::NAN;
    for s in supported() {
      let (index, value) = s.argmax(&data);
      assert_eq!(index, 0, "strategy {}", s);
      assert!(value.is_nan());
    }
  }

  #[test]
  fn odd_lengths_use_tail() {
    let data = [0.1f32, 0.2, 0.3, 0.4, 0.5, 0.9, 0.9];
    for s in supported() {
      assert_eq!(s.argmax(&data), (5, 0.9));
      assert_eq!(s.argmax(&data[..3]), (2, 0.3));
    }
  }

  #[test]
  fn parse_names() {
    assert_eq!("scalar".parse::<ArgmaxStrategy>().unwrap(), ArgmaxStrategy::Scalar);
    assert_eq!("SSE41".parse::<ArgmaxStrategy>().unwrap(), ArgmaxStrategy::Sse41);
    assert_eq!("neon".parse::<ArgmaxStrategy>().unwrap(), ArgmaxStrategy::Neon);
    assert!("avx512".parse::<ArgmaxStrategy>().is_err());
    assert!(ArgmaxStrategy::detect().is_supported());
  }
}
