// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input.rs - 图像文件输入
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

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, url_path};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像加载错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

/// 单张图像输入，作为迭代器只产出一帧
#[derive(Debug)]
pub struct ImageFileInput {
  path: PathBuf,
  image: Option<RgbImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemeMismatch(url.scheme().to_string()));
    }
    Self::open(url_path(url))
  }
}

impl ImageFileInput {
  pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, ImageFileInputError> {
    let path = path.into();
    let image = ImageReader::open(&path)?.decode()?.into_rgb8();
    debug!(
      "读取图像: {} ({}x{})",
      path.display(),
      image.width(),
      image.height()
    );
    Ok(Self {
      path,
      image: Some(image),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// 不含扩展名的文件名，用于生成结果文件名
  pub fn stem(&self) -> String {
    file_stem(&self.path)
  }
}

pub fn file_stem(path: &Path) -> String {
  path
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default()
}

impl Iterator for ImageFileInput {
  type Item = RgbImage;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn reads_single_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dog.png");
    RgbImage::from_pixel(5, 3, Rgb([1, 2, 3])).save(&path).unwrap();

    let url = Url::from_file_path(&path).unwrap();
    let url = Url::parse(&format!("image:{}", url.path())).unwrap();
    let mut input = ImageFileInput::from_url(&url).unwrap();
    assert_eq!(input.stem(), "dog");

    let frame = input.next().unwrap();
    assert_eq!(frame.dimensions(), (5, 3));
    assert_eq!(frame.get_pixel(4, 2), &Rgb([1, 2, 3]));
    assert!(input.next().is_none());
  }

  #[test]
  fn rejects_other_scheme() {
    let url = Url::parse("v4l2:///dev/video0").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemeMismatch(_))
    ));
  }

  #[test]
  fn stem_without_extension() {
    assert_eq!(file_stem(Path::new("/data/images/bus.jpg")), "bus");
    assert_eq!(file_stem(Path::new("noext")), "noext");
  }
}
