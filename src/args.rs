// 该文件是 Shanan （山南西风） 项目的一部分。
// src/args.rs - 命令行参数
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

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use shanan_yolov5::{
  model::{YOLOV5_INPUT_H, YOLOV5_INPUT_W, YOLOV5_NMS_THRESH, YOLOV5_OBJECT_THRESH},
  postprocess::{ArgmaxStrategy, PostprocessConfig},
};

/// YOLOv5 检测后处理
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入图像，例如 image:dog.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 三个检测头的原始输出（小端 f32），按 80、40、20 网格的顺序
  #[arg(long, value_name = "FILE", num_args = 3, required = true)]
  pub tensors: Vec<PathBuf>,

  /// 类别名称来源: builtin:coco 或 labels:<path>
  #[arg(long, value_name = "LABELS", default_value = "builtin:coco")]
  pub labels: Url,

  /// 点阵字模 (P6 PPM)
  #[arg(long, value_name = "FILE", default_value = "font32.ppm")]
  pub font: PathBuf,

  /// 输出路径，缺省为 image:results/<输入文件名>.bmp
  #[arg(long, value_name = "OUTPUT")]
  pub output: Option<Url>,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = YOLOV5_OBJECT_THRESH, value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = YOLOV5_NMS_THRESH, value_name = "THRESHOLD")]
  pub nms_threshold: f32,

  #[arg(long, default_value_t = YOLOV5_INPUT_W, value_name = "PIXELS")]
  pub net_width: u32,

  #[arg(long, default_value_t = YOLOV5_INPUT_H, value_name = "PIXELS")]
  pub net_height: u32,

  /// 缩放时不保持宽高比
  #[arg(long)]
  pub no_keep_aspect: bool,

  /// argmax 实现: auto, scalar, sse41, neon
  #[arg(long, default_value = "auto", value_name = "STRATEGY")]
  pub argmax: ArgmaxStrategy,

  /// 同时写出 <输出文件名>.txt 检测记录
  #[arg(long)]
  pub record: bool,

  /// 以 JSON 行输出检测结果
  #[arg(long)]
  pub json: bool,
}

impl Args {
  pub fn postprocess_config(&self) -> PostprocessConfig {
    PostprocessConfig::default()
      .with_conf_threshold(self.confidence)
      .with_nms_threshold(self.nms_threshold)
      .with_network_size(self.net_width, self.net_height)
      .with_argmax(self.argmax)
  }

  pub fn output_url(&self, stem: &str) -> Result<Url, url::ParseError> {
    match &self.output {
      Some(url) => Ok(url.clone()),
      None => Url::parse(&format!("image:results/{}.bmp", stem)),
    }
  }
}
