// 该文件是 Shanan （山南西风） 项目的一部分。
// src/main.rs - 命令行入口
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

mod args;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use shanan_yolov5::{
  FromUrl,
  input::ImageFileInput,
  label::{LabelResolver, Labels},
  output::{BitmapFont, Record, Render, SaveImageFileBuilder, to_json},
  pipeline::Pipeline,
  postprocess::RawOutput,
  preprocess::ResizeInfo,
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("输入来源: {}", args.input);
  info!("类别名称: {}", args.labels);
  info!("置信度阈值: {}", args.confidence);
  info!("NMS 阈值: {}", args.nms_threshold);
  info!("argmax 实现: {}", args.argmax);

  let input = ImageFileInput::from_url(&args.input)?;
  let output_url = args.output_url(&input.stem())?;
  info!("输出路径: {}", output_url);

  let labels: Arc<dyn LabelResolver + Send + Sync> = Arc::new(Labels::from_url(&args.labels)?);
  let font = Arc::new(BitmapFont::load(&args.font)?);
  let pipeline = Pipeline::new(args.postprocess_config(), labels.clone(), font);

  let mut builder = SaveImageFileBuilder::from_url(&output_url)?;
  if args.record {
    builder = builder.record(Record::default());
  }
  let output = builder.build(pipeline.draw().clone(), labels);

  let raw = RawOutput::load(&args.tensors)?;

  for frame in input {
    let (width, height) = frame.dimensions();
    let resize = ResizeInfo::new(
      width,
      height,
      args.net_width,
      args.net_height,
      !args.no_keep_aspect,
    )?;

    let now = std::time::Instant::now();
    let result = pipeline.detect(&raw.view(), &resize)?;
    info!(
      "后处理完成，耗时: {:.2?}，检测到 {} 个目标",
      now.elapsed(),
      result.len()
    );

    for line in pipeline.report_lines(&result)? {
      println!("{}", line);
    }
    if args.json {
      for value in to_json(&result, pipeline.labels().as_ref())? {
        println!("{}", value);
      }
    }

    output.render_result(&frame, &result)?;
  }

  Ok(())
}
