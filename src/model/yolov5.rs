// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/yolov5.rs - YOLOv5 检测头常量
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

pub const YOLOV5_CLASS_NUM: usize = 80;
/// 4 个框参数 + 1 个目标置信度 + 80 个类别
pub const YOLOV5_CHANNELS: usize = 5 + YOLOV5_CLASS_NUM;
pub const YOLOV5_SCALE_NUM: usize = 3;
pub const YOLOV5_ANCHOR_NUM: usize = 3;
/// 每个检测头的网格尺寸 (map_h, map_w)
pub const YOLOV5_HEAD_SIZES: [(usize, usize); YOLOV5_SCALE_NUM] = [(80, 80), (40, 40), (20, 20)];
/// 锚框先验 (w, h)，单位为网络输入像素，按 [scale][anchor] 索引
pub const YOLOV5_ANCHORS: [[(f32, f32); YOLOV5_ANCHOR_NUM]; YOLOV5_SCALE_NUM] = [
  [(10.0, 13.0), (16.0, 30.0), (33.0, 23.0)],
  [(30.0, 61.0), (62.0, 45.0), (59.0, 119.0)],
  [(116.0, 90.0), (156.0, 198.0), (373.0, 326.0)],
];
pub const YOLOV5_BOX_NUM: usize = YOLOV5_ANCHOR_NUM * (80 * 80 + 40 * 40 + 20 * 20);

pub const YOLOV5_INPUT_W: u32 = 640;
pub const YOLOV5_INPUT_H: u32 = 640;
pub const YOLOV5_OBJECT_THRESH: f32 = 0.5;
pub const YOLOV5_NMS_THRESH: f32 = 0.6;
/// 标签文字相对字体字形尺寸的缩放
pub const YOLOV5_LABEL_SCALE: f32 = 0.5;

/// 单个检测头原始输出的 f32 元素个数
pub const fn head_len(scale: usize) -> usize {
  let (map_h, map_w) = YOLOV5_HEAD_SIZES[scale];
  YOLOV5_ANCHOR_NUM * map_h * map_w * YOLOV5_CHANNELS
}

/// COCO 数据集类别名称
pub const COCO_CLASSES: [&str; YOLOV5_CLASS_NUM] = [
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "backpack",
  "umbrella",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "dining table",
  "toilet",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];
