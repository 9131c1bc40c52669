/*
 * @Author       : 老董
 * @Date         : 2026-02-11 14:20:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-02-11 14:20:00
 * @Description  : 训练进度状态。由训练循环维护并在轮次/批次边界、训练停滞等
 *                 时机传给优化器的生命周期回调；优化器从中采用当前学习率，
 *                 并在reset被置位时清空内部统计。
 */

use serde::{Deserialize, Serialize};

/// 训练进度状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingState {
    /// 已完成的轮次数
    pub epochs: usize,
    /// 已处理的批次数
    pub batches: usize,
    /// 验证指标已停滞的次数
    pub stalled: usize,
    /// 当前学习率（可能被学习率调度改写）
    pub eta: f32,
    /// 请求优化器清空内部统计（如停滞后回退重来）
    pub reset: bool,
}

impl TrainingState {
    /// 以初始学习率创建训练状态
    pub fn new(eta: f32) -> Self {
        Self {
            epochs: 0,
            batches: 0,
            stalled: 0,
            eta,
            reset: false,
        }
    }
}
