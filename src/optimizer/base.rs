/*
 * @Author       : 老董
 * @Date         : 2026-02-12 10:00:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-02 15:40:00
 * @Description  : 优化器核心trait与共享状态结构
 */

use super::adagrad::Adagrad;
use super::adam::Adam;
use super::clipper::{Clipper, ClipperKind};
use super::sgd::Sgd;
use crate::errors::OptimizerError;
use crate::tensor::Tensor;
use crate::training::TrainingState;
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
#[derive(Debug, Clone)]
pub enum OptimizerKind {
    Sgd(Sgd),
    Adagrad(Adagrad),
    Adam(Adam),
}

/// 优化器核心 trait
///
/// 训练循环每步调用一次 `update`：先对梯度做原地裁剪（未配置裁剪器则跳过），
/// 再执行具体算法的算术更新。`update` 会改写参数张量与内部辅助状态，
/// 但不会改动学习率——学习率只经由生命周期回调或 `set_learning_rate` 变化。
#[enum_dispatch(OptimizerKind)]
pub trait Optimizer {
    /// 算法名（工厂与检查点校验用）
    fn name(&self) -> &'static str;

    /// 参数更新（使用已计算的梯度）
    ///
    /// 梯度张量只在本次调用期间被借用；裁剪在其上原地发生。
    fn update(&mut self, params: &mut Tensor, grads: &mut Tensor) -> Result<(), OptimizerError>;

    /// 应用位置化配置列表（各算法的条目含义见各自实现）
    ///
    /// 多余的条目静默忽略，缺失的条目保留默认值；
    /// 超出合法数值范围的条目返回 `ConfigurationError`。
    fn configure(&mut self, config: &[f32]) -> Result<(), OptimizerError>;

    /// 获取学习率
    fn learning_rate(&self) -> f32;

    /// 设置学习率
    fn set_learning_rate(&mut self, eta: f32);

    /// 清空内部累积状态（超参数保留，如同刚构造完）
    fn reset(&mut self);

    // ========== 训练生命周期回调 ==========

    /// 训练状态初始化时：采用当前学习率
    fn init(&mut self, state: &TrainingState) {
        self.set_learning_rate(state.eta);
    }

    /// 训练状态从检查点重载后：采用当前学习率
    fn act_after_loaded(&mut self, state: &TrainingState) {
        self.set_learning_rate(state.eta);
    }

    /// 轮次边界：采用当前学习率；若训练状态请求重置则清空内部统计
    fn act_after_epoch(&mut self, state: &TrainingState) {
        self.set_learning_rate(state.eta);
        if state.reset {
            self.reset();
        }
    }

    /// 批次数边界：采用当前学习率；若训练状态请求重置则清空内部统计
    fn act_after_batches(&mut self, state: &TrainingState) {
        self.set_learning_rate(state.eta);
        if state.reset {
            self.reset();
        }
    }

    /// 训练停滞时：采用当前学习率；若训练状态请求重置则清空内部统计
    fn act_after_stalled(&mut self, state: &TrainingState) {
        self.set_learning_rate(state.eta);
        if state.reset {
            self.reset();
        }
    }

    // ========== 检查点协议（按设备分片gather/scatter，见checkpoint模块）==========

    /// 需要持久化的状态张量键，顺序固定
    fn state_keys(&self) -> &'static [&'static str] {
        &[]
    }

    /// 当前步数计数（仅带偏差修正的算法返回Some）
    fn timestep(&self) -> Option<u64> {
        None
    }

    /// 恢复步数计数
    fn set_timestep(&mut self, _t: u64) {}

    /// 拉取本分片上名为`key`的状态张量数据（保存时按设备序号依次调用）
    fn pull(&self, key: &str) -> Result<Vec<f32>, OptimizerError> {
        Err(OptimizerError::UnknownStateKey(key.to_string()))
    }

    /// 把恢复的数据推送到本分片（加载时按设备序号依次调用）
    fn push(&mut self, key: &str, _data: &[f32]) -> Result<(), OptimizerError> {
        Err(OptimizerError::UnknownStateKey(key.to_string()))
    }
}

/// 各算法共享的基础状态（内部实现，不对外暴露）
#[derive(Debug, Clone)]
pub(crate) struct OptimizerState {
    /// 学习率
    eta: f32,
    /// 梯度裁剪器（构造时决定，之后不可更换）
    clipper: Option<ClipperKind>,
}

impl OptimizerState {
    pub(crate) const fn new(eta: f32, clipper: Option<ClipperKind>) -> Self {
        Self { eta, clipper }
    }

    /// 获取学习率
    pub(crate) const fn learning_rate(&self) -> f32 {
        self.eta
    }

    /// 设置学习率
    pub(crate) const fn set_learning_rate(&mut self, eta: f32) {
        self.eta = eta;
    }

    /// 算术更新前的公共步骤：形状校验 + 原地梯度裁剪
    pub(crate) fn prepare(
        &self,
        params: &Tensor,
        grads: &mut Tensor,
    ) -> Result<(), OptimizerError> {
        if !params.is_same_size(grads) {
            return Err(OptimizerError::ShapeMismatch {
                expected: params.size(),
                got: grads.size(),
                message: "参数张量与梯度张量的元素数量不一致".to_string(),
            });
        }
        if let Some(clipper) = &self.clipper {
            clipper.clip(grads);
        }
        Ok(())
    }
}
