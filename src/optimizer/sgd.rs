/*
 * @Author       : 老董
 * @Date         : 2026-02-12 11:00:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-02-12 11:00:00
 * @Description  : 随机梯度下降优化器
 */

use super::base::{Optimizer, OptimizerState};
use super::clipper::ClipperKind;
use crate::errors::OptimizerError;
use crate::tensor::Tensor;
use ndarray::Zip;

/// SGD（随机梯度下降）优化器
///
/// 更新规则：θ = θ - η * ∇θ。无累积状态，无配置项，检查点中无内容。
#[derive(Debug, Clone)]
pub struct Sgd {
    state: OptimizerState,
}

impl Sgd {
    /// 创建新的SGD优化器
    pub const fn new(eta: f32, clipper: Option<ClipperKind>) -> Self {
        Self {
            state: OptimizerState::new(eta, clipper),
        }
    }
}

impl Optimizer for Sgd {
    fn name(&self) -> &'static str {
        "sgd"
    }

    fn update(&mut self, params: &mut Tensor, grads: &mut Tensor) -> Result<(), OptimizerError> {
        self.state.prepare(params, grads)?;

        let eta = self.state.learning_rate();
        Zip::from(params.view_mut())
            .and(grads.view())
            .for_each(|p, &g| *p -= eta * g);
        Ok(())
    }

    fn configure(&mut self, _config: &[f32]) -> Result<(), OptimizerError> {
        // SGD无配置项，列表内容按约定静默忽略
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.state.learning_rate()
    }

    fn set_learning_rate(&mut self, eta: f32) {
        self.state.set_learning_rate(eta);
    }

    fn reset(&mut self) {
        // SGD无累积状态
    }
}
