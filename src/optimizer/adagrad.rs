/*
 * @Author       : 老董
 * @Date         : 2026-02-12 11:30:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-02 15:40:00
 * @Description  : Adagrad优化器实现，参考 Duchi et al. (2011)：
 *                 http://www.jmlr.org/papers/volume12/duchi11a/duchi11a.pdf
 */

use super::base::{Optimizer, OptimizerState};
use super::clipper::ClipperKind;
use crate::errors::OptimizerError;
use crate::tensor::Tensor;
use ndarray::Zip;

/// 检查点中累积量的状态键
const KEY_GT: &str = "adagrad_gt";

/// Adagrad优化器
///
/// 逐元素更新规则：
/// - gt += g²
/// - θ = θ - η * g / (√gt + ε)
///
/// 累积量`gt`与参数张量等长，首次`update`时惰性分配为全零。
#[derive(Debug, Clone)]
pub struct Adagrad {
    state: OptimizerState,
    /// 数值稳定项，配置列表第1项可覆盖
    eps: f32,
    /// 累积的梯度平方和
    gt: Option<Tensor>,
}

impl Adagrad {
    /// 创建新的Adagrad优化器（ε默认1e-8）
    pub const fn new(eta: f32, clipper: Option<ClipperKind>) -> Self {
        Self {
            state: OptimizerState::new(eta, clipper),
            eps: 1e-8,
            gt: None,
        }
    }

    /// 获取累积量（用于调试和状态查询）
    pub const fn accumulator(&self) -> Option<&Tensor> {
        self.gt.as_ref()
    }
}

impl Optimizer for Adagrad {
    fn name(&self) -> &'static str {
        "adagrad"
    }

    fn update(&mut self, params: &mut Tensor, grads: &mut Tensor) -> Result<(), OptimizerError> {
        self.state.prepare(params, grads)?;

        let gt = self
            .gt
            .get_or_insert_with(|| Tensor::zeros(params.size()));
        if !gt.is_same_size(params) {
            return Err(OptimizerError::ShapeMismatch {
                expected: params.size(),
                got: gt.size(),
                message: "累积量张量与参数张量的元素数量不一致".to_string(),
            });
        }

        let eta = self.state.learning_rate();
        let eps = self.eps;
        Zip::from(params.view_mut())
            .and(grads.view())
            .and(gt.view_mut())
            .for_each(|p, &g, a| {
                *a += g * g;
                *p -= eta * g / (a.sqrt() + eps);
            });
        Ok(())
    }

    /// 配置列表：`[eps]`
    fn configure(&mut self, config: &[f32]) -> Result<(), OptimizerError> {
        if let Some(&eps) = config.first() {
            if eps <= 0.0 {
                return Err(OptimizerError::ConfigurationError {
                    name: "eps",
                    value: eps,
                    requirement: "必须大于0",
                });
            }
            self.eps = eps;
        }
        // 多余的条目按约定静默忽略
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.state.learning_rate()
    }

    fn set_learning_rate(&mut self, eta: f32) {
        self.state.set_learning_rate(eta);
    }

    fn reset(&mut self) {
        self.gt = None;
    }

    fn state_keys(&self) -> &'static [&'static str] {
        &[KEY_GT]
    }

    fn pull(&self, key: &str) -> Result<Vec<f32>, OptimizerError> {
        match key {
            KEY_GT => Ok(self.gt.as_ref().map(Tensor::to_vec).unwrap_or_default()),
            _ => Err(OptimizerError::UnknownStateKey(key.to_string())),
        }
    }

    fn push(&mut self, key: &str, data: &[f32]) -> Result<(), OptimizerError> {
        match key {
            // 空数据表示保存时累积量尚未分配，恢复为未分配状态
            KEY_GT => {
                self.gt = (!data.is_empty()).then(|| Tensor::new(data));
                Ok(())
            }
            _ => Err(OptimizerError::UnknownStateKey(key.to_string())),
        }
    }
}
