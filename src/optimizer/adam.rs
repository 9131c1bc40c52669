/*
 * @Author       : 老董
 * @Date         : 2026-02-12 14:00:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-02 15:40:00
 * @Description  : Adam优化器实现，参考 Kingma & Ba (2014)：
 *                 https://arxiv.org/pdf/1412.6980v8.pdf
 *                 权重衰减项w参考AdamW（解耦式衰减），默认关闭。
 */

use super::base::{Optimizer, OptimizerState};
use super::clipper::ClipperKind;
use crate::errors::OptimizerError;
use crate::tensor::Tensor;
use ndarray::Zip;

/// 检查点中一阶矩估计的状态键
const KEY_MT: &str = "adam_mt";
/// 检查点中二阶矩估计的状态键
const KEY_VT: &str = "adam_vt";

/// Adam优化器
///
/// 逐元素更新规则（t在每次`update`开始时自增）：
/// - m = β1 * m + (1 - β1) * g
/// - v = β2 * v + (1 - β2) * g²
/// - `m_hat` = m / (1 - β1^t)
/// - `v_hat` = v / (1 - β2^t)
/// - θ = θ - η * ( `m_hat` / (√`v_hat` + ε) + w * θ )
///
/// 矩估计`mt`/`vt`与参数张量等长，首次`update`时惰性分配为全零；
/// 步数计数`t`随检查点一同持久化（偏差修正依赖它）。
#[derive(Debug, Clone)]
pub struct Adam {
    state: OptimizerState,
    /// β1（一阶矩衰减）
    beta1: f32,
    /// β2（二阶矩衰减）
    beta2: f32,
    /// 数值稳定项
    eps: f32,
    /// 权重衰减系数（AdamW风格，0表示关闭）
    w: f32,
    /// 一阶矩估计
    mt: Option<Tensor>,
    /// 二阶矩估计
    vt: Option<Tensor>,
    /// 步数计数
    t: u64,
}

impl Adam {
    /// 创建新的Adam优化器（β1/β2/ε默认0.9/0.999/1e-8，权重衰减关闭）
    pub const fn new(eta: f32, clipper: Option<ClipperKind>) -> Self {
        Self {
            state: OptimizerState::new(eta, clipper),
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            w: 0.0,
            mt: None,
            vt: None,
            t: 0,
        }
    }

    /// 获取一阶矩估计（用于调试和状态查询）
    pub const fn first_moment(&self) -> Option<&Tensor> {
        self.mt.as_ref()
    }

    /// 获取二阶矩估计（用于调试和状态查询）
    pub const fn second_moment(&self) -> Option<&Tensor> {
        self.vt.as_ref()
    }
}

impl Optimizer for Adam {
    fn name(&self) -> &'static str {
        "adam"
    }

    fn update(&mut self, params: &mut Tensor, grads: &mut Tensor) -> Result<(), OptimizerError> {
        self.state.prepare(params, grads)?;

        self.t += 1;

        let mt = self
            .mt
            .get_or_insert_with(|| Tensor::zeros(params.size()));
        let vt = self
            .vt
            .get_or_insert_with(|| Tensor::zeros(params.size()));
        for (name, m) in [("一阶矩", &*mt), ("二阶矩", &*vt)] {
            if !m.is_same_size(params) {
                return Err(OptimizerError::ShapeMismatch {
                    expected: params.size(),
                    got: m.size(),
                    message: format!("{name}估计张量与参数张量的元素数量不一致"),
                });
            }
        }

        let eta = self.state.learning_rate();
        let (beta1, beta2, eps, w) = (self.beta1, self.beta2, self.eps, self.w);

        // 偏差修正分母；t>=1时恒为正
        let bias1 = 1.0 - beta1.powi(self.t as i32);
        let bias2 = 1.0 - beta2.powi(self.t as i32);

        Zip::from(params.view_mut())
            .and(grads.view())
            .and(mt.view_mut())
            .and(vt.view_mut())
            .for_each(|p, &g, m, v| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                let m_hat = *m / bias1;
                let v_hat = *v / bias2;
                *p -= eta * (m_hat / (v_hat.sqrt() + eps) + w * *p);
            });
        Ok(())
    }

    /// 配置列表：`[beta1, beta2, eps, w]`（位置相关，后面的条目要求前面的在场）
    fn configure(&mut self, config: &[f32]) -> Result<(), OptimizerError> {
        if let Some(&beta1) = config.first() {
            if !(0.0..1.0).contains(&beta1) {
                return Err(OptimizerError::ConfigurationError {
                    name: "beta1",
                    value: beta1,
                    requirement: "必须在[0, 1)区间内",
                });
            }
            self.beta1 = beta1;
        }
        if let Some(&beta2) = config.get(1) {
            if !(0.0..1.0).contains(&beta2) {
                return Err(OptimizerError::ConfigurationError {
                    name: "beta2",
                    value: beta2,
                    requirement: "必须在[0, 1)区间内",
                });
            }
            self.beta2 = beta2;
        }
        if let Some(&eps) = config.get(2) {
            if eps <= 0.0 {
                return Err(OptimizerError::ConfigurationError {
                    name: "eps",
                    value: eps,
                    requirement: "必须大于0",
                });
            }
            self.eps = eps;
        }
        if let Some(&w) = config.get(3) {
            if w < 0.0 {
                return Err(OptimizerError::ConfigurationError {
                    name: "w",
                    value: w,
                    requirement: "不能为负",
                });
            }
            self.w = w;
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
        self.mt = None;
        self.vt = None;
        self.t = 0;
    }

    fn state_keys(&self) -> &'static [&'static str] {
        &[KEY_MT, KEY_VT]
    }

    fn timestep(&self) -> Option<u64> {
        Some(self.t)
    }

    fn set_timestep(&mut self, t: u64) {
        self.t = t;
    }

    fn pull(&self, key: &str) -> Result<Vec<f32>, OptimizerError> {
        match key {
            KEY_MT => Ok(self.mt.as_ref().map(Tensor::to_vec).unwrap_or_default()),
            KEY_VT => Ok(self.vt.as_ref().map(Tensor::to_vec).unwrap_or_default()),
            _ => Err(OptimizerError::UnknownStateKey(key.to_string())),
        }
    }

    fn push(&mut self, key: &str, data: &[f32]) -> Result<(), OptimizerError> {
        match key {
            // 空数据表示保存时矩估计尚未分配，恢复为未分配状态
            KEY_MT => {
                self.mt = (!data.is_empty()).then(|| Tensor::new(data));
                Ok(())
            }
            KEY_VT => {
                self.vt = (!data.is_empty()).then(|| Tensor::new(data));
                Ok(())
            }
            _ => Err(OptimizerError::UnknownStateKey(key.to_string())),
        }
    }
}
