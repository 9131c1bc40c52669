/*
 * @Author       : 老董
 * @Date         : 2026-02-12 09:30:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-02-12 09:30:00
 * @Description  : 梯度裁剪器。在优化器的算术更新之前对梯度张量做原地重缩放，
 *                 用于限制梯度幅值；裁剪器由优化器在构造时独占持有。
 */

use crate::errors::OptimizerError;
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
#[derive(Debug, Clone)]
pub enum ClipperKind {
    Elementwise(ElementwiseClipper),
    Norm(NormClipper),
}

/// 梯度裁剪接口：原地重缩放梯度张量
#[enum_dispatch(ClipperKind)]
pub trait Clipper {
    fn clip(&self, grads: &mut Tensor);
}

/// 逐元素裁剪：把每个元素钳制到[-c, c]区间
#[derive(Debug, Clone)]
pub struct ElementwiseClipper {
    c: f32,
}

impl ElementwiseClipper {
    pub fn new(c: f32) -> Result<Self, OptimizerError> {
        if c <= 0.0 {
            return Err(OptimizerError::ConfigurationError {
                name: "clip",
                value: c,
                requirement: "裁剪阈值必须大于0",
            });
        }
        Ok(Self { c })
    }
}

impl Clipper for ElementwiseClipper {
    fn clip(&self, grads: &mut Tensor) {
        let c = self.c;
        grads.view_mut().mapv_inplace(|g| g.clamp(-c, c));
    }
}

/// 按范数裁剪：当L2范数超过c时，整体缩放到范数恰为c
#[derive(Debug, Clone)]
pub struct NormClipper {
    c: f32,
}

impl NormClipper {
    pub fn new(c: f32) -> Result<Self, OptimizerError> {
        if c <= 0.0 {
            return Err(OptimizerError::ConfigurationError {
                name: "clip-norm",
                value: c,
                requirement: "裁剪阈值必须大于0",
            });
        }
        Ok(Self { c })
    }
}

impl Clipper for NormClipper {
    fn clip(&self, grads: &mut Tensor) {
        let norm = grads.l2_norm();
        if norm > self.c {
            let factor = self.c / norm;
            grads.view_mut().mapv_inplace(|g| g * factor);
        }
    }
}
