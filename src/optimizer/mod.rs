/*
 * @Author       : 老董
 * @Date         : 2026-02-12 09:00:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-02 15:40:00
 * @Description  : 优化器模块：共享的更新/持久化契约与各算法实现
 */

mod adagrad;
mod adam;
mod base;
pub mod checkpoint;
mod clipper;
mod sgd;

pub use adagrad::Adagrad;
pub use adam::Adam;
pub use base::{Optimizer, OptimizerKind};
pub use clipper::{Clipper, ClipperKind, ElementwiseClipper, NormClipper};
pub use sgd::Sgd;

use crate::errors::OptimizerError;

/// 按算法名创建优化器并应用位置化配置列表
///
/// 支持的算法名："sgd"、"adagrad"、"adam"。
pub fn create_optimizer(
    algorithm: &str,
    eta: f32,
    clipper: Option<ClipperKind>,
    config: &[f32],
) -> Result<OptimizerKind, OptimizerError> {
    let mut opt: OptimizerKind = match algorithm {
        "sgd" => Sgd::new(eta, clipper).into(),
        "adagrad" => Adagrad::new(eta, clipper).into(),
        "adam" => Adam::new(eta, clipper).into(),
        _ => return Err(OptimizerError::UnknownAlgorithm(algorithm.to_string())),
    };
    opt.configure(config)?;
    log::debug!("已创建{algorithm}优化器，学习率={eta}");
    Ok(opt)
}
