//! # Only NMT
//!
//! `only_nmt`项目旨在用纯rust实现神经机器翻译（NMT）训练框架中的两块独立组件：
//! 一是基于梯度的参数优化器（SGD、Adagrad、Adam），含梯度裁剪、训练生命周期回调
//! 与跨设备分片的检查点保存/恢复；二是对接外部解码框架的插件边界（`NmtPlugin`），
//! 只做参数转发，不含解码算法本身。
//!

pub mod errors;
pub mod optimizer;
pub mod plugin;
pub mod tensor;
pub mod training;
