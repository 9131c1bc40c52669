/*
 * @Author       : 老董
 * @Date         : 2026-02-10 09:12:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-02 15:40:00
 * @Description  : 优化器模块的错误类型
 */

use thiserror::Error;

/// 优化器操作错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    // 配置列表中的项超出合法数值范围
    #[error("配置项`{name}`非法：值为{value}（要求{requirement}）")]
    ConfigurationError {
        name: &'static str,
        value: f32,
        requirement: &'static str,
    },

    // 参数/梯度/辅助状态的元素数量不一致
    #[error("形状不匹配：期望{expected}个元素，实际{got}个（{message}）")]
    ShapeMismatch {
        expected: usize,
        got: usize,
        message: String,
    },

    #[error("检查点错误: {0}")]
    CheckpointError(String),

    #[error("未知的优化器算法: {0}")]
    UnknownAlgorithm(String),

    #[error("未知的状态键: {0}")]
    UnknownStateKey(String),
}
