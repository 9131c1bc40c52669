/*
 * @Author       : 老董
 * @Date         : 2026-02-10 10:05:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-02 15:40:00
 * @Description  : 一维张量。训练图里的全部可训练参数被摊平成一个连续的f32缓冲，
 *                 梯度张量与各类辅助状态（累积量、矩估计）都与其等长，
 *                 所以这里只需要一维的连续存储，不需要完整的多维张量库。
 */

use ndarray::{Array1, ArrayView1, ArrayViewMut1};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};


/// 一维f32张量（参数、梯度与优化器辅助状态的统一载体）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    data: Array1<f32>,
}

impl Tensor {
    /// 用给定数据创建张量
    pub fn new(data: &[f32]) -> Self {
        Self {
            data: Array1::from_vec(data.to_vec()),
        }
    }

    /// 创建一个全零张量
    pub fn zeros(size: usize) -> Self {
        Self {
            data: Array1::zeros(size),
        }
    }

    /// 创建一个值在[min, max]闭区间内的随机张量（固定种子，保证测试可重复）
    pub fn new_random_seeded(min: f32, max: f32, size: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let uniform = Uniform::from(min..=max);
        let data = (0..size).map(|_| uniform.sample(&mut rng)).collect();
        Self {
            data: Array1::from_vec(data),
        }
    }

    /// 张量中元素的数量
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 判断两个张量的元素数量是否一致
    pub fn is_same_size(&self, other: &Self) -> bool {
        self.size() == other.size()
    }

    pub fn view(&self) -> ArrayView1<'_, f32> {
        self.data.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut1<'_, f32> {
        self.data.view_mut()
    }

    /// 以切片形式访问底层数据
    pub fn as_slice(&self) -> &[f32] {
        self.data.as_slice().unwrap()
    }

    /// 拷贝出底层数据
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.to_vec()
    }

    /// L2范数（用于按范数的梯度裁剪）
    pub fn l2_norm(&self) -> f32 {
        self.data.dot(&self.data).sqrt()
    }
}
