/*
 * @Author       : 老董
 * @Date         : 2026-02-13 09:00:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-02 15:40:00
 * @Description  : 优化器检查点的保存/加载（跨设备分片的gather/scatter）
 *
 * 数据并行训练中每个计算设备持有一个优化器实例，各实例只拥有自己分片的
 * 辅助状态。保存时按设备序号依次拉取各分片并拼接成扁平数组；加载时按保存
 * 时记录的分片布局把扁平数组切回各设备。拉取/推送都同步按序进行，保证
 * 切片摆放是确定的。
 *
 * 文件布局（双文件）：
 * - `{path}.json`: 元信息（算法名、分片布局、步数计数），可读
 * - `{path}.bin`:  魔数 + 版本 + bincode编码的状态数组，紧凑
 */

use super::base::Optimizer;
use crate::errors::OptimizerError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// 检查点二进制文件魔数
const CHECKPOINT_MAGIC: &[u8; 4] = b"ONCP";
/// 检查点二进制文件版本
const CHECKPOINT_VERSION: u32 = 1;

/// 在路径末尾追加扩展名（不替换已有扩展名，带点的检查点名各自独立）
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}

/// 检查点元信息
#[derive(Debug, Serialize, Deserialize)]
struct CheckpointMeta {
    /// 算法名（加载时校验）
    algorithm: String,
    /// 设备分片数量
    shards: usize,
    /// 各分片状态张量的元素数量（无状态算法时为空）
    shard_sizes: Vec<usize>,
    /// 步数计数（只有主进程写入，见`save`）
    step: Option<u64>,
}

/// 保存优化器检查点
///
/// `shards`为各设备的优化器实例，按设备序号排列。对每个状态键依次拉取
/// 各分片的切片并拼接；步数计数只在`is_main_process`为真时写入——多进程
/// 保存时该标量只应由一个进程负责，避免重复。
pub fn save<O, P>(path: P, shards: &[O], is_main_process: bool) -> Result<(), OptimizerError>
where
    O: Optimizer,
    P: AsRef<Path>,
{
    let first = shards
        .first()
        .ok_or_else(|| OptimizerError::CheckpointError("没有可保存的优化器分片".to_string()))?;

    // 按设备序号同步拉取各分片，保证切片顺序确定
    let mut shard_sizes: Vec<usize> = Vec::new();
    let mut payload: Vec<(String, Vec<f32>)> = Vec::new();
    for (key_index, &key) in first.state_keys().iter().enumerate() {
        let mut flat = Vec::new();
        for (device_index, shard) in shards.iter().enumerate() {
            let part = shard.pull(key)?;
            if key_index == 0 {
                shard_sizes.push(part.len());
            } else if part.len() != shard_sizes[device_index] {
                return Err(OptimizerError::ShapeMismatch {
                    expected: shard_sizes[device_index],
                    got: part.len(),
                    message: format!("设备{device_index}上状态`{key}`的分片大小与其它状态不一致"),
                });
            }
            flat.extend(part);
        }
        payload.push((key.to_string(), flat));
    }

    let meta = CheckpointMeta {
        algorithm: first.name().to_string(),
        shards: shards.len(),
        shard_sizes,
        step: if is_main_process {
            first.timestep()
        } else {
            None
        },
    };

    let path = path.as_ref();
    let json_path = append_extension(path, "json");
    let bin_path = append_extension(path, "bin");

    let json = serde_json::to_string_pretty(&meta)
        .map_err(|e| OptimizerError::CheckpointError(format!("序列化检查点元信息失败: {e}")))?;
    std::fs::write(&json_path, json)
        .map_err(|e| OptimizerError::CheckpointError(format!("写入检查点元信息失败: {e}")))?;

    let file = File::create(&bin_path)
        .map_err(|e| OptimizerError::CheckpointError(format!("无法创建检查点文件: {e}")))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(CHECKPOINT_MAGIC)
        .map_err(|e| OptimizerError::CheckpointError(format!("写入魔数失败: {e}")))?;
    writer
        .write_all(&CHECKPOINT_VERSION.to_le_bytes())
        .map_err(|e| OptimizerError::CheckpointError(format!("写入版本失败: {e}")))?;
    bincode::serialize_into(&mut writer, &payload)
        .map_err(|e| OptimizerError::CheckpointError(format!("序列化优化器状态失败: {e}")))?;

    debug!(
        "已保存{}优化器检查点到 {}（{}个分片）",
        meta.algorithm,
        path.display(),
        meta.shards
    );
    Ok(())
}

/// 加载优化器检查点
///
/// 校验算法名与分片布局后，把每个状态数组按保存时记录的各分片大小切开，
/// 按设备序号依次推送；若检查点带有步数计数，则恢复到每个分片上。
pub fn load<O, P>(path: P, shards: &mut [O]) -> Result<(), OptimizerError>
where
    O: Optimizer,
    P: AsRef<Path>,
{
    let first = shards
        .first()
        .ok_or_else(|| OptimizerError::CheckpointError("没有可恢复的优化器分片".to_string()))?;

    let path = path.as_ref();
    let json_path = append_extension(path, "json");
    let bin_path = append_extension(path, "bin");

    let json = std::fs::read_to_string(&json_path)
        .map_err(|e| OptimizerError::CheckpointError(format!("读取检查点元信息失败: {e}")))?;
    let meta: CheckpointMeta = serde_json::from_str(&json)
        .map_err(|e| OptimizerError::CheckpointError(format!("解析检查点元信息失败: {e}")))?;

    if meta.algorithm != first.name() {
        return Err(OptimizerError::CheckpointError(format!(
            "检查点算法不匹配：期望`{}`，检查点为`{}`",
            first.name(),
            meta.algorithm
        )));
    }
    if meta.shards != shards.len() {
        return Err(OptimizerError::ShapeMismatch {
            expected: meta.shards,
            got: shards.len(),
            message: "检查点的分片数量与当前设备数不一致".to_string(),
        });
    }

    let file = File::open(&bin_path)
        .map_err(|e| OptimizerError::CheckpointError(format!("无法打开检查点文件: {e}")))?;
    let mut reader = BufReader::new(file);
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|e| OptimizerError::CheckpointError(format!("读取魔数失败: {e}")))?;
    if &magic != CHECKPOINT_MAGIC {
        return Err(OptimizerError::CheckpointError(
            "检查点文件魔数不匹配".to_string(),
        ));
    }
    let mut version = [0u8; 4];
    reader
        .read_exact(&mut version)
        .map_err(|e| OptimizerError::CheckpointError(format!("读取版本失败: {e}")))?;
    let version = u32::from_le_bytes(version);
    if version != CHECKPOINT_VERSION {
        return Err(OptimizerError::CheckpointError(format!(
            "不支持的检查点版本: {version}"
        )));
    }
    let payload: Vec<(String, Vec<f32>)> = bincode::deserialize_from(&mut reader)
        .map_err(|e| OptimizerError::CheckpointError(format!("反序列化优化器状态失败: {e}")))?;

    let total: usize = meta.shard_sizes.iter().sum();
    for (key, flat) in &payload {
        if flat.len() != total {
            return Err(OptimizerError::ShapeMismatch {
                expected: total,
                got: flat.len(),
                message: format!("状态`{key}`的元素数量与分片布局不一致"),
            });
        }
        // 按设备序号同步推送各切片，与保存时的拼接顺序一一对应
        let mut offset = 0;
        for (device_index, shard) in shards.iter_mut().enumerate() {
            let size = meta.shard_sizes[device_index];
            shard.push(key, &flat[offset..offset + size])?;
            offset += size;
        }
    }

    if let Some(t) = meta.step {
        for shard in shards.iter_mut() {
            shard.set_timestep(t);
        }
    }

    debug!(
        "已从 {} 恢复{}优化器检查点（{}个分片）",
        path.display(),
        meta.algorithm,
        meta.shards
    );
    Ok(())
}
