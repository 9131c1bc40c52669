/*
 * @Author       : 老董
 * @Date         : 2026-02-21 10:00:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-02 15:40:00
 * @Description  : 优化器检查点的保存/恢复集成测试：单分片回程、多分片布局、
 *                 主进程标志对步数计数的门控，以及各类不匹配的拒绝
 */

use only_nmt::errors::OptimizerError;
use only_nmt::optimizer::{checkpoint, create_optimizer, Adagrad, Adam, Optimizer};
use only_nmt::tensor::Tensor;
use std::path::PathBuf;

/// 生成互不冲突的临时检查点路径
fn checkpoint_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("only_nmt_{}_{}", std::process::id(), name))
}

/// 清理检查点的双文件
fn remove_checkpoint(path: &PathBuf) {
    let _ = std::fs::remove_file(format!("{}.json", path.display()));
    let _ = std::fs::remove_file(format!("{}.bin", path.display()));
}

#[test]
fn test_adagrad_single_shard_roundtrip() {
    let path = checkpoint_path("adagrad_roundtrip");

    // 先训练几步，让累积量有内容
    let mut opt = Adagrad::new(0.1, None);
    let mut params = Tensor::new_random_seeded(-1.0, 1.0, 8, 11);
    for step in 0..3 {
        let mut grads = Tensor::new_random_seeded(-0.5, 0.5, 8, 100 + step);
        opt.update(&mut params, &mut grads).unwrap();
    }

    checkpoint::save(&path, std::slice::from_ref(&opt), true).unwrap();

    let mut restored = Adagrad::new(0.1, None);
    checkpoint::load(&path, std::slice::from_mut(&mut restored)).unwrap();
    assert_eq!(restored.accumulator(), opt.accumulator());

    // 回程不变量：恢复后的实例对相同的后续梯度产生逐元素一致的更新
    let mut p_original = params.clone();
    let mut p_restored = params.clone();
    for step in 0..2 {
        let mut g1 = Tensor::new_random_seeded(-0.5, 0.5, 8, 200 + step);
        let mut g2 = g1.clone();
        opt.update(&mut p_original, &mut g1).unwrap();
        restored.update(&mut p_restored, &mut g2).unwrap();
        assert_eq!(p_original, p_restored);
    }

    remove_checkpoint(&path);
}

#[test]
fn test_adam_roundtrip_preserves_timestep_and_moments() {
    let path = checkpoint_path("adam_roundtrip");

    let mut opt = Adam::new(0.01, None);
    let mut params = Tensor::new_random_seeded(-1.0, 1.0, 6, 21);
    for step in 0..3 {
        let mut grads = Tensor::new_random_seeded(-0.5, 0.5, 6, 300 + step);
        opt.update(&mut params, &mut grads).unwrap();
    }
    assert_eq!(opt.timestep(), Some(3));

    checkpoint::save(&path, std::slice::from_ref(&opt), true).unwrap();

    let mut restored = Adam::new(0.01, None);
    checkpoint::load(&path, std::slice::from_mut(&mut restored)).unwrap();
    assert_eq!(restored.timestep(), Some(3));
    assert_eq!(restored.first_moment(), opt.first_moment());
    assert_eq!(restored.second_moment(), opt.second_moment());

    // 偏差修正依赖步数计数，恢复后的后续更新必须与原实例逐元素一致
    let mut p_original = params.clone();
    let mut p_restored = params.clone();
    let mut g1 = Tensor::new_random_seeded(-0.5, 0.5, 6, 400);
    let mut g2 = g1.clone();
    opt.update(&mut p_original, &mut g1).unwrap();
    restored.update(&mut p_restored, &mut g2).unwrap();
    assert_eq!(p_original, p_restored);

    remove_checkpoint(&path);
}

#[test]
fn test_non_main_process_save_skips_step_counter() {
    let path = checkpoint_path("adam_non_main");

    let mut opt = Adam::new(0.01, None);
    let mut params = Tensor::new(&[1.0, -1.0]);
    for _ in 0..2 {
        opt.update(&mut params, &mut Tensor::new(&[0.1, 0.2]))
            .unwrap();
    }

    // 非主进程：张量状态照常写出，标量步数计数不写
    checkpoint::save(&path, std::slice::from_ref(&opt), false).unwrap();

    let mut restored = Adam::new(0.01, None);
    checkpoint::load(&path, std::slice::from_mut(&mut restored)).unwrap();
    assert_eq!(restored.timestep(), Some(0));
    assert_eq!(restored.first_moment(), opt.first_moment());

    remove_checkpoint(&path);
}

#[test]
fn test_two_shard_layout_scatters_deterministically() {
    let path = checkpoint_path("two_shards");

    // 两个设备分片，参数量故意不同（3与2），检验切片按设备序号确定摆放
    let mut shards = vec![Adagrad::new(0.1, None), Adagrad::new(0.1, None)];
    let mut p0 = Tensor::new(&[1.0, 2.0, 3.0]);
    let mut p1 = Tensor::new(&[-1.0, -2.0]);
    shards[0]
        .update(&mut p0, &mut Tensor::new(&[0.1, 0.2, 0.3]))
        .unwrap();
    shards[1]
        .update(&mut p1, &mut Tensor::new(&[0.7, 0.9]))
        .unwrap();

    checkpoint::save(&path, &shards, true).unwrap();

    let mut restored = vec![Adagrad::new(0.1, None), Adagrad::new(0.1, None)];
    checkpoint::load(&path, &mut restored).unwrap();
    assert_eq!(restored[0].accumulator(), shards[0].accumulator());
    assert_eq!(restored[1].accumulator(), shards[1].accumulator());

    remove_checkpoint(&path);
}

#[test]
fn test_shard_count_mismatch_rejected() {
    let path = checkpoint_path("shard_count");

    let mut shards = vec![Adagrad::new(0.1, None), Adagrad::new(0.1, None)];
    let mut p0 = Tensor::new(&[1.0]);
    let mut p1 = Tensor::new(&[2.0]);
    shards[0]
        .update(&mut p0, &mut Tensor::new(&[0.5]))
        .unwrap();
    shards[1]
        .update(&mut p1, &mut Tensor::new(&[0.5]))
        .unwrap();
    checkpoint::save(&path, &shards, true).unwrap();

    let mut single = vec![Adagrad::new(0.1, None)];
    let err = checkpoint::load(&path, &mut single).unwrap_err();
    assert!(matches!(
        err,
        OptimizerError::ShapeMismatch {
            expected: 2,
            got: 1,
            ..
        }
    ));

    remove_checkpoint(&path);
}

#[test]
fn test_algorithm_mismatch_rejected() {
    let path = checkpoint_path("algo_mismatch");

    let mut opt = Adagrad::new(0.1, None);
    let mut params = Tensor::new(&[1.0]);
    opt.update(&mut params, &mut Tensor::new(&[0.5])).unwrap();
    checkpoint::save(&path, std::slice::from_ref(&opt), true).unwrap();

    let mut wrong = Adam::new(0.01, None);
    let err = checkpoint::load(&path, std::slice::from_mut(&mut wrong)).unwrap_err();
    assert!(matches!(err, OptimizerError::CheckpointError(_)));

    remove_checkpoint(&path);
}

#[test]
fn test_roundtrip_through_factory_dispatch() {
    let path = checkpoint_path("factory_dispatch");

    // 经由工厂创建的优化器同样满足检查点回程不变量
    let mut opt = create_optimizer("adam", 0.01, None, &[0.8, 0.99]).unwrap();
    let mut params = Tensor::new_random_seeded(-1.0, 1.0, 5, 31);
    for step in 0..2 {
        let mut grads = Tensor::new_random_seeded(-0.5, 0.5, 5, 500 + step);
        opt.update(&mut params, &mut grads).unwrap();
    }
    checkpoint::save(&path, std::slice::from_ref(&opt), true).unwrap();

    let mut restored = create_optimizer("adam", 0.01, None, &[0.8, 0.99]).unwrap();
    checkpoint::load(&path, std::slice::from_mut(&mut restored)).unwrap();

    let mut p_original = params.clone();
    let mut p_restored = params.clone();
    let mut g1 = Tensor::new_random_seeded(-0.5, 0.5, 5, 600);
    let mut g2 = g1.clone();
    opt.update(&mut p_original, &mut g1).unwrap();
    restored.update(&mut p_restored, &mut g2).unwrap();
    assert_eq!(p_original, p_restored);

    remove_checkpoint(&path);
}

#[test]
fn test_fresh_optimizer_roundtrip_stays_usable() {
    let path = checkpoint_path("fresh_roundtrip");

    // 从未update过的优化器：辅助状态尚未分配，保存的状态数组为空
    let saved = Adagrad::new(0.1, None);
    checkpoint::save(&path, std::slice::from_ref(&saved), true).unwrap();

    let mut restored = Adagrad::new(0.1, None);
    checkpoint::load(&path, std::slice::from_mut(&mut restored)).unwrap();
    // 恢复后仍是未分配状态，而不是一个0元素的张量
    assert!(restored.accumulator().is_none());

    // 首次update照常惰性分配，与从未经过检查点的实例逐元素一致
    let mut fresh = Adagrad::new(0.1, None);
    let mut p_restored = Tensor::new(&[1.0, -2.0]);
    let mut p_fresh = Tensor::new(&[1.0, -2.0]);
    restored
        .update(&mut p_restored, &mut Tensor::new(&[0.3, 0.7]))
        .unwrap();
    fresh
        .update(&mut p_fresh, &mut Tensor::new(&[0.3, 0.7]))
        .unwrap();
    assert_eq!(p_restored, p_fresh);

    remove_checkpoint(&path);
}

#[test]
fn test_fresh_adam_roundtrip_stays_usable() {
    let path = checkpoint_path("fresh_adam_roundtrip");

    let saved = Adam::new(0.01, None);
    checkpoint::save(&path, std::slice::from_ref(&saved), true).unwrap();

    let mut restored = Adam::new(0.01, None);
    checkpoint::load(&path, std::slice::from_mut(&mut restored)).unwrap();
    assert!(restored.first_moment().is_none());
    assert!(restored.second_moment().is_none());

    let mut params = Tensor::new(&[1.0, 2.0, -0.5]);
    restored
        .update(&mut params, &mut Tensor::new(&[0.1, -0.2, 0.3]))
        .unwrap();
    assert_eq!(restored.timestep(), Some(1));

    remove_checkpoint(&path);
}

#[test]
fn test_dotted_checkpoint_names_do_not_collide() {
    // 两个只靠扩展名区分的检查点名：各自的双文件必须独立，互不覆盖
    let adam_path = checkpoint_path("run.adam");
    let adagrad_path = checkpoint_path("run.adagrad");

    let mut adam = Adam::new(0.01, None);
    let mut p = Tensor::new(&[1.0]);
    adam.update(&mut p, &mut Tensor::new(&[0.1])).unwrap();
    checkpoint::save(&adam_path, std::slice::from_ref(&adam), true).unwrap();

    let mut adagrad = Adagrad::new(0.1, None);
    let mut q = Tensor::new(&[2.0]);
    adagrad.update(&mut q, &mut Tensor::new(&[0.5])).unwrap();
    checkpoint::save(&adagrad_path, std::slice::from_ref(&adagrad), true).unwrap();

    // 后保存的adagrad检查点没有覆盖先保存的adam检查点
    let mut restored = Adam::new(0.01, None);
    checkpoint::load(&adam_path, std::slice::from_mut(&mut restored)).unwrap();
    assert_eq!(restored.timestep(), Some(1));
    assert_eq!(restored.first_moment(), adam.first_moment());

    remove_checkpoint(&adam_path);
    remove_checkpoint(&adagrad_path);
}

#[test]
fn test_sgd_checkpoint_is_empty_but_valid() {
    let path = checkpoint_path("sgd_empty");

    let opt = create_optimizer("sgd", 0.1, None, &[]).unwrap();
    checkpoint::save(&path, std::slice::from_ref(&opt), true).unwrap();

    let mut restored = create_optimizer("sgd", 0.1, None, &[]).unwrap();
    checkpoint::load(&path, std::slice::from_mut(&mut restored)).unwrap();

    remove_checkpoint(&path);
}
