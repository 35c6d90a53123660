//! Base model optimizer integration tests.

use gbcent_rust::solver::evaluate;
use gbcent_rust::*;

use approx::assert_relative_eq;
use std::sync::Arc;

mod common;
use common::*;

type Data = InMemoryLearningData<SvdFeatureInstance>;

fn config(learning_rate: f64, num_threads: usize) -> OptimizerConfig {
    OptimizerConfig {
        learning_rate,
        num_threads,
        ..OptimizerConfig::default()
    }
}

/// Shard `g` touches only bias `g`, with labels `g + 1`.
fn disjoint_shards(num_shards: usize, per_shard: usize) -> Vec<Data> {
    (0..num_shards)
        .map(|g| {
            Data::with_batch_size(
                (0..per_shard)
                    .map(|i| SvdFeatureInstance::new((g + 1) as f64 + i as f64 * 0.1).with_bias(g, 1.0))
                    .collect(),
                2,
            )
        })
        .collect()
}

#[test]
fn test_parallel_pass_over_disjoint_shards_matches_serial() {
    let serial_model = bias_only_model(4);
    let parallel_model = bias_only_model(4);

    let sgd = StochasticGradientDescent::new(config(0.05, 1)).unwrap();
    let mut serial_total = 0.0;
    for mut shard in disjoint_shards(4, 6) {
        serial_total += sgd.update(&serial_model, &mut shard).unwrap();
    }

    let hogwild = HogwildOptimizer::new(config(0.05, 4)).unwrap();
    let mut shards = disjoint_shards(4, 6);
    let report = hogwild.update_shards(&parallel_model, &mut shards).unwrap();

    assert_eq!(report.num_interrupted(), 0);
    assert_relative_eq!(report.objective, serial_total, epsilon = 1e-12);
    for g in 0..4 {
        assert_eq!(
            parallel_model.space().scalar(BIASES, g).unwrap(),
            serial_model.space().scalar(BIASES, g).unwrap()
        );
    }
}

#[test]
fn test_single_step_is_exactly_lr_times_gradient() {
    let model = bias_only_model(1);
    model.space().set_scalar(BIASES, 0, 3.0).unwrap();
    // L2 gradient at prediction 3, label 1 is 2
    let mut data = Data::new(vec![SvdFeatureInstance::new(1.0).with_bias(0, 1.0)]);
    StochasticGradientDescent::new(config(0.125, 1))
        .unwrap()
        .update(&model, &mut data)
        .unwrap();
    assert_eq!(model.space().scalar(BIASES, 0).unwrap(), 3.0 - 0.125 * 2.0);
}

#[test]
fn test_nan_objective_is_fatal() {
    let model = bias_only_model(2);
    model.space().set_scalar(BIASES, 1, f64::NAN).unwrap();
    let mut data = Data::new(vec![
        SvdFeatureInstance::new(0.0).with_bias(0, 1.0),
        SvdFeatureInstance::new(0.0).with_bias(1, 1.0),
    ]);

    for threads in [1, 2] {
        let optimizer = BaseOptimizer::from_config(&config(0.1, threads)).unwrap();
        let err = optimizer
            .minimize::<_, _, Data>(&model, &mut data, None)
            .unwrap_err();
        assert!(err.is_numeric_divergence());
        assert!(!err.is_recoverable());
    }
}

#[test]
fn test_latent_factors_reduce_objective() {
    let instances = create_rating_instances(10, 10, 400, 11);
    let space = Arc::new(
        TrainingConfigBuilder::new()
            .init_range(0.1)
            .random_seed(3)
            .build()
            .unwrap()
            .create_space(),
    );
    let model = SvdFeatureModel::new(space, Arc::new(objective::L2Loss), 1, 20, 4).unwrap();

    let before = evaluate(&model, &mut Data::new(instances.clone())).unwrap();
    let optimizer = BaseOptimizer::from_config(&OptimizerConfig {
        learning_rate: 0.02,
        max_iterations: 30,
        ..OptimizerConfig::default()
    })
    .unwrap();
    let objective = optimizer
        .minimize::<_, _, Data>(&model, &mut Data::with_batch_size(instances.clone(), 16), None)
        .unwrap();
    let after = evaluate(&model, &mut Data::new(instances)).unwrap();

    assert!(objective.is_finite());
    assert!(after < 0.5 * before, "before {} after {}", before, after);
}

#[test]
fn test_ranking_loss_orders_relevant_items_first() {
    let objective = objective::create_objective(&ObjectiveConfig::new(ObjectiveType::Map)).unwrap();
    let model = SvdFeatureModel::new(Arc::new(ParameterSpace::new()), objective, 4, 0, 0).unwrap();
    // one query: items 0 and 1 are relevant
    let batch: Vec<_> = (0..4)
        .map(|item| SvdFeatureInstance::new(if item < 2 { 1.0 } else { 0.0 }).with_bias(item, 1.0))
        .collect();
    let mut data = Data::with_batch_size(batch, 4);

    let sgd = StochasticGradientDescent::new(OptimizerConfig {
        learning_rate: 0.5,
        max_iterations: 20,
        tolerance: 0.0,
        ..OptimizerConfig::default()
    })
    .unwrap();
    sgd.minimize::<_, _, Data>(&model, &mut data, None).unwrap();

    let scores: Vec<f64> = (0..4).map(|g| model.space().scalar(BIASES, g).unwrap()).collect();
    assert!(scores[0] > scores[2] && scores[0] > scores[3]);
    assert!(scores[1] > scores[2] && scores[1] > scores[3]);
}
