//! Grouped boosting trainer integration tests.

use gbcent_rust::*;

use std::sync::Arc;

mod common;
use common::*;

type Data = InMemoryLearningData<GBCentInstance>;

#[test]
fn test_low_support_groups_never_reach_the_learner() {
    let mut instances = Vec::new();
    instances.extend(create_group_instances(0, 5, 1));
    instances.extend(create_group_instances(1, 50, 2));
    instances.extend(create_group_instances(2, 500, 3));
    let mut learn = Data::with_batch_size(instances, 64);

    let learner = Arc::new(RecordingLearner::default());
    let trainer = trainer_without_base(10, 0.0, learner.clone());
    let mut model = GBCentModel::new(bias_only_model(3));

    let report = trainer.learn::<_, Data>(&mut model, &mut learn, None).unwrap();

    assert_eq!(learner.fit_sizes(), vec![500, 50]);
    assert_eq!(report.groups_attempted, 2);
    let visited: Vec<_> = report.outcomes.iter().map(|o| (o.group, o.support)).collect();
    assert_eq!(visited, vec![(2, 500), (1, 50)]);
    assert!(model.tree(0).is_none());
}

#[test]
fn test_validation_gate_below_threshold_changes_nothing() {
    let mut model = GBCentModel::new(bias_only_model(1));
    let existing = RegressionTree::constant(-3.0, 1, 1.0);
    model.set_tree(0, existing.clone());

    let mut learn = Data::new(vec![group_instance(0, 1.0), group_instance(0, 1.0)]);
    let mut valid = Data::new(vec![group_instance(0, 1.0)]);

    // validation objective goes from 0.5 to 0.0: a gain of 0.5 per instance
    let trainer = trainer_without_base(1, 0.6, Arc::new(ConstantLearner(1.0)));
    let report = trainer.learn(&mut model, &mut learn, Some(&mut valid)).unwrap();

    assert_eq!(report.groups_attempted, 1);
    assert_eq!(report.trees_accepted, 0);
    assert_eq!(report.outcomes[0].objectives, Some((0.5, 0.0)));
    assert!(!report.outcomes[0].accepted);
    assert_eq!(model.tree(0), Some(&existing));
}

#[test]
fn test_validation_gate_above_threshold_commits() {
    let mut model = GBCentModel::new(bias_only_model(1));
    let mut learn = Data::new(vec![group_instance(0, 1.0), group_instance(0, 1.0)]);
    let mut valid = Data::new(vec![group_instance(0, 1.0)]);

    let trainer = trainer_without_base(1, 0.4, Arc::new(ConstantLearner(1.0)));
    let report = trainer.learn(&mut model, &mut learn, Some(&mut valid)).unwrap();

    assert_eq!(report.trees_accepted, 1);
    assert!(report.outcomes[0].accepted);
    assert_eq!(model.tree(0), Some(&RegressionTree::constant(1.0, 2, 1.0)));
    assert_eq!(model.predict(&group_instance(0, 0.0)).unwrap(), 1.0);
}

#[test]
fn test_gain_equal_to_threshold_is_rejected() {
    let mut model = GBCentModel::new(bias_only_model(1));
    let mut learn = Data::new(vec![group_instance(0, 1.0)]);
    let mut valid = Data::new(vec![group_instance(0, 1.0), group_instance(0, 1.0)]);

    let trainer = trainer_without_base(1, 0.5, Arc::new(ConstantLearner(1.0)));
    let report = trainer.learn(&mut model, &mut learn, Some(&mut valid)).unwrap();
    assert_eq!(report.trees_accepted, 0);
    assert!(model.tree(0).is_none());
}

#[test]
fn test_accepted_tree_improves_training_objective() {
    let mut instances = create_group_instances(0, 200, 7);
    instances.extend(create_group_instances(1, 200, 8));
    let mut learn = Data::with_batch_size(instances.clone(), 32);
    let mut valid = Data::new(instances.clone());

    let config = TrainingConfigBuilder::new()
        .min_support(20)
        .min_tree_gain(0.01)
        .criterion(CriterionType::VarianceReduction)
        .max_depth(2)
        .min_leaf_support(5)
        .learn_base_model(false)
        .build()
        .unwrap();
    let trainer = GroupedBoostingTrainer::from_config(&config).unwrap();
    let mut model = GBCentModel::new(bias_only_model(2));

    let before: f64 = instances
        .iter()
        .map(|ins| {
            let d = model.predict(ins).unwrap() - ins.base().label;
            0.5 * d * d
        })
        .sum();
    let report = trainer.learn(&mut model, &mut learn, Some(&mut valid)).unwrap();
    let after: f64 = instances
        .iter()
        .map(|ins| {
            let d = model.predict(ins).unwrap() - ins.base().label;
            0.5 * d * d
        })
        .sum();

    assert_eq!(report.trees_accepted, 2);
    assert!(after < 0.1 * before, "before {} after {}", before, after);
}

#[test]
fn test_divergent_base_model_aborts_training() {
    let base = bias_only_model(1);
    base.space().set_scalar(BIASES, 0, f64::NAN).unwrap();
    let mut model = GBCentModel::new(base);

    let config = TrainingConfigBuilder::new().min_support(1).build().unwrap();
    let trainer = GroupedBoostingTrainer::from_config(&config).unwrap();

    let mut learn = Data::new(create_group_instances(0, 10, 4));
    let err = trainer.learn::<_, Data>(&mut model, &mut learn, None).unwrap_err();
    assert!(err.is_numeric_divergence());
    assert_eq!(model.num_trees(), 0);
}
