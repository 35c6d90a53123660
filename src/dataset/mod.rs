//! Learning instances and streaming data sources.

pub mod instance;
pub mod learning_data;
pub mod partition;

pub use instance::{Feature, GBCentInstance, SvdFeatureInstance, TreeInstance};
pub use learning_data::{materialize, BaseModelView, InMemoryLearningData};
pub use partition::partition_into_shards;
