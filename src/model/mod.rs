//! Trainable models and their parameter storage.

pub mod oracle;
pub mod space;
pub mod svdfeature;

pub use oracle::{Oracle, ScalarTouch, VectorTouch};
pub use space::{Fill, ParameterSpace};
pub use svdfeature::SvdFeatureModel;
