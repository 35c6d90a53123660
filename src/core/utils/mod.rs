/// Random parameter initialization
pub mod random;
