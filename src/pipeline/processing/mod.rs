// Record processing: derivation rules and source normalization

pub mod age;
pub mod geography;
pub mod normalize;
