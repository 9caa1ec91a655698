// Domain layer: pipeline models and ports (interfaces).

pub mod model;
pub mod ports;
