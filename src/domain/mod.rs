// Domain layer: census models and ports. No AWS types leak in here.

pub mod model;
pub mod ports;
