// Domain layer: core models, ports and the pure interpretation rules.

pub mod model;
pub mod ports;

pub mod services;
