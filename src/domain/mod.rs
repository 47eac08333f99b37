// Domain layer: core models, request/response shapes and ports (interfaces).

pub mod model;
pub mod ports;
pub mod requests;
