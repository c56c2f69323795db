//! Adapters to the outside world: the model endpoint and the REST surface.

pub mod model;
pub mod server;
