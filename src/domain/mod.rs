// Domain layer: run model and the ports the processor drives.

pub mod model;
pub mod ports;
