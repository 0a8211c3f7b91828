// Domain layer: on-disk superblock model and ports (interfaces).

pub mod flags;
pub mod model;
pub mod ports;
