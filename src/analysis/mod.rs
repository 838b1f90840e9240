pub mod frame;
pub mod stats;
