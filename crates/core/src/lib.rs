pub mod detection;
pub mod effects;
pub mod pipeline;
pub mod shared;
