pub mod constants;
pub mod region;
pub mod surface;
