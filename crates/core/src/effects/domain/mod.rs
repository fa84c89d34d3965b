pub mod effect_error;
pub mod effect_spec;
pub mod region_effect;
