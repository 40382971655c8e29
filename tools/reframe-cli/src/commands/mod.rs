pub mod presets;
pub mod resolve;
pub mod simulate;
