pub mod normalize;
pub mod pattern;
pub mod profile;
