pub mod distance;
pub mod matching;
pub mod near;
