#![allow(dead_code)]

pub mod fetchers;
pub mod strategies;

pub use fetchers::*;
pub use strategies::*;
