pub mod base;
pub mod configs;
pub mod errors;
pub mod openai;
pub mod utils;

#[cfg(test)]
pub mod mock;
