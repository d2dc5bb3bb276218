pub mod completion;
pub mod coordinator;
pub mod errors;
pub mod models;
pub mod providers;
