pub mod config;
pub mod console;
pub mod evaluate;
pub mod prompt_loader;
pub mod speech;
