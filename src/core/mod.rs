pub mod assets;
pub mod batch;
pub mod config;
pub mod cron;
pub mod installer;
pub mod instance;
pub mod prompt;
pub mod script;
pub mod settings;
pub mod store;
pub mod terminal;
