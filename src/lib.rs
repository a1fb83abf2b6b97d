pub mod changelog;
pub mod commands;
pub mod config;
pub mod error;
pub mod notifier;
pub mod package;
pub mod plugin;
pub mod registry;
pub mod runtime;
