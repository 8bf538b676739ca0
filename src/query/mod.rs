pub mod commands;
pub mod formatters;
