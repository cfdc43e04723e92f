pub mod analysis;
pub mod coaching;
pub mod configuration;
pub mod controller;
pub mod error_handling;
pub mod llm;
pub mod scenarios;
pub mod session_management;
pub mod storage;
pub mod web_interface;
