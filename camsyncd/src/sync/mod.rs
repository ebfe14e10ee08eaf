pub mod db;
pub mod engine;
pub mod scanner;
pub mod state;
pub mod uploads;
