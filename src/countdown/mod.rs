pub mod controller;
pub mod format;
pub mod parser;
