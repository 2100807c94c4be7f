pub mod api;
pub mod runtime;
pub mod simulation;
pub mod ui;
