pub mod catalog;
pub mod market;
pub mod prices;
pub mod setup;
pub mod ui;
