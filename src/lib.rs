pub mod api;
pub mod config;
pub mod model;
pub mod repository;
pub mod screen;
pub mod view;
