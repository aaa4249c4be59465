pub mod api;
pub mod config;
pub mod controllers;
pub mod error;
pub mod notice;
pub mod resource;
pub mod review;
pub mod room;
pub mod store;
pub mod submission;
pub mod ui;
pub mod view;
