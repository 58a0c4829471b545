// src/handlers.rs

pub mod absences;
pub mod appointments;
pub mod auth;
pub mod companies;
pub mod health;
pub mod prospects;
pub mod schedule;
pub mod share_links;
pub mod simulator;
pub mod users;
