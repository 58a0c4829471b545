// src/models.rs

pub mod absence;
pub mod appointment;
pub mod auth;
pub mod company;
pub mod prospect;
pub mod role;
pub mod share_link;
pub mod simulator;
pub mod user;
