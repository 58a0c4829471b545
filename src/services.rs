// src/services.rs

pub mod absence_service;
pub mod appointment_service;
pub mod auth;
pub mod notification;
pub mod prospect_service;
pub mod scheduling;
pub mod share_link_service;
pub mod simulator_service;
pub mod tenancy_service;
pub mod token;
pub mod user_service;
