// src/db.rs

pub mod absence_repo;
pub mod appointment_repo;
pub mod company_repo;
pub mod prospect_repo;
pub mod share_link_repo;
pub mod simulator_repo;
pub mod user_repo;

pub use absence_repo::AbsenceRepository;
pub use appointment_repo::AppointmentRepository;
pub use company_repo::CompanyRepository;
pub use prospect_repo::ProspectRepository;
pub use share_link_repo::ShareLinkRepository;
pub use simulator_repo::SimulatorRepository;
pub use user_repo::{NewUser, UserRepository};
