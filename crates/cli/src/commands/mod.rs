pub mod chat;
pub mod doctor;
pub mod models;
pub mod onboard;
pub mod services;
