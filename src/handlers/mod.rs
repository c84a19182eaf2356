// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod content;
pub mod exam;
pub mod payment;
pub mod profile;
pub mod upload;
