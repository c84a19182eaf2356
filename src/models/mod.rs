// src/models/mod.rs

pub mod achievement;
pub mod activity;
pub mod branding;
pub mod exam;
pub mod gallery;
pub mod member;
pub mod news;
pub mod payment;
pub mod user;
