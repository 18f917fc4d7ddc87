// src/models/mod.rs

pub mod catalog;
pub mod comment;
pub mod page;
pub mod review;
pub mod user;
