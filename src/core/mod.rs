pub mod genres;
pub mod matcher;
pub mod service;
