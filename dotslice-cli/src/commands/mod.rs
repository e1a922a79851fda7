pub mod common;
pub mod extract;
pub mod info;
