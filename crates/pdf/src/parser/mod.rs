pub mod backend;
pub mod extract;
