pub mod canvas;
pub mod document;
pub mod reconstruct;
