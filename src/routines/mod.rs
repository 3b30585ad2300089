pub mod divergence;
pub mod linalg;
pub mod output;
pub mod settings;
