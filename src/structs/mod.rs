pub mod component;
pub mod mixture;
pub mod weights;
