pub mod answers;
pub mod product;
pub mod quiz;
