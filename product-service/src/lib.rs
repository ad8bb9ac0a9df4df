pub mod config;
pub mod product;

pub use product::{NewProduct, Product};
