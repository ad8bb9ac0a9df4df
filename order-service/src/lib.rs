pub mod config;
pub mod order;

pub use order::{NewOrder, Order, OrderRequest, UNIT_PRICE};
