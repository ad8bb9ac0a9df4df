pub mod config;
pub mod user;

pub use user::{NewUser, User};
