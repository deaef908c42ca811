pub mod db;
pub mod models;
pub mod reference;
pub mod tables;

pub use db::{Database, DatabaseError};
