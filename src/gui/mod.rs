pub mod controller;
pub mod frontend;
