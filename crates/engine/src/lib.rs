pub mod controller;
pub mod gateway;
pub mod signal;
