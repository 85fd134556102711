pub mod cycle;
pub mod house;
pub mod user;
