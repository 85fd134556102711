pub mod prelude;

pub mod cultivation_cycles;
pub mod houses;
pub mod users;
