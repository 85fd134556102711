pub mod house;
pub mod sensor;
pub mod user;

pub use house::{CultivationCycle, House, HousePatch};
pub use sensor::SensorReading;
pub use user::{NewUser, User, UserRecord};
