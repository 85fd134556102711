pub use super::cultivation_cycles::Entity as CultivationCycles;
pub use super::houses::Entity as Houses;
pub use super::users::Entity as Users;
