use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "houses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning user, checked by the registry rather than a foreign key.
    pub owner_id: i32,

    pub name: String,

    pub location: String,

    /// "idle", "cultivating" or "maintenance"
    pub status: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cultivation_cycles::Entity")]
    CultivationCycles,
}

impl Related<super::cultivation_cycles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CultivationCycles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
