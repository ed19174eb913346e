use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "hotels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub hotel_name: String,
    pub address: String,
    pub city: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tables::Entity")]
    Tables,
    #[sea_orm(has_one = "super::hotel_wallets::Entity")]
    HotelWallets,
}

impl Related<super::tables::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tables.def()
    }
}

impl Related<super::hotel_wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HotelWallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
