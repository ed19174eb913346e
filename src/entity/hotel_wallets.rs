use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "hotel_wallets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub balance: Decimal,
    pub per_verification_charge: Decimal,
    pub per_order_charge: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::hotels::Entity",
        from = "Column::HotelId",
        to = "super::hotels::Column::Id"
    )]
    Hotels,
}

impl Related<super::hotels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hotels.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
