use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "table_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub table_id: Uuid,
    pub session_id: String,
    pub guest_name: Option<String>,
    pub items: Json,
    pub total_amount: Decimal,
    pub order_status: String,
    pub payment_status: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tables::Entity",
        from = "Column::TableId",
        to = "super::tables::Column::Id"
    )]
    Tables,
    #[sea_orm(
        belongs_to = "super::hotels::Entity",
        from = "Column::HotelId",
        to = "super::hotels::Column::Id"
    )]
    Hotels,
}

impl Related<super::tables::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tables.def()
    }
}

impl Related<super::hotels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hotels.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
