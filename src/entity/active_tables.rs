use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "active_tables")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub table_id: Uuid,
    pub bill_id: Option<Uuid>,
    pub hotel_id: Uuid,
    pub guest_name: Option<String>,
    pub session_id: Option<String>,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub closed_at: Option<DateTimeWithTimeZone>,
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
        belongs_to = "super::bills::Entity",
        from = "Column::BillId",
        to = "super::bills::Column::Id"
    )]
    Bills,
}

impl Related<super::tables::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tables.def()
    }
}

impl Related<super::bills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
