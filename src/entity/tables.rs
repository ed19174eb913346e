use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tables")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub table_number: String,
    /// Cached occupancy. Authoritative occupancy is derived from the
    /// active-table tracker; `reconcile` resets this column when stale.
    pub status: String,
    pub current_session_id: Option<String>,
    pub current_guest_name: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::hotels::Entity",
        from = "Column::HotelId",
        to = "super::hotels::Column::Id"
    )]
    Hotels,
    #[sea_orm(has_many = "super::table_orders::Entity")]
    TableOrders,
    #[sea_orm(has_many = "super::bills::Entity")]
    Bills,
    #[sea_orm(has_many = "super::active_tables::Entity")]
    ActiveTables,
}

impl Related<super::hotels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hotels.def()
    }
}

impl Related<super::table_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TableOrders.def()
    }
}

impl Related<super::bills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl Related<super::active_tables::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActiveTables.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
