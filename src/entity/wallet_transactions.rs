use sea_orm::entity::prelude::*;

/// Append-only ledger row. Never updated or deleted; lets the balance be
/// audited independently of the mutable wallet row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub direction: String,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub description: Option<String>,
    pub reference_kind: String,
    pub reference_id: Option<Uuid>,
    pub actor_kind: String,
    pub actor_id: Option<Uuid>,
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
}

impl Related<super::hotels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hotels.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
