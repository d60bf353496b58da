//! Student profile entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub admission_number: String,
    pub full_name: String,
    pub current_class_id: Option<Uuid>,
    pub guardian_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::CurrentClassId",
        to = "super::class::Column::Id"
    )]
    CurrentClass,
}

impl ActiveModelBehavior for ActiveModel {}
