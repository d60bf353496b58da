//! Subject entity
//!
//! `direct_class_id` and `direct_teacher_id` are the legacy links; the
//! junction tables are authoritative.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subjects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub direct_class_id: Option<Uuid>,
    pub direct_teacher_id: Option<Uuid>,
    pub term: String,
    pub academic_year: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::DirectClassId",
        to = "super::class::Column::Id"
    )]
    DirectClass,
    #[sea_orm(
        belongs_to = "super::teacher::Entity",
        from = "Column::DirectTeacherId",
        to = "super::teacher::Column::Id"
    )]
    DirectTeacher,
}

impl ActiveModelBehavior for ActiveModel {}
