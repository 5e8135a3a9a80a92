use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

use super::department;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum EventType {
    #[sea_orm(string_value = "semesterStart")]
    SemesterStart,
    #[sea_orm(string_value = "semesterEnd")]
    SemesterEnd,
    #[sea_orm(string_value = "holiday")]
    Holiday,
    #[sea_orm(string_value = "examPeriod")]
    ExamPeriod,
    #[sea_orm(string_value = "registration")]
    Registration,
    #[sea_orm(string_value = "other")]
    Other,
}

impl From<EventType> for common::CalendarEventType {
    fn from(value: EventType) -> Self {
        match value {
            EventType::SemesterStart => common::CalendarEventType::SemesterStart,
            EventType::SemesterEnd => common::CalendarEventType::SemesterEnd,
            EventType::Holiday => common::CalendarEventType::Holiday,
            EventType::ExamPeriod => common::CalendarEventType::ExamPeriod,
            EventType::Registration => common::CalendarEventType::Registration,
            EventType::Other => common::CalendarEventType::Other,
        }
    }
}

impl From<common::CalendarEventType> for EventType {
    fn from(value: common::CalendarEventType) -> Self {
        match value {
            common::CalendarEventType::SemesterStart => EventType::SemesterStart,
            common::CalendarEventType::SemesterEnd => EventType::SemesterEnd,
            common::CalendarEventType::Holiday => EventType::Holiday,
            common::CalendarEventType::ExamPeriod => EventType::ExamPeriod,
            common::CalendarEventType::Registration => EventType::Registration,
            common::CalendarEventType::Other => EventType::Other,
        }
    }
}

/// A scheduled event on the academic calendar.
///
/// An active `SemesterEnd` event closes `semester` of `academic_year` for the
/// departments linked through `academic_calendar_event_departments`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "academic_calendar_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
}

impl Model {
    /// Whether this event, in its current state, triggers a semester rollover.
    pub fn triggers_rollover(&self) -> bool {
        self.is_active && self.event_type == EventType::SemesterEnd
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::academic_calendar_event_department::Entity")]
    AffectedDepartment,
}

impl Related<super::academic_calendar_event_department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AffectedDepartment.def()
    }
}

impl Related<department::Entity> for Entity {
    fn to() -> RelationDef {
        super::academic_calendar_event_department::Relation::Department.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::academic_calendar_event_department::Relation::Event.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
