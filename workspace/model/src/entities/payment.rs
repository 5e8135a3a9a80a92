use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{student, student_account};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentType {
    #[sea_orm(string_value = "tuition")]
    Tuition,
    #[sea_orm(string_value = "admission")]
    Admission,
    #[sea_orm(string_value = "exam")]
    Exam,
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "card")]
    Card,
    #[sea_orm(string_value = "bankTransfer")]
    BankTransfer,
    #[sea_orm(string_value = "mobileBanking")]
    MobileBanking,
}

impl From<PaymentType> for common::PaymentType {
    fn from(value: PaymentType) -> Self {
        match value {
            PaymentType::Tuition => common::PaymentType::Tuition,
            PaymentType::Admission => common::PaymentType::Admission,
            PaymentType::Exam => common::PaymentType::Exam,
            PaymentType::Other => common::PaymentType::Other,
        }
    }
}

impl From<common::PaymentType> for PaymentType {
    fn from(value: common::PaymentType) -> Self {
        match value {
            common::PaymentType::Tuition => PaymentType::Tuition,
            common::PaymentType::Admission => PaymentType::Admission,
            common::PaymentType::Exam => PaymentType::Exam,
            common::PaymentType::Other => PaymentType::Other,
        }
    }
}

impl From<PaymentMethod> for common::PaymentMethod {
    fn from(value: PaymentMethod) -> Self {
        match value {
            PaymentMethod::Cash => common::PaymentMethod::Cash,
            PaymentMethod::Card => common::PaymentMethod::Card,
            PaymentMethod::BankTransfer => common::PaymentMethod::BankTransfer,
            PaymentMethod::MobileBanking => common::PaymentMethod::MobileBanking,
        }
    }
}

impl From<common::PaymentMethod> for PaymentMethod {
    fn from(value: common::PaymentMethod) -> Self {
        match value {
            common::PaymentMethod::Cash => PaymentMethod::Cash,
            common::PaymentMethod::Card => PaymentMethod::Card,
            common::PaymentMethod::BankTransfer => PaymentMethod::BankTransfer,
            common::PaymentMethod::MobileBanking => PaymentMethod::MobileBanking,
        }
    }
}

/// One payment transaction made by a student.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub student_id: i32,
    /// Ledger row the amount was applied to, if any.
    pub student_account_id: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_type: PaymentType,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "student::Entity",
        from = "Column::StudentId",
        to = "student::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
    #[sea_orm(
        belongs_to = "student_account::Entity",
        from = "Column::StudentAccountId",
        to = "student_account::Column::Id",
        on_delete = "SetNull"
    )]
    StudentAccount,
}

impl Related<student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<student_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
