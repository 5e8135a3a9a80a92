use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::student;

/// Payment state of a ledger row. Kept in step with the balance classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(15))")]
pub enum AccountStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl From<AccountStatus> for common::AccountStatus {
    fn from(status: AccountStatus) -> Self {
        match status {
            AccountStatus::Pending => common::AccountStatus::Pending,
            AccountStatus::Partial => common::AccountStatus::Partial,
            AccountStatus::Paid => common::AccountStatus::Paid,
        }
    }
}

impl From<common::AccountStatus> for AccountStatus {
    fn from(status: common::AccountStatus) -> Self {
        match status {
            common::AccountStatus::Pending => AccountStatus::Pending,
            common::AccountStatus::Partial => AccountStatus::Partial,
            common::AccountStatus::Paid => AccountStatus::Paid,
        }
    }
}

/// One semester's tuition ledger row for one student.
///
/// A new row is created for every semester the student enters; rows are never
/// moved to another semester. `(student_id, academic_year, semester)` is unique.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "student_accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub student_id: i32,
    pub academic_year: String,
    pub semester: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub tuition_fee: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub discount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub paid_amount: Decimal,
    /// Tuition fee less the flat discount.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_due: Decimal,
    /// Scholarship as a percentage of the tuition fee.
    #[sea_orm(column_type = "Decimal(Some((8, 4)))", nullable)]
    pub scholarship: Option<Decimal>,
    /// Balance carried over from an earlier semester.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))", nullable)]
    pub forwarded: Option<Decimal>,
    pub status: AccountStatus,
    /// How the semester is being paid ("full", "installment", ...).
    pub paid_type: Option<String>,
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
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
}

impl Related<student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
