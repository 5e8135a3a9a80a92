//! Tuition balance arithmetic.
//!
//! ```text
//! scholarship_amount = scholarship% / 100 * tuition_fee
//! balance            = tuition_fee - paid_amount - discount + forwarded - scholarship_amount
//! ```
//!
//! Everything here is pure except [`current_accounts`], which fetches the
//! ledger rows the arithmetic runs on.

use std::collections::HashMap;

use common::{BalanceBreakdown, BalanceStatus};
use model::entities::student_account;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::error::Result;

/// The values of one ledger row that take part in the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TuitionInputs {
    pub tuition_fee: Decimal,
    pub discount: Decimal,
    pub paid_amount: Decimal,
    /// Percentage of the tuition fee waived.
    pub scholarship: Option<Decimal>,
    /// Balance carried over from earlier semesters.
    pub forwarded: Option<Decimal>,
}

impl From<&student_account::Model> for TuitionInputs {
    fn from(account: &student_account::Model) -> Self {
        Self {
            tuition_fee: account.tuition_fee,
            discount: account.discount,
            paid_amount: account.paid_amount,
            scholarship: account.scholarship,
            forwarded: account.forwarded,
        }
    }
}

impl TuitionInputs {
    pub fn scholarship_amount(&self) -> Decimal {
        match self.scholarship {
            Some(percent) => percent / Decimal::ONE_HUNDRED * self.tuition_fee,
            None => Decimal::ZERO,
        }
    }

    pub fn balance(&self) -> Decimal {
        self.tuition_fee - self.paid_amount - self.discount
            + self.forwarded.unwrap_or(Decimal::ZERO)
            - self.scholarship_amount()
    }

    pub fn status(&self) -> BalanceStatus {
        classify(self.balance(), self.paid_amount)
    }

    pub fn breakdown(&self) -> BalanceBreakdown {
        let balance = self.balance();
        BalanceBreakdown {
            tuition_fee: self.tuition_fee,
            discount: self.discount,
            paid_amount: self.paid_amount,
            forwarded: self.forwarded.unwrap_or(Decimal::ZERO),
            scholarship_percent: self.scholarship.unwrap_or(Decimal::ZERO),
            scholarship_amount: self.scholarship_amount(),
            balance,
            status: classify(balance, self.paid_amount),
        }
    }
}

/// Classifies a balance: nothing owed is `Paid`, otherwise `Partial` when
/// something was paid and `Unpaid` when nothing was.
pub fn classify(balance: Decimal, paid_amount: Decimal) -> BalanceStatus {
    if balance <= Decimal::ZERO {
        BalanceStatus::Paid
    } else if paid_amount > Decimal::ZERO {
        BalanceStatus::Partial
    } else {
        BalanceStatus::Unpaid
    }
}

/// Ledger status to persist for the row's current figures.
pub fn account_status(account: &student_account::Model) -> student_account::AccountStatus {
    TuitionInputs::from(account).status().account_status().into()
}

/// Latest ledger row of each given student, keyed by student id.
///
/// The latest row is the one with the highest id, i.e. the semester the
/// student entered most recently.
pub async fn current_accounts<C: ConnectionTrait>(
    conn: &C,
    student_ids: &[i32],
) -> Result<HashMap<i32, student_account::Model>> {
    if student_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = student_account::Entity::find()
        .filter(student_account::Column::StudentId.is_in(student_ids.iter().copied()))
        .order_by_asc(student_account::Column::Id)
        .all(conn)
        .await?;

    // Ascending order: later rows overwrite earlier ones
    let mut current = HashMap::with_capacity(student_ids.len());
    for row in rows {
        current.insert(row.student_id, row);
    }
    Ok(current)
}

/// Latest ledger row of one student.
pub async fn current_account<C: ConnectionTrait>(
    conn: &C,
    student_id: i32,
) -> Result<Option<student_account::Model>> {
    Ok(student_account::Entity::find()
        .filter(student_account::Column::StudentId.eq(student_id))
        .order_by_desc(student_account::Column::Id)
        .one(conn)
        .await?)
}
