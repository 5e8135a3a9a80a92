//! Payment ledger: keeps `student_accounts.paid_amount` and `status` in step
//! with the tuition payments recorded against them.
//!
//! Only tuition payments move the ledger. Admission, exam and other fees are
//! stored with their optional account link but leave the balance untouched.

use chrono::{NaiveDate, Utc};
use model::entities::{payment, student, student_account};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    ModelTrait, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::balance::{account_status, current_account};
use crate::error::{ComputeError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub student_id: i32,
    /// Ledger row to apply the payment to; the student's latest row when absent
    pub student_account_id: Option<i32>,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_type: payment::PaymentType,
    pub method: payment::PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
}

/// Changes to a recorded payment. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentAmendment {
    pub amount: Option<Decimal>,
    pub payment_date: Option<NaiveDate>,
    pub method: Option<payment::PaymentMethod>,
    pub reference: Option<String>,
    pub note: Option<String>,
}

/// Manual changes to a ledger row. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountAdjustment {
    pub discount: Option<Decimal>,
    /// Percentage of the tuition fee, 0 to 100
    pub scholarship: Option<Decimal>,
    pub forwarded: Option<Decimal>,
    pub paid_type: Option<String>,
}

fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(ComputeError::Validation(
            "Payment amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Adds `delta` to the row's paid amount and re-derives its status.
async fn apply_to_account<C: ConnectionTrait>(
    conn: &C,
    account: student_account::Model,
    delta: Decimal,
) -> Result<student_account::Model> {
    let mut updated = account.clone();
    updated.paid_amount += delta;
    let status = account_status(&updated);

    debug!(
        "Account {}: paid {} -> {}, status {:?} -> {:?}",
        account.id, account.paid_amount, updated.paid_amount, account.status, status
    );

    let mut active = account.into_active_model();
    active.paid_amount = Set(updated.paid_amount);
    active.status = Set(status);
    Ok(active.update(conn).await?)
}

async fn find_account<C: ConnectionTrait>(conn: &C, account_id: i32) -> Result<student_account::Model> {
    student_account::Entity::find_by_id(account_id)
        .one(conn)
        .await?
        .ok_or_else(|| ComputeError::not_found("Student account", account_id))
}

/// Stores a payment and, for tuition, applies it to the student's ledger.
#[instrument(skip(db))]
pub async fn record_payment(
    db: &DatabaseConnection,
    new_payment: NewPayment,
) -> Result<(payment::Model, Option<student_account::Model>)> {
    trace!("Entering record_payment");
    ensure_positive(new_payment.amount)?;

    let txn = db.begin().await?;

    let student = student::Entity::find_by_id(new_payment.student_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ComputeError::not_found("Student", new_payment.student_id))?;

    let account = match new_payment.student_account_id {
        Some(account_id) => {
            let account = find_account(&txn, account_id).await?;
            if account.student_id != student.id {
                return Err(ComputeError::Validation(format!(
                    "Student account {} does not belong to student {}",
                    account_id, student.id
                )));
            }
            Some(account)
        }
        None if new_payment.payment_type == payment::PaymentType::Tuition => {
            current_account(&txn, student.id).await?
        }
        None => None,
    };

    if new_payment.payment_type == payment::PaymentType::Tuition && account.is_none() {
        warn!("Student {} has no ledger row to apply a tuition payment to", student.id);
        return Err(ComputeError::Validation(format!(
            "Student {} has no student account to apply a tuition payment to",
            student.id
        )));
    }

    let payment = payment::ActiveModel {
        student_id: Set(student.id),
        student_account_id: Set(account.as_ref().map(|a| a.id)),
        amount: Set(new_payment.amount),
        payment_date: Set(new_payment.payment_date),
        payment_type: Set(new_payment.payment_type),
        method: Set(new_payment.method),
        reference: Set(new_payment.reference),
        note: Set(new_payment.note),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let account = match account {
        Some(account) if payment.payment_type == payment::PaymentType::Tuition => {
            Some(apply_to_account(&txn, account, payment.amount).await?)
        }
        other => other,
    };

    txn.commit().await?;

    info!(
        "Recorded {:?} payment {} of {} for student {}",
        payment.payment_type, payment.id, payment.amount, payment.student_id
    );
    Ok((payment, account))
}

/// Edits a payment; an amount change on a tuition payment moves the ledger by
/// the difference.
#[instrument(skip(db))]
pub async fn amend_payment(
    db: &DatabaseConnection,
    payment_id: i32,
    amendment: PaymentAmendment,
) -> Result<payment::Model> {
    trace!("Entering amend_payment");
    if let Some(amount) = amendment.amount {
        ensure_positive(amount)?;
    }

    let txn = db.begin().await?;

    let existing = payment::Entity::find_by_id(payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ComputeError::not_found("Payment", payment_id))?;

    let delta = amendment
        .amount
        .map(|amount| amount - existing.amount)
        .unwrap_or(Decimal::ZERO);

    if delta != Decimal::ZERO && existing.payment_type == payment::PaymentType::Tuition {
        if let Some(account_id) = existing.student_account_id {
            let account = find_account(&txn, account_id).await?;
            apply_to_account(&txn, account, delta).await?;
        }
    }

    let mut active = existing.into_active_model();
    if let Some(amount) = amendment.amount {
        active.amount = Set(amount);
    }
    if let Some(payment_date) = amendment.payment_date {
        active.payment_date = Set(payment_date);
    }
    if let Some(method) = amendment.method {
        active.method = Set(method);
    }
    if amendment.reference.is_some() {
        active.reference = Set(amendment.reference);
    }
    if amendment.note.is_some() {
        active.note = Set(amendment.note);
    }
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    info!("Amended payment {}", updated.id);
    Ok(updated)
}

/// Deletes a payment and takes a tuition amount back off its ledger row.
#[instrument(skip(db))]
pub async fn reverse_payment(db: &DatabaseConnection, payment_id: i32) -> Result<payment::Model> {
    trace!("Entering reverse_payment");

    let txn = db.begin().await?;

    let existing = payment::Entity::find_by_id(payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ComputeError::not_found("Payment", payment_id))?;

    if existing.payment_type == payment::PaymentType::Tuition {
        if let Some(account_id) = existing.student_account_id {
            let account = find_account(&txn, account_id).await?;
            apply_to_account(&txn, account, -existing.amount).await?;
        }
    }

    existing.clone().delete(&txn).await?;
    txn.commit().await?;

    info!("Reversed payment {} of {}", existing.id, existing.amount);
    Ok(existing)
}

/// Applies a manual adjustment to a ledger row.
///
/// `total_due` is kept as tuition fee less discount; the status is re-derived
/// from the full balance.
#[instrument(skip(db))]
pub async fn adjust_account(
    db: &DatabaseConnection,
    account_id: i32,
    adjustment: AccountAdjustment,
) -> Result<student_account::Model> {
    trace!("Entering adjust_account");

    let account = find_account(db, account_id).await?;

    let mut updated = account.clone();
    if let Some(discount) = adjustment.discount {
        if discount < Decimal::ZERO || discount > account.tuition_fee {
            return Err(ComputeError::Validation(format!(
                "Discount must be between 0 and the tuition fee {}",
                account.tuition_fee
            )));
        }
        updated.discount = discount;
    }
    if let Some(scholarship) = adjustment.scholarship {
        if scholarship < Decimal::ZERO || scholarship > Decimal::ONE_HUNDRED {
            return Err(ComputeError::Validation(
                "Scholarship must be a percentage between 0 and 100".to_string(),
            ));
        }
        updated.scholarship = Some(scholarship);
    }
    if let Some(forwarded) = adjustment.forwarded {
        updated.forwarded = Some(forwarded);
    }
    if adjustment.paid_type.is_some() {
        updated.paid_type = adjustment.paid_type;
    }
    updated.total_due = updated.tuition_fee - updated.discount;
    updated.status = account_status(&updated);

    let mut active = account.into_active_model();
    active.discount = Set(updated.discount);
    active.scholarship = Set(updated.scholarship);
    active.forwarded = Set(updated.forwarded);
    active.paid_type = Set(updated.paid_type);
    active.total_due = Set(updated.total_due);
    active.status = Set(updated.status);
    let saved = active.update(db).await?;

    info!("Adjusted student account {}: total_due={}, status={:?}", saved.id, saved.total_due, saved.status);
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use sea_orm::PaginatorTrait;

    fn tuition(student_id: i32, amount: i64) -> NewPayment {
        NewPayment {
            student_id,
            student_account_id: None,
            amount: Decimal::from(amount),
            payment_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            payment_type: payment::PaymentType::Tuition,
            method: payment::PaymentMethod::Cash,
            reference: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_tuition_payments_move_latest_account() -> Result<()> {
        let db = setup_db().await?;
        let faculty = create_faculty(&db, "ENG").await?;
        let cse = create_department(&db, &faculty, "CSE", Decimal::from(1000), 8).await?;
        let student = create_student(&db, &cse, "CSE-2024-0001", "2", true).await?;
        let older = create_account(&db, &student, "2024", "1", Decimal::from(1000)).await?;
        let latest = create_account(&db, &student, "2024", "2", Decimal::from(1000)).await?;

        let (payment, account) = record_payment(&db, tuition(student.id, 400)).await?;
        let account = account.unwrap();
        assert_eq!(payment.student_account_id, Some(latest.id));
        assert_eq!(account.id, latest.id);
        assert_eq!(account.paid_amount, Decimal::from(400));
        assert_eq!(account.status, student_account::AccountStatus::Partial);

        let (_, account) = record_payment(&db, tuition(student.id, 600)).await?;
        assert_eq!(account.unwrap().status, student_account::AccountStatus::Paid);

        let untouched = student_account::Entity::find_by_id(older.id).one(&db).await?.unwrap();
        assert_eq!(untouched.paid_amount, Decimal::ZERO);

        Ok(())
    }

    #[tokio::test]
    async fn test_explicit_account_must_belong_to_student() -> Result<()> {
        let db = setup_db().await?;
        let faculty = create_faculty(&db, "ENG").await?;
        let cse = create_department(&db, &faculty, "CSE", Decimal::from(1000), 8).await?;
        let alice = create_student(&db, &cse, "CSE-2024-0001", "1", true).await?;
        let bob = create_student(&db, &cse, "CSE-2024-0002", "1", true).await?;
        let bobs_account = create_account(&db, &bob, "2024", "1", Decimal::from(1000)).await?;

        let mut new_payment = tuition(alice.id, 100);
        new_payment.student_account_id = Some(bobs_account.id);
        assert!(matches!(
            record_payment(&db, new_payment).await,
            Err(ComputeError::Validation(_))
        ));

        // No ledger row at all
        assert!(matches!(
            record_payment(&db, tuition(alice.id, 100)).await,
            Err(ComputeError::Validation(_))
        ));
        assert!(matches!(
            record_payment(&db, tuition(alice.id, 0)).await,
            Err(ComputeError::Validation(_))
        ));
        assert_eq!(payment::Entity::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_non_tuition_payment_leaves_balance() -> Result<()> {
        let db = setup_db().await?;
        let faculty = create_faculty(&db, "ENG").await?;
        let cse = create_department(&db, &faculty, "CSE", Decimal::from(1000), 8).await?;
        let student = create_student(&db, &cse, "CSE-2024-0001", "1", true).await?;
        let account = create_account(&db, &student, "2024", "1", Decimal::from(1000)).await?;

        let mut exam_fee = tuition(student.id, 50);
        exam_fee.payment_type = payment::PaymentType::Exam;
        let (payment, linked) = record_payment(&db, exam_fee).await?;
        assert_eq!(payment.student_account_id, None);
        assert!(linked.is_none());

        let reloaded = student_account::Entity::find_by_id(account.id).one(&db).await?.unwrap();
        assert_eq!(reloaded.paid_amount, Decimal::ZERO);

        Ok(())
    }

    #[tokio::test]
    async fn test_amend_and_reverse_restore_ledger() -> Result<()> {
        let db = setup_db().await?;
        let faculty = create_faculty(&db, "ENG").await?;
        let cse = create_department(&db, &faculty, "CSE", Decimal::from(1000), 8).await?;
        let student = create_student(&db, &cse, "CSE-2024-0001", "1", true).await?;
        let account = create_account(&db, &student, "2024", "1", Decimal::from(1000)).await?;

        let (payment, _) = record_payment(&db, tuition(student.id, 300)).await?;

        let amended = amend_payment(
            &db,
            payment.id,
            PaymentAmendment {
                amount: Some(Decimal::from(1000)),
                reference: Some("RCPT-9".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(amended.amount, Decimal::from(1000));
        assert_eq!(amended.reference.as_deref(), Some("RCPT-9"));

        let reloaded = student_account::Entity::find_by_id(account.id).one(&db).await?.unwrap();
        assert_eq!(reloaded.paid_amount, Decimal::from(1000));
        assert_eq!(reloaded.status, student_account::AccountStatus::Paid);

        reverse_payment(&db, payment.id).await?;
        let reloaded = student_account::Entity::find_by_id(account.id).one(&db).await?.unwrap();
        assert_eq!(reloaded.paid_amount, Decimal::ZERO);
        assert_eq!(reloaded.status, student_account::AccountStatus::Pending);
        assert_eq!(payment::Entity::find().count(&db).await?, 0);

        assert!(matches!(
            reverse_payment(&db, payment.id).await,
            Err(ComputeError::NotFound { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_adjustment_recomputes_total_and_status() -> Result<()> {
        let db = setup_db().await?;
        let faculty = create_faculty(&db, "ENG").await?;
        let cse = create_department(&db, &faculty, "CSE", Decimal::from(1000), 8).await?;
        let student = create_student(&db, &cse, "CSE-2024-0001", "1", true).await?;
        let account = create_account(&db, &student, "2024", "1", Decimal::from(1000)).await?;
        record_payment(&db, tuition(student.id, 400)).await?;

        let adjusted = adjust_account(
            &db,
            account.id,
            AccountAdjustment {
                discount: Some(Decimal::from(100)),
                scholarship: Some(Decimal::from(50)),
                paid_type: Some("installment".to_string()),
                ..Default::default()
            },
        )
        .await?;

        // 1000 - 400 - 100 - 500 = 0
        assert_eq!(adjusted.total_due, Decimal::from(900));
        assert_eq!(adjusted.status, student_account::AccountStatus::Paid);
        assert_eq!(adjusted.paid_type.as_deref(), Some("installment"));

        let too_much = AccountAdjustment {
            scholarship: Some(Decimal::from(150)),
            ..Default::default()
        };
        assert!(matches!(
            adjust_account(&db, account.id, too_much).await,
            Err(ComputeError::Validation(_))
        ));

        Ok(())
    }
}
