//! Read-only aggregates behind the dashboard and the report endpoints.
//!
//! Money figures come from the ledger rows. Every row is one semester of one
//! student, so totals sum across all semesters; only the dues list looks at
//! the current row of each student.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use common::{
    BalanceStatus, DashboardStats, DepartmentFinancialSummary, DueEntry, FinancialReport,
    GRADUATED_SEMESTER, MonthlyCollection, PaymentMethodTotal, PaymentReport,
};
use model::entities::{
    application, course, department, faculty, payment, student, student_account,
};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::{debug, instrument, trace};

use crate::balance::{TuitionInputs, current_accounts};
use crate::error::Result;

/// Money totals over a set of ledger rows.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct LedgerTotals {
    billed: Decimal,
    discounts: Decimal,
    scholarships: Decimal,
    forwarded: Decimal,
    collected: Decimal,
    outstanding: Decimal,
}

impl LedgerTotals {
    fn add(&mut self, account: &student_account::Model) {
        let inputs = TuitionInputs::from(account);
        self.billed += account.tuition_fee;
        self.discounts += account.discount;
        self.scholarships += inputs.scholarship_amount();
        self.forwarded += account.forwarded.unwrap_or(Decimal::ZERO);
        self.collected += account.paid_amount;
        self.outstanding += inputs.balance().max(Decimal::ZERO);
    }
}

#[instrument(skip(conn))]
pub async fn dashboard_stats<C: ConnectionTrait>(conn: &C) -> Result<DashboardStats> {
    trace!("Entering dashboard_stats");

    let total_students = student::Entity::find().count(conn).await?;
    let active_students = student::Entity::find()
        .filter(student::Column::IsActive.eq(true))
        .count(conn)
        .await?;
    let graduated_students = student::Entity::find()
        .filter(student::Column::Semester.eq(GRADUATED_SEMESTER))
        .count(conn)
        .await?;
    let pending_applications = application::Entity::find()
        .filter(application::Column::Status.eq(application::ApplicationStatus::Pending))
        .count(conn)
        .await?;

    let mut totals = LedgerTotals::default();
    for account in student_account::Entity::find().all(conn).await? {
        totals.add(&account);
    }

    Ok(DashboardStats {
        total_students,
        active_students,
        graduated_students,
        faculties: faculty::Entity::find().count(conn).await?,
        departments: department::Entity::find().count(conn).await?,
        courses: course::Entity::find().count(conn).await?,
        pending_applications,
        total_billed: totals.billed,
        total_collected: totals.collected,
        total_outstanding: totals.outstanding,
    })
}

/// Most recent payments, newest first.
pub async fn recent_payments<C: ConnectionTrait>(conn: &C, limit: u64) -> Result<Vec<payment::Model>> {
    Ok(payment::Entity::find()
        .order_by_desc(payment::Column::PaymentDate)
        .order_by_desc(payment::Column::Id)
        .limit(limit)
        .all(conn)
        .await?)
}

#[instrument(skip(conn))]
pub async fn financial_report<C: ConnectionTrait>(conn: &C) -> Result<FinancialReport> {
    trace!("Entering financial_report");

    let departments = department::Entity::find()
        .order_by_asc(department::Column::Name)
        .all(conn)
        .await?;
    let students = student::Entity::find().all(conn).await?;
    let accounts = student_account::Entity::find().all(conn).await?;

    let department_of: HashMap<i32, i32> =
        students.iter().map(|s| (s.id, s.department_id)).collect();

    let mut student_counts: HashMap<i32, u64> = HashMap::new();
    for student in &students {
        *student_counts.entry(student.department_id).or_default() += 1;
    }

    let mut per_department: HashMap<i32, LedgerTotals> = HashMap::new();
    for account in &accounts {
        if let Some(department_id) = department_of.get(&account.student_id) {
            per_department.entry(*department_id).or_default().add(account);
        }
    }

    let mut report = FinancialReport {
        departments: Vec::with_capacity(departments.len()),
        total_billed: Decimal::ZERO,
        total_collected: Decimal::ZERO,
        total_outstanding: Decimal::ZERO,
    };

    for dept in departments {
        let totals = per_department.get(&dept.id).copied().unwrap_or_default();
        report.total_billed += totals.billed;
        report.total_collected += totals.collected;
        report.total_outstanding += totals.outstanding;
        report.departments.push(DepartmentFinancialSummary {
            department_id: dept.id,
            department_name: dept.name,
            student_count: student_counts.get(&dept.id).copied().unwrap_or(0),
            billed: totals.billed,
            discounts: totals.discounts,
            scholarships: totals.scholarships,
            forwarded: totals.forwarded,
            collected: totals.collected,
            outstanding: totals.outstanding,
        });
    }

    debug!("Financial report covers {} departments", report.departments.len());
    Ok(report)
}

/// Payments dated within `[from, to]`, both ends optional and inclusive.
pub async fn payments_between<C: ConnectionTrait>(
    conn: &C,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<payment::Model>> {
    let mut query = payment::Entity::find();
    if let Some(from) = from {
        query = query.filter(payment::Column::PaymentDate.gte(from));
    }
    if let Some(to) = to {
        query = query.filter(payment::Column::PaymentDate.lte(to));
    }
    Ok(query
        .order_by_asc(payment::Column::PaymentDate)
        .order_by_asc(payment::Column::Id)
        .all(conn)
        .await?)
}

#[instrument(skip(conn))]
pub async fn payment_report<C: ConnectionTrait>(
    conn: &C,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<PaymentReport> {
    trace!("Entering payment_report");

    let payments = payments_between(conn, from, to).await?;

    let mut total_amount = Decimal::ZERO;
    let mut by_method: Vec<PaymentMethodTotal> = common::PaymentMethod::ALL
        .iter()
        .map(|method| PaymentMethodTotal {
            method: *method,
            amount: Decimal::ZERO,
            count: 0,
        })
        .collect();
    let mut by_month: BTreeMap<String, (Decimal, u64)> = BTreeMap::new();

    for payment in &payments {
        total_amount += payment.amount;

        let method: common::PaymentMethod = payment.method.into();
        if let Some(entry) = by_method.iter_mut().find(|m| m.method == method) {
            entry.amount += payment.amount;
            entry.count += 1;
        }

        let month = by_month
            .entry(payment.payment_date.format("%Y-%m").to_string())
            .or_insert((Decimal::ZERO, 0));
        month.0 += payment.amount;
        month.1 += 1;
    }

    by_method.retain(|m| m.count > 0);

    Ok(PaymentReport {
        from,
        to,
        payment_count: payments.len() as u64,
        total_amount,
        by_method,
        by_month: by_month
            .into_iter()
            .map(|(month, (amount, count))| MonthlyCollection {
                month,
                amount,
                count,
            })
            .collect(),
    })
}

/// Active students whose current ledger row still has a positive balance,
/// largest balance first.
#[instrument(skip(conn))]
pub async fn dues_report<C: ConnectionTrait>(
    conn: &C,
    department_id: Option<i32>,
) -> Result<Vec<DueEntry>> {
    trace!("Entering dues_report");

    let mut query = student::Entity::find().filter(student::Column::IsActive.eq(true));
    if let Some(department_id) = department_id {
        query = query.filter(student::Column::DepartmentId.eq(department_id));
    }
    let students = query.order_by_asc(student::Column::Id).all(conn).await?;

    let ids: Vec<i32> = students.iter().map(|s| s.id).collect();
    let accounts = current_accounts(conn, &ids).await?;

    let mut dues: Vec<DueEntry> = students
        .into_iter()
        .filter_map(|student| {
            let account = accounts.get(&student.id)?;
            let inputs = TuitionInputs::from(account);
            let status = inputs.status();
            if status == BalanceStatus::Paid {
                return None;
            }
            Some(DueEntry {
                student_id: student.id,
                name: student.full_name(),
                student_code: student.student_id,
                department_id: student.department_id,
                semester: account.semester.clone(),
                academic_year: account.academic_year.clone(),
                balance: inputs.balance(),
                status,
            })
        })
        .collect();

    dues.sort_by(|a, b| b.balance.cmp(&a.balance).then(a.student_id.cmp(&b.student_id)));
    debug!("{} students owe money", dues.len());
    Ok(dues)
}
