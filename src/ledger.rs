//! Pure computations behind the job-sheet ledger.
//!
//! Every mutation path in the service layer derives money fields, overdue
//! flags, warranty expiry and status-transition decisions through this module
//! and nowhere else. All functions are synchronous and side-effect free; the
//! services own persistence and atomicity.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::job_sheet::JobStatus;
use crate::errors::ServiceError;

/// Fixed quick-payment denominations offered next to the computed amounts.
pub const QUICK_DENOMINATIONS: [i64; 4] = [500, 1000, 2000, 5000];

/// Computes the total cost of a job sheet from its cost fields.
///
/// Inputs must be non-negative. An excess discount clamps the total at zero
/// rather than failing; that mirrors how the business actually uses the
/// discount field.
pub fn compute_total(
    labour_cost: Decimal,
    parts_cost: Decimal,
    discount_amount: Decimal,
) -> Result<Decimal, ServiceError> {
    for (field, value) in [
        ("labour_cost", labour_cost),
        ("parts_cost", parts_cost),
        ("discount_amount", discount_amount),
    ] {
        if value < Decimal::ZERO {
            return Err(ServiceError::InvalidAmount(format!(
                "{} must not be negative, got {}",
                field, value
            )));
        }
    }

    Ok((labour_cost + parts_cost - discount_amount).max(Decimal::ZERO))
}

/// Outstanding balance. Overpayment clamps at zero; the excess is visible
/// through [`is_overpaid`], not through a negative balance.
pub fn recompute_balance(total_amount: Decimal, paid_amount: Decimal) -> Decimal {
    (total_amount - paid_amount).max(Decimal::ZERO)
}

pub fn is_overpaid(total_amount: Decimal, paid_amount: Decimal) -> bool {
    paid_amount > total_amount
}

/// Convenience amounts for the payment form, derived from the latest
/// persisted balance on every call.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuickAmounts {
    /// Settles the sheet exactly.
    pub full: Decimal,
    /// Half the outstanding balance, rounded to 2 decimal places.
    pub half: Decimal,
    /// Fixed cash denominations.
    pub denominations: Vec<Decimal>,
}

pub fn quick_amounts(balance_amount: Decimal) -> QuickAmounts {
    QuickAmounts {
        full: balance_amount,
        half: (balance_amount / Decimal::from(2)).round_dp(2),
        denominations: QUICK_DENOMINATIONS.iter().copied().map(Decimal::from).collect(),
    }
}

/// Whether a job sheet has slipped past its expected completion date.
///
/// Day granularity, never persisted; finished and cancelled work is never
/// overdue no matter what the expected date says.
pub fn is_overdue(
    status: JobStatus,
    expected_completion_date: Option<NaiveDate>,
    today: NaiveDate,
) -> bool {
    if matches!(
        status,
        JobStatus::Completed | JobStatus::Delivered | JobStatus::Cancelled
    ) {
        return false;
    }

    match expected_completion_date {
        Some(expected) => expected < today,
        None => false,
    }
}

/// Warranty runs from the day the repair was completed. No completion date or
/// a zero/absent period means no warranty window.
pub fn warranty_expiry(
    completed_on: Option<NaiveDate>,
    warranty_period_days: Option<i32>,
) -> Option<NaiveDate> {
    match (completed_on, warranty_period_days) {
        (Some(date), Some(days)) if days > 0 => Some(date + Duration::days(i64::from(days))),
        _ => None,
    }
}

/// The transition table for the repair workflow.
///
/// Main line: pending → in_progress → waiting_parts → quality_check →
/// ready_delivery → delivered, with completed as a milestone that may precede
/// delivered. on_hold is reachable from and resumable to any non-terminal
/// state, cancelled from any non-terminal state. Re-asserting the current
/// status is a permitted no-op. Everything else is denied.
pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
    use JobStatus::*;

    if from.is_terminal() {
        return false;
    }

    match (from, to) {
        _ if from == to => true,
        (_, Cancelled) => true,
        (_, OnHold) => true,
        (OnHold, _) => !to.is_terminal(),
        (Pending, InProgress) => true,
        (InProgress, WaitingParts) => true,
        (InProgress, QualityCheck) => true,
        // small repairs skip the formal QC step
        (InProgress, ReadyDelivery) => true,
        (InProgress, Completed) => true,
        (WaitingParts, InProgress) => true,
        // rework loops
        (QualityCheck, InProgress) => true,
        (QualityCheck, ReadyDelivery) => true,
        (QualityCheck, Completed) => true,
        (ReadyDelivery, QualityCheck) => true,
        (ReadyDelivery, Completed) => true,
        (ReadyDelivery, Delivered) => true,
        (Completed, ReadyDelivery) => true,
        (Completed, Delivered) => true,
        _ => false,
    }
}

/// Checks a requested transition, with error messages that distinguish a
/// frozen terminal sheet from a denied move.
pub fn validate_transition(from: JobStatus, to: JobStatus) -> Result<(), ServiceError> {
    if from.is_terminal() {
        return Err(ServiceError::InvalidTransition(format!(
            "job sheet is {} and its status can no longer change",
            from
        )));
    }

    if !can_transition(from, to) {
        return Err(ServiceError::InvalidTransition(format!(
            "cannot move a job sheet from {} to {}",
            from, to
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn total_is_labour_plus_parts_minus_discount() {
        let total = compute_total(dec!(1000), dec!(500), dec!(200)).unwrap();
        assert_eq!(total, dec!(1300));
    }

    #[test]
    fn excess_discount_clamps_total_at_zero() {
        let total = compute_total(dec!(100), dec!(50), dec!(500)).unwrap();
        assert_eq!(total, Decimal::ZERO);
    }

    #[rstest]
    #[case(dec!(-1), dec!(0), dec!(0))]
    #[case(dec!(0), dec!(-0.01), dec!(0))]
    #[case(dec!(0), dec!(0), dec!(-10))]
    fn negative_cost_inputs_are_rejected(
        #[case] labour: Decimal,
        #[case] parts: Decimal,
        #[case] discount: Decimal,
    ) {
        let err = compute_total(labour, parts, discount).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidAmount(_)));
    }

    #[test]
    fn balance_is_total_minus_paid_clamped_at_zero() {
        assert_eq!(recompute_balance(dec!(1300), dec!(800)), dec!(500));
        assert_eq!(recompute_balance(dec!(1300), dec!(1300)), Decimal::ZERO);
        assert_eq!(recompute_balance(dec!(1300), dec!(1500)), Decimal::ZERO);
    }

    #[test]
    fn overpayment_is_flagged_not_negative() {
        assert!(!is_overpaid(dec!(1300), dec!(1300)));
        assert!(is_overpaid(dec!(1300), dec!(1300.01)));
    }

    #[test]
    fn quick_amounts_derive_from_balance() {
        let amounts = quick_amounts(dec!(501));
        assert_eq!(amounts.full, dec!(501));
        assert_eq!(amounts.half, dec!(250.50));
        assert_eq!(
            amounts.denominations,
            vec![dec!(500), dec!(1000), dec!(2000), dec!(5000)]
        );
    }

    #[test]
    fn overdue_requires_past_expected_date_and_open_status() {
        let today = Utc::now().date_naive();
        let yesterday = today - Duration::days(1);
        let tomorrow = today + Duration::days(1);

        assert!(is_overdue(JobStatus::InProgress, Some(yesterday), today));
        assert!(!is_overdue(JobStatus::InProgress, Some(today), today));
        assert!(!is_overdue(JobStatus::InProgress, Some(tomorrow), today));
        assert!(!is_overdue(JobStatus::InProgress, None, today));
    }

    #[rstest]
    #[case(JobStatus::Completed)]
    #[case(JobStatus::Delivered)]
    #[case(JobStatus::Cancelled)]
    fn finished_work_is_never_overdue(#[case] status: JobStatus) {
        let today = Utc::now().date_naive();
        assert!(!is_overdue(status, Some(today - Duration::days(30)), today));
    }

    #[test]
    fn warranty_expiry_runs_from_completion() {
        let completed = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(
            warranty_expiry(Some(completed), Some(90)),
            NaiveDate::from_ymd_opt(2025, 5, 30)
        );
        assert_eq!(warranty_expiry(Some(completed), Some(0)), None);
        assert_eq!(warranty_expiry(Some(completed), None), None);
        assert_eq!(warranty_expiry(None, Some(90)), None);
    }

    #[rstest]
    #[case(JobStatus::Pending, JobStatus::InProgress, true)]
    #[case(JobStatus::InProgress, JobStatus::WaitingParts, true)]
    #[case(JobStatus::WaitingParts, JobStatus::InProgress, true)]
    #[case(JobStatus::InProgress, JobStatus::QualityCheck, true)]
    #[case(JobStatus::QualityCheck, JobStatus::ReadyDelivery, true)]
    #[case(JobStatus::QualityCheck, JobStatus::InProgress, true)]
    #[case(JobStatus::ReadyDelivery, JobStatus::Delivered, true)]
    #[case(JobStatus::InProgress, JobStatus::Completed, true)]
    #[case(JobStatus::Completed, JobStatus::Delivered, true)]
    #[case(JobStatus::Pending, JobStatus::Delivered, false)]
    #[case(JobStatus::Pending, JobStatus::QualityCheck, false)]
    #[case(JobStatus::WaitingParts, JobStatus::Delivered, false)]
    fn workflow_moves_follow_the_table(
        #[case] from: JobStatus,
        #[case] to: JobStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(can_transition(from, to), allowed);
    }

    #[test]
    fn hold_and_cancel_are_reachable_from_any_open_state() {
        use sea_orm::Iterable;
        for status in JobStatus::iter().filter(|s| !s.is_terminal()) {
            assert!(can_transition(status, JobStatus::OnHold));
            assert!(can_transition(status, JobStatus::Cancelled));
        }
    }

    #[test]
    fn hold_resumes_to_open_states_but_never_straight_to_delivered() {
        assert!(can_transition(JobStatus::OnHold, JobStatus::InProgress));
        assert!(can_transition(JobStatus::OnHold, JobStatus::ReadyDelivery));
        assert!(!can_transition(JobStatus::OnHold, JobStatus::Delivered));
    }

    #[test]
    fn terminal_sheets_reject_everything_including_no_ops() {
        use sea_orm::Iterable;
        for to in JobStatus::iter() {
            assert!(!can_transition(JobStatus::Delivered, to));
            assert!(!can_transition(JobStatus::Cancelled, to));
        }
        assert!(matches!(
            validate_transition(JobStatus::Delivered, JobStatus::Delivered),
            Err(ServiceError::InvalidTransition(_))
        ));
    }

    #[test]
    fn no_op_reassertion_is_allowed_for_open_states() {
        assert!(can_transition(JobStatus::InProgress, JobStatus::InProgress));
        assert!(can_transition(JobStatus::OnHold, JobStatus::OnHold));
        assert!(validate_transition(JobStatus::Pending, JobStatus::Pending).is_ok());
    }
}
