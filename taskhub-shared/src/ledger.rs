/// Balance ledger model
///
/// Pure functions that decide whether a balance-affecting action is
/// admissible and what the resulting balance is. Nothing here performs I/O;
/// persisting the new balance is the caller's job, and it must only do so
/// after the action has been admitted here.
///
/// # Events
///
/// | Event              | Balance change                  |
/// |--------------------|---------------------------------|
/// | task funding       | `- payable_amount × workers`    |
/// | purchase credit    | `+ package coins`               |
/// | approval credit    | `+ task payable_amount`         |
/// | withdrawal debit   | `- coins withdrawn`             |
///
/// # Example
///
/// ```
/// use taskhub_shared::ledger;
/// use taskhub_shared::money::Coins;
///
/// let cost = ledger::compute_task_cost(Coins::whole(5), 4);
/// let balance = ledger::apply_task_creation(Coins::whole(50), cost).unwrap();
/// assert_eq!(balance, Coins::whole(30));
/// ```

use crate::error::{LedgerError, LedgerResult};
use crate::models::submission::{Decision, SubmissionStatus};
use crate::models::task::TaskDraft;
use crate::models::user::Role;
use crate::money::{Coins, Usd};
use crate::validation;
use chrono::{DateTime, Utc};

/// Smallest withdrawal accepted, in coins
pub const MIN_WITHDRAWAL_COINS: Coins = Coins::whole(200);

/// Withdrawal conversion rate
pub const COINS_PER_DOLLAR: u32 = 20;

/// Balance granted when an account is registered
pub fn starting_balance(role: Role) -> Coins {
    role.starting_balance()
}

/// Escrow for a task: `payable_amount × required_workers`.
///
/// Saturates instead of overflowing; a saturated cost is never affordable.
pub fn compute_task_cost(payable_amount: Coins, required_workers: u32) -> Coins {
    payable_amount
        .checked_mul(required_workers)
        .unwrap_or(Coins::from_cents(i64::MAX))
}

pub fn can_afford_task(balance: Coins, total_cost: Coins) -> bool {
    total_cost <= balance
}

/// Amount missing to fund `total_cost`, `None` when affordable
pub fn shortfall(balance: Coins, total_cost: Coins) -> Option<Coins> {
    if can_afford_task(balance, total_cost) {
        None
    } else {
        Some(total_cost.saturating_sub(balance))
    }
}

/// Debits task escrow from `balance`
pub fn apply_task_creation(balance: Coins, total_cost: Coins) -> LedgerResult<Coins> {
    if !can_afford_task(balance, total_cost) {
        return Err(LedgerError::InsufficientFunds {
            required: total_cost,
            available: balance,
        });
    }
    Ok(balance.saturating_sub(total_cost))
}

/// Inverse of [`apply_task_creation`]
pub fn refund_task_creation(balance: Coins, total_cost: Coins) -> Coins {
    balance.saturating_add(total_cost)
}

/// Admitted task creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskFunding {
    pub total_cost: Coins,
    pub new_balance: Coins,
}

/// Validates a draft and debits its escrow in one step.
///
/// Zero-cost tasks are rejected as a `payable_amount` validation error.
pub fn plan_task_creation(
    draft: &TaskDraft,
    balance: Coins,
    now: DateTime<Utc>,
) -> LedgerResult<TaskFunding> {
    validation::validate_task_fields(draft, now)?;

    let total_cost = compute_task_cost(draft.payable_amount, draft.required_workers);
    if total_cost.is_zero() {
        return Err(LedgerError::validation(
            "payable_amount",
            "total cost must be greater than zero",
        ));
    }

    let new_balance = apply_task_creation(balance, total_cost)?;
    Ok(TaskFunding {
        total_cost,
        new_balance,
    })
}

/// Outcome of resolving a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub status: SubmissionStatus,

    /// Amount owed to the worker; set only on approval
    pub worker_credit: Option<Coins>,
}

/// Resolves a pending submission.
///
/// Fails with `InvalidStateTransition` unless `current` is `pending`.
pub fn resolve_submission(
    current: SubmissionStatus,
    decision: Decision,
    payable_amount: Coins,
) -> LedgerResult<Resolution> {
    let target = decision.target_status();
    if !current.can_transition_to(target) {
        return Err(LedgerError::InvalidStateTransition {
            from: current,
            to: target,
        });
    }

    let worker_credit = match decision {
        Decision::Approve => Some(payable_amount),
        Decision::Reject => None,
    };

    Ok(Resolution {
        status: target,
        worker_credit,
    })
}

pub fn apply_approval_credit(balance: Coins, amount: Coins) -> Coins {
    balance.saturating_add(amount)
}

/// Checks a withdrawal request. The minimum is checked before the balance.
pub fn validate_withdrawal(
    balance: Coins,
    coin_to_withdraw: Coins,
    minimum: Coins,
) -> LedgerResult<()> {
    if coin_to_withdraw < minimum {
        return Err(LedgerError::BelowMinimum {
            requested: coin_to_withdraw,
            minimum,
        });
    }
    if coin_to_withdraw > balance {
        return Err(LedgerError::InsufficientFunds {
            required: coin_to_withdraw,
            available: balance,
        });
    }
    Ok(())
}

/// Dollar payout for `coin_to_withdraw` at `rate` coins per dollar,
/// rounded half-up to the cent
pub fn compute_withdrawal_amount(coin_to_withdraw: Coins, rate: u32) -> Usd {
    let rate = i64::from(rate.max(1));
    let cents = coin_to_withdraw.cents();
    let whole = cents.div_euclid(rate);
    // remainder < rate <= u32::MAX, so doubling it cannot overflow
    let round_up = cents.rem_euclid(rate) * 2 >= rate;
    Usd::from_cents(if round_up { whole + 1 } else { whole })
}

/// Debits a withdrawal. Call only after the payout has been confirmed.
pub fn apply_withdrawal(balance: Coins, coin_to_withdraw: Coins) -> LedgerResult<Coins> {
    if coin_to_withdraw > balance {
        return Err(LedgerError::InsufficientFunds {
            required: coin_to_withdraw,
            available: balance,
        });
    }
    Ok(balance.saturating_sub(coin_to_withdraw))
}

/// Credits purchased coins. Call only after the charge has been confirmed.
pub fn apply_purchase_credit(balance: Coins, coins_purchased: Coins) -> Coins {
    balance.saturating_add(coins_purchased)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coins(n: i64) -> Coins {
        Coins::whole(n)
    }

    fn draft(pay: i64, workers: u32) -> TaskDraft {
        TaskDraft {
            task_title: "Survey".to_string(),
            task_detail: "Fill in a survey".to_string(),
            required_workers: workers,
            payable_amount: coins(pay),
            completion_date: Utc::now() + Duration::days(3),
            submission_info: "Screenshot".to_string(),
            task_image_url: None,
        }
    }

    #[test]
    fn test_compute_task_cost() {
        assert_eq!(compute_task_cost(coins(5), 4), coins(20));
        assert_eq!(compute_task_cost(Coins::from_cents(125), 3), Coins::from_cents(375));
        assert_eq!(compute_task_cost(coins(0), 10), Coins::ZERO);
        assert_eq!(compute_task_cost(coins(10), 0), Coins::ZERO);
    }

    #[test]
    fn test_overflowing_cost_is_unaffordable() {
        let cost = compute_task_cost(Coins::from_cents(i64::MAX / 2), u32::MAX);
        assert!(!can_afford_task(coins(1_000_000), cost));
    }

    #[test]
    fn test_apply_task_creation() {
        assert_eq!(
            apply_task_creation(coins(100), coins(150)),
            Err(LedgerError::InsufficientFunds {
                required: coins(150),
                available: coins(100),
            })
        );
        assert_eq!(apply_task_creation(coins(100), coins(60)), Ok(coins(40)));
        assert_eq!(apply_task_creation(coins(60), coins(60)), Ok(Coins::ZERO));
    }

    #[test]
    fn test_shortfall() {
        assert_eq!(shortfall(coins(30), coins(40)), Some(coins(10)));
        assert_eq!(shortfall(coins(40), coins(40)), None);
    }

    #[test]
    fn test_plan_task_creation() {
        let now = Utc::now();
        let funding = plan_task_creation(&draft(5, 4), coins(50), now).unwrap();
        assert_eq!(funding.total_cost, coins(20));
        assert_eq!(funding.new_balance, coins(30));

        let err = plan_task_creation(&draft(10, 4), coins(30), now).unwrap_err();
        assert_eq!(err.shortfall(), Some(coins(10)));
    }

    #[test]
    fn test_plan_rejects_zero_cost() {
        let err = plan_task_creation(&draft(0, 3), coins(50), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation { ref field, .. } if field == "payable_amount"
        ));
    }

    #[test]
    fn test_resolve_submission() {
        let approved = resolve_submission(SubmissionStatus::Pending, Decision::Approve, coins(5)).unwrap();
        assert_eq!(approved.status, SubmissionStatus::Approved);
        assert_eq!(approved.worker_credit, Some(coins(5)));

        let rejected = resolve_submission(SubmissionStatus::Pending, Decision::Reject, coins(5)).unwrap();
        assert_eq!(rejected.status, SubmissionStatus::Rejected);
        assert_eq!(rejected.worker_credit, None);

        assert_eq!(
            resolve_submission(SubmissionStatus::Approved, Decision::Approve, coins(5)),
            Err(LedgerError::InvalidStateTransition {
                from: SubmissionStatus::Approved,
                to: SubmissionStatus::Approved,
            })
        );
        assert!(resolve_submission(SubmissionStatus::Rejected, Decision::Approve, coins(5)).is_err());
    }

    #[test]
    fn test_validate_withdrawal() {
        assert_eq!(
            validate_withdrawal(coins(500), coins(150), MIN_WITHDRAWAL_COINS),
            Err(LedgerError::BelowMinimum {
                requested: coins(150),
                minimum: coins(200),
            })
        );
        assert_eq!(
            validate_withdrawal(coins(100), coins(250), MIN_WITHDRAWAL_COINS),
            Err(LedgerError::InsufficientFunds {
                required: coins(250),
                available: coins(100),
            })
        );
        assert_eq!(validate_withdrawal(coins(500), coins(250), MIN_WITHDRAWAL_COINS), Ok(()));
        assert_eq!(validate_withdrawal(coins(200), coins(200), MIN_WITHDRAWAL_COINS), Ok(()));
    }

    #[test]
    fn test_minimum_checked_before_balance() {
        assert!(matches!(
            validate_withdrawal(coins(100), coins(150), MIN_WITHDRAWAL_COINS),
            Err(LedgerError::BelowMinimum { .. })
        ));
    }

    #[test]
    fn test_compute_withdrawal_amount() {
        assert_eq!(compute_withdrawal_amount(coins(200), COINS_PER_DOLLAR), Usd::whole(10));
        assert_eq!(compute_withdrawal_amount(coins(1000), COINS_PER_DOLLAR), Usd::whole(50));
        assert_eq!(compute_withdrawal_amount(coins(300), COINS_PER_DOLLAR).to_string(), "$15.00");
        assert_eq!(compute_withdrawal_amount(coins(201), COINS_PER_DOLLAR), Usd::from_cents(1005));
    }

    #[test]
    fn test_compute_withdrawal_amount_extremes() {
        assert_eq!(
            compute_withdrawal_amount(Coins::from_cents(i64::MAX), COINS_PER_DOLLAR),
            Usd::from_cents(i64::MAX / 20)
        );
        assert_eq!(
            compute_withdrawal_amount(Coins::from_cents(i64::MAX), 1),
            Usd::from_cents(i64::MAX)
        );
        // 2 cents at 3 per dollar rounds up, 1 cent rounds down
        assert_eq!(compute_withdrawal_amount(Coins::from_cents(2), 3), Usd::from_cents(1));
        assert_eq!(compute_withdrawal_amount(Coins::from_cents(1), 3), Usd::ZERO);
    }

    #[test]
    fn test_apply_withdrawal_and_purchase() {
        assert_eq!(apply_withdrawal(coins(500), coins(300)), Ok(coins(200)));
        assert!(apply_withdrawal(coins(100), coins(300)).is_err());
        assert_eq!(apply_purchase_credit(coins(30), coins(150)), coins(180));
        assert_eq!(apply_approval_credit(coins(10), Coins::from_cents(250)), Coins::from_cents(1250));
    }

    #[test]
    fn test_refund_is_exact_inverse() {
        let mut balance = Coins::from_cents(5_001);
        let cost = Coins::from_cents(1);
        for _ in 0..1000 {
            balance = apply_task_creation(balance, cost).unwrap();
            balance = refund_task_creation(balance, cost);
        }
        assert_eq!(balance, Coins::from_cents(5_001));
    }

    #[test]
    fn test_starting_balance() {
        assert_eq!(starting_balance(Role::Worker), Coins::whole(10));
        assert_eq!(starting_balance(Role::Buyer), Coins::whole(50));
    }
}
