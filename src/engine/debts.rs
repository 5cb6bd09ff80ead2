//! Debt, payment and overdue (srok) aggregation.

use crate::domain::{
    BalanceRecord, Currency, CurrencyBuckets, CurrencyPolicy, Decimal, Order, PartyRef,
    PaymentRecord, SdDate, SdId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Currency-bucketed view of outstanding debt and received payments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtSummary {
    /// Positive debt magnitudes per currency.
    pub debt: CurrencyBuckets,
    /// Clients with a negative balance.
    pub debtor_count: u64,
    pub payments: CurrencyBuckets,
}

/// Fold balances and payments into the debt summary.
///
/// Debt buckets take the positive magnitude of each negative per-currency
/// amount on debtor records; credit slices on a debtor record are not debt
/// and are skipped. Payment buckets key off the payment type, unknown
/// types landing in local-cash.
pub fn aggregate_debt(
    balances: &[BalanceRecord],
    payments: &[PaymentRecord],
    policy: &CurrencyPolicy,
) -> DebtSummary {
    let mut summary = DebtSummary::default();
    for record in balances {
        if !record.is_debtor() {
            continue;
        }
        summary.debtor_count += 1;
        add_debt_slices(&mut summary.debt, record);
    }
    summary.payments = payment_buckets(payments, policy);
    summary
}

/// Payments bucketed by their payment type's currency.
pub fn payment_buckets(payments: &[PaymentRecord], policy: &CurrencyPolicy) -> CurrencyBuckets {
    let mut buckets = CurrencyBuckets::new();
    for payment in payments {
        buckets.add(policy.payment_currency(payment.payment_type.as_ref()), payment.amount);
    }
    buckets
}

fn add_debt_slices(buckets: &mut CurrencyBuckets, record: &BalanceRecord) {
    for slice in &record.by_currency {
        if slice.amount.is_negative() {
            buckets.add(Currency::from_upstream_id(&slice.currency_id), slice.amount.abs());
        }
    }
}

/// One client's overdue anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOverdue {
    pub client: PartyRef,
    /// Earliest due date across the client's unpaid orders.
    pub srok: SdDate,
    /// Whole days past the anchor, floored at zero.
    pub overdue_days: i64,
    pub is_overdue: bool,
}

/// Resolve each client's overdue anchor from unpaid orders.
///
/// An order is unpaid while its total minus the payments matched to it stays
/// positive. Sentinel due dates carry no information and are discarded; the
/// earliest surviving due date per client becomes the anchor.
pub fn compute_overdue(
    orders: &[Order],
    payments: &[PaymentRecord],
    today: &SdDate,
) -> HashMap<SdId, ClientOverdue> {
    let mut paid_per_order: HashMap<&SdId, Decimal> = HashMap::new();
    for payment in payments {
        if let Some(order_id) = &payment.order_id {
            let slot = paid_per_order.entry(order_id).or_insert_with(Decimal::zero);
            *slot = *slot + payment.amount;
        }
    }

    let mut anchors: HashMap<SdId, ClientOverdue> = HashMap::new();
    for order in orders {
        if order.is_full_return() || order.client.id.is_empty() {
            continue;
        }
        let due = match &order.due_date {
            Some(d) if !d.is_sentinel() => d,
            _ => continue,
        };
        let paid = paid_per_order
            .get(&order.id)
            .copied()
            .unwrap_or_else(Decimal::zero);
        if !(order.total - paid).is_positive() {
            continue;
        }

        let keep = match anchors.get(&order.client.id) {
            Some(existing) => *due < existing.srok,
            None => true,
        };
        if keep {
            anchors.insert(
                order.client.id.clone(),
                ClientOverdue {
                    client: order.client.clone(),
                    srok: due.clone(),
                    overdue_days: 0,
                    is_overdue: false,
                },
            );
        }
    }

    for overdue in anchors.values_mut() {
        overdue.overdue_days = overdue.srok.days_until(today).unwrap_or(0).max(0);
        overdue.is_overdue = overdue.srok < *today;
    }
    anchors
}

/// Per-agent debt exposure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDebt {
    pub agent: PartyRef,
    /// Sum of debtor balance magnitudes attributed to this agent.
    pub total: Decimal,
    pub by_currency: CurrencyBuckets,
    pub debtor_count: u64,
    pub overdue_count: u64,
    pub worst_overdue_days: i64,
}

/// Roll debtor balances up to the agent who most recently sold to each
/// client. On equal order dates the later-fetched order wins. Debtors with
/// no order history have no attributable agent and are skipped.
pub fn aggregate_agent_debts(
    balances: &[BalanceRecord],
    orders: &[Order],
    overdue: &HashMap<SdId, ClientOverdue>,
) -> Vec<AgentDebt> {
    let mut latest_agent: HashMap<&SdId, (&SdDate, &PartyRef)> = HashMap::new();
    for order in orders {
        if order.client.id.is_empty() || order.agent.id.is_empty() {
            continue;
        }
        let replace = match latest_agent.get(&order.client.id) {
            Some((date, _)) => order.date >= **date,
            None => true,
        };
        if replace {
            latest_agent.insert(&order.client.id, (&order.date, &order.agent));
        }
    }

    let mut rows: Vec<AgentDebt> = Vec::new();
    let mut index: HashMap<SdId, usize> = HashMap::new();
    for record in balances {
        if !record.is_debtor() {
            continue;
        }
        let agent = match latest_agent.get(&record.client.id) {
            Some((_, agent)) => *agent,
            None => continue,
        };
        let row = *index.entry(agent.id.clone()).or_insert_with(|| {
            rows.push(AgentDebt {
                agent: agent.clone(),
                total: Decimal::zero(),
                by_currency: CurrencyBuckets::new(),
                debtor_count: 0,
                overdue_count: 0,
                worst_overdue_days: 0,
            });
            rows.len() - 1
        });
        rows[row].total = rows[row].total + record.balance.abs();
        rows[row].debtor_count += 1;
        add_debt_slices(&mut rows[row].by_currency, record);
        if let Some(o) = overdue.get(&record.client.id) {
            if o.is_overdue {
                rows[row].overdue_count += 1;
                rows[row].worst_overdue_days = rows[row].worst_overdue_days.max(o.overdue_days);
            }
        }
    }

    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows
}
