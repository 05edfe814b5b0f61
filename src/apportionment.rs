// ⚖️ Apportionment Engine - proportional rateio by months worked
//
//   share_i = total * months_i / sum(months)
//
// Each share is rounded half-to-even to the centavo, then the rounding remainder
// is handed out one centavo at a time so the shares add up to the total exactly.

use crate::duration::{MAX_MONTHS, MIN_MONTHS};
use crate::money::Money;
use crate::teacher::{ServantStatus, TeacherRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApportionmentError {
    #[error("no records to apportion")]
    EmptyInput,

    #[error("entry {index} has {months} months worked, expected 1..=120")]
    InvalidShare { index: usize, months: u32 },
}

/// One line of an apportionment result, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation<Id> {
    pub id: Id,
    pub months_worked: u32,
    pub share: Money,
}

/// Rounding bookkeeping for a single entry.
struct Provisional {
    index: usize,
    share: i64,
    /// Numerator of the fractional part; the denominator is total_months.
    remainder: i128,
    rounded_up: bool,
}

/// Split `total` across `entries` in proportion to their months worked.
///
/// Example:
/// ```
/// use fundef_registry::{apportion, Money};
///
/// let shares = apportion(Money::from_cents(1_000), &[("A", 1), ("B", 1), ("C", 1)]).unwrap();
/// let cents: Vec<i64> = shares.iter().map(|a| a.share.cents()).collect();
/// assert_eq!(cents, vec![334, 333, 333]);
/// ```
pub fn apportion<Id: Clone>(
    total: Money,
    entries: &[(Id, u32)],
) -> Result<Vec<Allocation<Id>>, ApportionmentError> {
    if entries.is_empty() {
        return Err(ApportionmentError::EmptyInput);
    }

    if let Some((index, (_, months))) = entries
        .iter()
        .enumerate()
        .find(|(_, (_, months))| !(MIN_MONTHS..=MAX_MONTHS).contains(months))
    {
        return Err(ApportionmentError::InvalidShare {
            index,
            months: *months,
        });
    }

    let total_months: i128 = entries.iter().map(|(_, months)| *months as i128).sum();
    let total_cents = total.cents() as i128;

    let mut provisional: Vec<Provisional> = entries
        .iter()
        .enumerate()
        .map(|(index, (_, months))| {
            let numerator = total_cents * *months as i128;
            let quotient = numerator.div_euclid(total_months);
            let remainder = numerator.rem_euclid(total_months);

            let rounded_up = match (2 * remainder).cmp(&total_months) {
                Ordering::Greater => true,
                Ordering::Equal => quotient % 2 != 0,
                Ordering::Less => false,
            };

            Provisional {
                index,
                share: (quotient + rounded_up as i128) as i64,
                remainder,
                rounded_up,
            }
        })
        .collect();

    let allocated: i128 = provisional.iter().map(|p| p.share as i128).sum();
    reconcile(&mut provisional, total_cents - allocated);

    Ok(entries
        .iter()
        .zip(provisional.iter())
        .map(|((id, months), p)| Allocation {
            id: id.clone(),
            months_worked: *months,
            share: Money::from_cents(p.share),
        })
        .collect())
}

/// Move the rounding difference one centavo at a time.
///
/// A positive difference goes to entries that were rounded down, a negative one
/// comes out of entries that were rounded up, always largest fractional part
/// first with ties in input order. Either way no share moves more than one
/// centavo away from its exact value.
fn reconcile(provisional: &mut [Provisional], difference: i128) {
    if difference == 0 {
        return;
    }

    let take_from_rounded_up = difference < 0;
    let step: i64 = if take_from_rounded_up { -1 } else { 1 };

    let mut candidates: Vec<usize> = provisional
        .iter()
        .filter(|p| p.rounded_up == take_from_rounded_up)
        .map(|p| p.index)
        .collect();
    candidates.sort_by(|a, b| {
        provisional[*b]
            .remainder
            .cmp(&provisional[*a].remainder)
            .then(a.cmp(b))
    });

    for index in candidates.into_iter().take(difference.unsigned_abs() as usize) {
        provisional[index].share += step;
    }
}

/// Sum of the shares of an apportionment.
pub fn total_allocated<Id>(allocations: &[Allocation<Id>]) -> Money {
    Money::from_cents(allocations.iter().map(|a| a.share.cents()).sum())
}

// ============================================================================
// RATEIO REPORT (apportionment over registered teachers)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApportionmentRow {
    pub teacher_id: Option<i64>,
    pub name: String,
    pub cpf: String,
    pub school: String,
    pub role: String,
    pub status: ServantStatus,
    pub months_worked: u32,
    pub share: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApportionmentReport {
    pub total: Money,
    pub total_months: u64,
    pub rows: Vec<ApportionmentRow>,
}

impl ApportionmentReport {
    pub fn summary(&self) -> String {
        format!(
            "Rateio of {} across {} teachers ({} months in total)",
            self.total.to_brl(),
            self.rows.len(),
            self.total_months
        )
    }
}

/// Apportion `total` across `teachers`, keeping their order.
pub fn apportion_records(
    total: Money,
    teachers: &[TeacherRecord],
) -> Result<ApportionmentReport, ApportionmentError> {
    let entries: Vec<(usize, u32)> = teachers
        .iter()
        .enumerate()
        .map(|(i, t)| (i, t.months_worked))
        .collect();

    let allocations = apportion(total, &entries)?;

    let rows = allocations
        .into_iter()
        .map(|allocation| {
            let teacher = &teachers[allocation.id];
            ApportionmentRow {
                teacher_id: teacher.id,
                name: teacher.name.clone(),
                cpf: teacher.cpf.formatted(),
                school: teacher.school.clone(),
                role: teacher.role.clone(),
                status: teacher.status,
                months_worked: allocation.months_worked,
                share: allocation.share,
            }
        })
        .collect();

    Ok(ApportionmentReport {
        total,
        total_months: entries.iter().map(|(_, m)| *m as u64).sum(),
        rows,
    })
}
