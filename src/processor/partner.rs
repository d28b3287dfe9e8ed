use crate::model::{AccountingRecord, MatchTier, Side};

use super::similarity;
use super::tables::{PartnerDynamicList, PartnerFixedList};

/// Lowest similarity at which a master entry is proposed as a candidate.
pub const FUZZY_THRESHOLD: f64 = 0.6;

#[derive(Debug, PartialEq)]
pub struct Resolution {
    pub tier: MatchTier,
    /// Proposed master name, only set for fuzzy matches.
    pub candidate: Option<String>,
}

impl Resolution {
    fn exact(tier: MatchTier) -> Self {
        Self {
            tier,
            candidate: None,
        }
    }
}

/// Classifies counterparty names against the partner tables. The names
/// themselves are never rewritten; the outcome is recorded as a match tier
/// per side and a candidate for human review.
pub struct PartnerResolver<'a> {
    fixed: &'a PartnerFixedList,
    dynamic: &'a PartnerDynamicList,
}

impl<'a> PartnerResolver<'a> {
    pub fn new(fixed: &'a PartnerFixedList, dynamic: &'a PartnerDynamicList) -> Self {
        Self { fixed, dynamic }
    }

    pub fn resolve_all(&self, records: &mut [AccountingRecord]) {
        for record in records.iter_mut() {
            self.resolve_record(record);
        }
    }

    pub fn resolve_record(&self, record: &mut AccountingRecord) {
        fill_blank_side(record);

        let mut candidates = Vec::new();
        for side in Side::BOTH {
            let partner = record.side(side).partner.trim();
            let resolution = if partner.is_empty() {
                Resolution::exact(MatchTier::Unmatched)
            } else {
                self.resolve(partner)
            };

            log::debug!(
                "Row {}: {} partner `{}` -> {}",
                record.row_number,
                side,
                record.side(side).partner,
                resolution.tier
            );

            if resolution.tier == MatchTier::Unmatched && !partner.is_empty() {
                let message = format!("{side} counterparty not resolved: {partner}");
                record.add_error(message);
            }
            record.side_mut(side).partner_match = resolution.tier;
            candidates.push(resolution.candidate);
        }

        record.candidate = candidate_column(candidates[0].as_deref(), candidates[1].as_deref());
    }

    /// First tier that recognises `partner` wins.
    pub fn resolve(&self, partner: &str) -> Resolution {
        if self.fixed.contains(partner) {
            return Resolution::exact(MatchTier::FixedList);
        }
        if self.dynamic.is_active(partner) {
            return Resolution::exact(MatchTier::DynamicExact);
        }

        match self.best_fuzzy_match(partner) {
            Some(candidate) => Resolution {
                tier: MatchTier::Fuzzy,
                candidate: Some(candidate.to_string()),
            },
            None => Resolution::exact(MatchTier::Unmatched),
        }
    }

    /// Highest scoring active master entry at or above the threshold. Equal
    /// scores keep master order.
    fn best_fuzzy_match(&self, partner: &str) -> Option<&'a str> {
        let mut best: Option<(&'a str, f64)> = None;

        for name in self.dynamic.active() {
            let score = similarity::ratio(partner, name);
            if score < FUZZY_THRESHOLD {
                continue;
            }
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((name, score));
            }
        }

        best.map(|(name, _)| name)
    }
}

/// When exactly one side names a counterparty, the blank side gets a copy
/// of it. The named side is left as it was.
fn fill_blank_side(record: &mut AccountingRecord) {
    let debit_blank = record.debit.partner.trim().is_empty();
    let credit_blank = record.credit.partner.trim().is_empty();

    match (debit_blank, credit_blank) {
        (true, false) => record.debit.partner = record.credit.partner.clone(),
        (false, true) => record.credit.partner = record.debit.partner.clone(),
        _ => {}
    }
}

fn candidate_column(debit: Option<&str>, credit: Option<&str>) -> String {
    match (debit, credit) {
        (Some(debit), Some(credit)) if debit == credit => debit.to_string(),
        (Some(debit), Some(credit)) => format!("{debit} / {credit}"),
        (Some(only), None) | (None, Some(only)) => only.to_string(),
        (None, None) => String::new(),
    }
}
