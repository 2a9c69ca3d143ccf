use chrono::{Datelike, Duration, Months, NaiveDateTime};

use crate::error::CoreError;
use crate::models::{Frequency, OccurrenceRule, RuleRecord, ScheduleConfig};
use crate::window::Window;

/// Per-rule cap applied by the standard views.
pub const DEFAULT_OCCURRENCE_CAP: usize = 50;

/// Expands a rule into the occurrences that fall inside `window`.
///
/// # Arguments
/// * `rule` - The rule to expand; its anchor may lie before, inside or after the window
/// * `window` - Closed range `[lower, upper]` to intersect with
/// * `cap` - Maximum number of occurrences returned
///
/// # Returns
/// * `Result<Vec<NaiveDateTime>, CoreError>` - Strictly increasing instants, at most `cap`
///
/// # Behavior
/// - Generation ends at `rule.explicit_end`, or at `window.upper` when the rule has none
/// - The anchor is always generated, then filtered against the window like every other step
/// - Monthly steps are taken from the anchor and clamp to the end of shorter months
/// - `InvalidWindow` when `window.lower > window.upper`
pub fn expand(
    rule: &OccurrenceRule,
    window: &Window,
    cap: usize,
) -> Result<Vec<NaiveDateTime>, CoreError> {
    window.validate()?;

    let mut occurrences = Vec::new();
    if cap == 0 {
        return Ok(occurrences);
    }

    let effective_end = rule.explicit_end.unwrap_or(window.upper);

    for (index, candidate) in steps(*rule, first_index_near(rule, window.lower)) {
        if index > 0 && candidate > effective_end {
            break;
        }
        if candidate > window.upper {
            break;
        }
        if candidate >= window.lower {
            occurrences.push(candidate);
            if occurrences.len() == cap {
                break;
            }
        }
    }

    // Steps are strictly increasing, so the output is already sorted and unique.
    Ok(occurrences)
}

/// Finds the first occurrence strictly after `after`, if the rule has one.
pub fn next_occurrence_after(rule: &OccurrenceRule, after: NaiveDateTime) -> Option<NaiveDateTime> {
    steps(*rule, first_index_near(rule, after))
        .take_while(|(index, candidate)| {
            *index == 0 || rule.explicit_end.map_or(true, |end| *candidate <= end)
        })
        .map(|(_, candidate)| candidate)
        .find(|candidate| *candidate > after)
}

/// The `index`-th step of a rule, or `None` past the representable range.
fn step_at(rule: &OccurrenceRule, index: u32) -> Option<NaiveDateTime> {
    match rule.frequency {
        Frequency::None => (index == 0).then_some(rule.anchor),
        Frequency::Weekly => rule
            .anchor
            .checked_add_signed(Duration::weeks(i64::from(index))),
        // chrono clamps the day to the last valid day of the target month.
        Frequency::Monthly => rule.anchor.checked_add_months(Months::new(index)),
    }
}

fn steps(rule: OccurrenceRule, start: u32) -> impl Iterator<Item = (u32, NaiveDateTime)> {
    (start..).map_while(move |index| step_at(&rule, index).map(|instant| (index, instant)))
}

/// Index of a step that is not after `instant`, as close to it as cheaply computable.
fn first_index_near(rule: &OccurrenceRule, instant: NaiveDateTime) -> u32 {
    if instant <= rule.anchor {
        return 0;
    }

    let index = match rule.frequency {
        Frequency::None => 0,
        Frequency::Weekly => (instant - rule.anchor).num_weeks(),
        Frequency::Monthly => {
            let months = i64::from(instant.year() - rule.anchor.year()) * 12
                + i64::from(instant.month())
                - i64::from(rule.anchor.month());
            // One month back keeps the step strictly before `instant` even
            // when the anchor's day-of-month is later than `instant`'s.
            months - 1
        }
    };

    index.clamp(0, i64::from(u32::MAX)) as u32
}

/// RecurrenceExpander: the expansion contract bound to a configured cap.
///
/// Responsibilities:
/// 1. Validate stored rule records before expansion
/// 2. Expand validated rules against caller-supplied windows
/// 3. Enforce the per-rule occurrence cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceExpander {
    cap: usize,
}

impl Default for RecurrenceExpander {
    fn default() -> Self {
        Self::new(DEFAULT_OCCURRENCE_CAP)
    }
}

impl RecurrenceExpander {
    pub fn new(cap: usize) -> Self {
        Self { cap }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(config.occurrence_cap)
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn expand(
        &self,
        rule: &OccurrenceRule,
        window: &Window,
    ) -> Result<Vec<NaiveDateTime>, CoreError> {
        expand(rule, window, self.cap)
    }

    /// Validates a stored record and expands it.
    ///
    /// # Returns
    /// * `Result<(OccurrenceRule, Vec<NaiveDateTime>), CoreError>` - The validated rule and its occurrences
    ///
    /// # Behavior
    /// - `InvalidRule` for a missing anchor or an unrecognized frequency label
    pub fn expand_record(
        &self,
        record: &RuleRecord,
        window: &Window,
    ) -> Result<(OccurrenceRule, Vec<NaiveDateTime>), CoreError> {
        let rule = OccurrenceRule::try_from(record)?;
        let occurrences = self.expand(&rule, window)?;
        Ok((rule, occurrences))
    }
}
