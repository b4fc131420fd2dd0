//! Strike escalation for reporters whose submissions get flagged.
//!
//! Each flagged report adds one strike. Once the count is strictly above the
//! threshold the reporter's history is poisoned: every report they have ever
//! made, at any venue, is flagged. The state transition is a pure function;
//! [`record_strike`] applies it to a store.

use cs_common::{ReporterId, Result, StandingState};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::ReportStore;

// ---------------------------------------------------------------------------
// Pure transition
// ---------------------------------------------------------------------------

/// One strike applied to a reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StrikeTransition {
    pub strikes_before: u32,
    pub strikes_after: u32,
    pub before: StandingState,
    pub after: StandingState,
}

impl StrikeTransition {
    /// True on the strike that first crosses the threshold.
    pub fn escalated(&self) -> bool {
        self.before == StandingState::GoodStanding && self.after == StandingState::HistoryPoisoned
    }

    /// Whether history must be (re-)flagged after this strike.
    pub fn poisons_history(&self) -> bool {
        self.after == StandingState::HistoryPoisoned
    }
}

/// Compute the effect of one more strike.
pub fn add_strike(strikes: u32, threshold: u32) -> StrikeTransition {
    let strikes_after = strikes.saturating_add(1);
    StrikeTransition {
        strikes_before: strikes,
        strikes_after,
        before: StandingState::for_strikes(strikes, threshold),
        after: StandingState::for_strikes(strikes_after, threshold),
    }
}

// ---------------------------------------------------------------------------
// Store application
// ---------------------------------------------------------------------------

/// Result of recording a strike against a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StrikeOutcome {
    pub strikes: u32,
    pub state: StandingState,
    /// This strike was the one that crossed the threshold.
    pub escalated: bool,
    /// Reports newly flagged by the history sweep.
    pub reports_mass_flagged: usize,
}

/// Increment the reporter's counter and poison their history if the new
/// count exceeds `threshold`.
///
/// Mass-flagging repeats on every strike while above the threshold, so
/// reports made after the first escalation are caught as well.
pub fn record_strike<S: ReportStore>(
    store: &mut S,
    reporter: &ReporterId,
    threshold: u32,
) -> Result<StrikeOutcome> {
    let strikes = store.increment_strike_counter(reporter)?;
    let transition = add_strike(strikes.saturating_sub(1), threshold);

    let reports_mass_flagged = if transition.poisons_history() {
        store.mass_flag_reports(reporter)?
    } else {
        0
    };

    Ok(StrikeOutcome {
        strikes,
        state: transition.after,
        escalated: transition.escalated(),
        reports_mass_flagged,
    })
}
