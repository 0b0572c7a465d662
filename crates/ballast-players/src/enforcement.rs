//! Hoarding enforcement state machine.
//!
//! Implements the report pipeline for one target record:
//!
//! 1. [`evaluate`] -- Judge a report against the target's attributed
//!    weight. Returns a [`Verdict`]: a fine, an escalation, or a deferral
//!    while an escort is already running.
//! 2. [`record_fine`] -- Append the fine once the caller knows whether the
//!    wallet covered it.
//! 3. [`advance`] -- Step the escort sequence: an investigation countdown,
//!    then announce, move, seize, escort, execute and cleanup.
//! 4. [`settle`] / [`finish`] -- Reset strikes at execution, release the
//!    record at cleanup and hand back deferred reports.
//!
//! # Design
//!
//! Everything here is a pure function of the record. The zone owns the
//! per-player lock, the wallet, the pool and the ledger, and performs the
//! side effects each verdict or step asks for. Only one escort can be in
//! flight per record: while the stage is `escalated`, further reports are
//! queued on the record and replayed after cleanup.

use ballast_types::{EnforcementRecord, EnforcementStage, EscortPhase, FineEntry, PlayerId, Standing};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EnforcementError;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Enforcement tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementRules {
    /// Attributed weight at which a report produces a strike.
    #[serde(default = "default_minor_threshold")]
    pub minor_threshold: Decimal,
    /// Attributed weight at which a report escalates immediately.
    #[serde(default = "default_major_threshold")]
    pub major_threshold: Decimal,
    /// Fine per strike, in order. A report past the end escalates.
    #[serde(default = "default_fine_schedule")]
    pub fine_schedule: Vec<u32>,
    /// Number of investigation countdown steps before the escort.
    #[serde(default = "default_investigation_steps")]
    pub investigation_steps: u32,
    /// Debt the target owes after an escort.
    #[serde(default = "default_escort_debt")]
    pub escort_debt: u32,
    /// Ash split between reporters after an escort.
    #[serde(default = "default_reporter_reward")]
    pub reporter_reward: u64,
}

fn default_minor_threshold() -> Decimal {
    Decimal::from(10)
}

fn default_major_threshold() -> Decimal {
    Decimal::from(20)
}

fn default_fine_schedule() -> Vec<u32> {
    vec![5, 15]
}

const fn default_investigation_steps() -> u32 {
    5
}

const fn default_escort_debt() -> u32 {
    50
}

const fn default_reporter_reward() -> u64 {
    25
}

impl Default for EnforcementRules {
    fn default() -> Self {
        Self {
            minor_threshold: default_minor_threshold(),
            major_threshold: default_major_threshold(),
            fine_schedule: default_fine_schedule(),
            investigation_steps: default_investigation_steps(),
            escort_debt: default_escort_debt(),
            reporter_reward: default_reporter_reward(),
        }
    }
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Why an escort was ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationCause {
    /// The target's total reached the major threshold.
    MajorHoarding,
    /// The fine schedule is exhausted.
    RepeatOffense,
}

/// Outcome of an accepted report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Levy a fine. The caller charges the wallet, credits the pool and
    /// calls [`record_fine`].
    Fined {
        /// The new strike number.
        strike: u32,
        /// Fine amount.
        amount: u32,
        /// The strike opened a formal investigation.
        investigation: bool,
    },
    /// Start an escort sequence. The record is now in flight.
    Escalated {
        /// What triggered it.
        cause: EscalationCause,
    },
    /// An escort is already running. The report is queued on the record.
    Deferred,
}

/// Judge a report against `record`.
///
/// `total` is the target's attributed weight at the time of the report.
pub fn evaluate(
    record: &mut EnforcementRecord,
    reporter: PlayerId,
    total: Decimal,
    now: DateTime<Utc>,
    rules: &EnforcementRules,
) -> Result<Verdict, EnforcementError> {
    let target = record.player;
    if reporter == target {
        return Err(EnforcementError::SelfReport { player: reporter });
    }

    if record.is_in_flight() {
        if !record.deferred_reports.contains(&reporter) {
            record.deferred_reports.push(reporter);
        }
        info!(target = %target, reporter = %reporter, "Report deferred behind escort");
        return Ok(Verdict::Deferred);
    }

    if total < rules.minor_threshold {
        return Err(EnforcementError::NotHoarding {
            target,
            total,
            threshold: rules.minor_threshold,
        });
    }

    record.reporters.insert(reporter);
    record.last_report_time = Some(now);

    let strike_index = usize::try_from(record.strike_count).unwrap_or(usize::MAX);
    let scheduled_fine = rules.fine_schedule.get(strike_index).copied();

    let cause = if total >= rules.major_threshold {
        Some(EscalationCause::MajorHoarding)
    } else if scheduled_fine.is_none() {
        Some(EscalationCause::RepeatOffense)
    } else {
        None
    };

    if let Some(cause) = cause {
        begin_escort(record, rules);
        info!(
            target = %target,
            total = %total,
            strikes = record.strike_count,
            ?cause,
            "Enforcement escalated"
        );
        return Ok(Verdict::Escalated { cause });
    }

    let amount = scheduled_fine.unwrap_or(0);
    let strike = record.strike_count.saturating_add(1);
    record.strike_count = strike;
    record.stage = EnforcementStage::Minor;
    let investigation = strike >= 2;
    if investigation {
        record.under_investigation = true;
    }
    info!(target = %target, strike, amount, investigation, "Hoarding fine levied");
    Ok(Verdict::Fined {
        strike,
        amount,
        investigation,
    })
}

const fn begin_escort(record: &mut EnforcementRecord, rules: &EnforcementRules) {
    record.stage = EnforcementStage::Escalated;
    record.under_investigation = true;
    record.investigation_remaining = rules.investigation_steps;
    record.escort_phase = Some(if rules.investigation_steps > 0 {
        EscortPhase::Investigation
    } else {
        EscortPhase::Announce
    });
}

/// Append a fine to the history. Unpaid fines become debt.
pub fn record_fine(
    record: &mut EnforcementRecord,
    strike: u32,
    amount: u32,
    paid: bool,
    now: DateTime<Utc>,
) {
    record.fine_history.push(FineEntry {
        strike,
        amount,
        paid,
        levied_at: now,
    });
    if !paid {
        record.outstanding_debt = record.outstanding_debt.saturating_add(amount);
    }
}

// ---------------------------------------------------------------------------
// Escort sequence
// ---------------------------------------------------------------------------

/// One executed escort step and what follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscortStep {
    /// The phase to perform now.
    pub phase: EscortPhase,
    /// Investigation steps left after this one.
    pub remaining: u32,
    /// The phase to schedule next, if any.
    pub next: Option<EscortPhase>,
}

/// Advance the escort sequence for a fired `phase`.
///
/// Steps that do not match the record's current phase are stale (for
/// example after an administrative reset) and are rejected.
pub fn advance(
    record: &mut EnforcementRecord,
    phase: EscortPhase,
) -> Result<EscortStep, EnforcementError> {
    let target = record.player;
    if !record.is_in_flight() || record.escort_phase != Some(phase) {
        warn!(target = %target, ?phase, "Stale escort step ignored");
        return Err(EnforcementError::NotInFlight { target });
    }

    let (remaining, next) = if phase == EscortPhase::Investigation {
        let remaining = record.investigation_remaining.saturating_sub(1);
        record.investigation_remaining = remaining;
        if remaining > 0 {
            (remaining, Some(EscortPhase::Investigation))
        } else {
            (0, Some(EscortPhase::Announce))
        }
    } else {
        (0, phase.next())
    };

    record.escort_phase = next;
    Ok(EscortStep {
        phase,
        remaining,
        next,
    })
}

/// What the execute phase owes the zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Distinct reporters to reward.
    pub reporters: Vec<PlayerId>,
    /// Fine debt folded into the escort debt.
    pub cleared_debt: u32,
}

/// Reset the record at the execute phase.
///
/// Strikes, reporters and fine debt are cleared; the fine history is kept.
/// The record stays in flight until [`finish`].
pub fn settle(record: &mut EnforcementRecord) -> Settlement {
    let reporters = std::mem::take(&mut record.reporters).into_iter().collect();
    let cleared_debt = std::mem::take(&mut record.outstanding_debt);
    record.strike_count = 0;
    record.under_investigation = false;
    record.escorts_completed = record.escorts_completed.saturating_add(1);
    Settlement {
        reporters,
        cleared_debt,
    }
}

/// Release the record after cleanup, returning the reports that arrived
/// during the escort for re-evaluation.
pub fn finish(record: &mut EnforcementRecord) -> Vec<PlayerId> {
    record.stage = EnforcementStage::Clean;
    record.escort_phase = None;
    record.investigation_remaining = 0;
    std::mem::take(&mut record.deferred_reports)
}

/// Each reporter's share of the reward. The remainder is discarded.
pub fn reward_share(reward: u64, reporters: usize) -> u64 {
    u64::try_from(reporters)
        .ok()
        .and_then(|count| reward.checked_div(count))
        .unwrap_or(0)
}

/// Administrative reset: clears strikes, reporters and any running escort.
/// The fine history and outstanding debt are kept.
pub fn admin_reset(record: &mut EnforcementRecord) {
    record.strike_count = 0;
    record.reporters.clear();
    record.stage = EnforcementStage::Clean;
    record.under_investigation = false;
    record.escort_phase = None;
    record.investigation_remaining = 0;
    record.deferred_reports.clear();
    info!(player = %record.player, "Enforcement record reset by admin");
}

/// Public standing for the `score` query.
pub fn standing(
    record: Option<&EnforcementRecord>,
    total: Decimal,
    rules: &EnforcementRules,
) -> Standing {
    match record {
        Some(record) if record.is_in_flight() => Standing::UnderInvestigation,
        Some(record) if record.strike_count > 0 => Standing::Offenses(record.strike_count),
        _ if total >= rules.minor_threshold => Standing::AtRisk,
        _ => Standing::Clean,
    }
}

// ---------------------------------------------------------------------------
// Narration
// ---------------------------------------------------------------------------

/// Who hears a line of escort narration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    /// Every player in the zone.
    World(String),
    /// Players in the target's current room.
    Room(String),
    /// Only the target.
    Target(String),
}

/// Place names used in narration.
#[derive(Debug, Clone, Copy)]
pub struct Places<'a> {
    /// Where offenders are taken.
    pub disposal: &'a str,
    /// Where offenders wake up.
    pub hub: &'a str,
}

/// Broadcast for an investigation countdown step.
pub fn investigation_notice(target: &str, remaining: u32, total: u32, places: Places<'_>) -> String {
    let elapsed = total.saturating_sub(remaining);
    match elapsed {
        0 | 1 => format!(
            "[ZONE 25] Investigation into {target} is underway. {remaining} cycle(s) remain."
        ),
        2 => format!("[ZONE 25] Enforcement drones are scanning the platform for {target}."),
        3 => format!(
            "[ZONE 25] Investigation of {target} nearing completion. {remaining} cycle(s) remain."
        ),
        _ => format!(
            "[ZONE 25] ENFORCEMENT IMMINENT. {target} should report to the {}.",
            places.disposal
        ),
    }
}

/// Narration for a non-investigation escort phase.
pub fn escort_cues(phase: EscortPhase, target: &str, debt: u32, places: Places<'_>) -> Vec<Cue> {
    match phase {
        EscortPhase::Investigation => Vec::new(),
        EscortPhase::Announce => vec![Cue::World(format!(
            "[ZONE 25] A Security Unit has been deployed. Target: {target}."
        ))],
        EscortPhase::Move => vec![
            Cue::Room(String::from(
                "A Security Unit crashes through the doorway, LED display scrolling: \
                 COMPLIANCE IS COMMUNITY.",
            )),
            Cue::Target(String::from("The Security Unit turns its optical array toward you.")),
        ],
        EscortPhase::Seize => vec![
            Cue::Room(format!(
                "The Security Unit extends a pair of padded restraint arms toward {target}."
            )),
            Cue::Target(String::from(
                "'CITIZEN. YOU HAVE BEEN FOUND IN VIOLATION OF PLATFORM WEIGHT ORDINANCE. \
                 COME WITH ME.'",
            )),
        ],
        EscortPhase::Escort => vec![Cue::Room(format!(
            "The Security Unit enters the {} with {target} in tow.",
            places.disposal
        ))],
        EscortPhase::Execute => vec![
            Cue::Room(format!(
                "The Security Unit guides {target} to the incinerator. The ceremony is brief. \
                 A flash of heat, a wisp of smoke, and it is done."
            )),
            Cue::Target(format!(
                "You awaken in the {}, lighter than before. Your possessions are gone. \
                 A debt of {debt} ash hangs over you. Start fresh.",
                places.hub
            )),
        ],
        EscortPhase::Cleanup => vec![Cue::Room(String::from(
            "The Security Unit powers down and is collected by a maintenance drone.",
        ))],
    }
}
