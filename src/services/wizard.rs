//! Server-side position of a property in the data entry sequence
//! Property → Setbacks → PermittedUses → Adu → Jadu → Parking.
//!
//! Steps may be skipped and a multi-row step may be submitted again, but a
//! property never moves backwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Property,
    Setbacks,
    PermittedUses,
    Adu,
    Jadu,
    Parking,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("unknown wizard step '{0}'")]
    UnknownStep(String),

    #[error("{requested} cannot be submitted after {current} has been recorded")]
    OutOfOrder {
        current: WizardStep,
        requested: WizardStep,
    },
}

impl WizardStep {
    pub const ORDER: [WizardStep; 6] = [
        WizardStep::Property,
        WizardStep::Setbacks,
        WizardStep::PermittedUses,
        WizardStep::Adu,
        WizardStep::Jadu,
        WizardStep::Parking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::Property => "property",
            WizardStep::Setbacks => "setbacks",
            WizardStep::PermittedUses => "permitted_uses",
            WizardStep::Adu => "adu",
            WizardStep::Jadu => "jadu",
            WizardStep::Parking => "parking",
        }
    }

    pub fn next(self) -> Option<WizardStep> {
        let index = Self::ORDER.iter().position(|step| *step == self)?;
        Self::ORDER.get(index + 1).copied()
    }

    pub fn is_final(self) -> bool {
        self == WizardStep::Parking
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardStep {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .iter()
            .copied()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| WizardError::UnknownStep(s.to_string()))
    }
}

impl TryFrom<String> for WizardStep {
    type Error = WizardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Returns the step a property moves to when `requested` is submitted.
pub fn advance(current: WizardStep, requested: WizardStep) -> Result<WizardStep, WizardError> {
    if requested < current || requested == WizardStep::Property {
        return Err(WizardError::OutOfOrder { current, requested });
    }
    Ok(requested)
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardProgress {
    pub property_id: i64,
    pub current_step: WizardStep,
    pub next_step: Option<WizardStep>,
    pub complete: bool,
}

impl WizardProgress {
    pub fn new(property_id: i64, current_step: WizardStep) -> Self {
        Self {
            property_id,
            current_step,
            next_step: current_step.next(),
            complete: current_step.is_final(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_advance_forward_and_may_skip() {
        assert_eq!(
            advance(WizardStep::Property, WizardStep::Setbacks),
            Ok(WizardStep::Setbacks)
        );
        assert_eq!(
            advance(WizardStep::Property, WizardStep::PermittedUses),
            Ok(WizardStep::PermittedUses)
        );
    }

    #[test]
    fn same_step_can_be_appended() {
        assert_eq!(advance(WizardStep::Adu, WizardStep::Adu), Ok(WizardStep::Adu));
    }

    #[test]
    fn earlier_steps_are_rejected() {
        let err = advance(WizardStep::Jadu, WizardStep::Setbacks).unwrap_err();
        assert_eq!(
            err,
            WizardError::OutOfOrder {
                current: WizardStep::Jadu,
                requested: WizardStep::Setbacks
            }
        );
        assert_eq!(
            err.to_string(),
            "setbacks cannot be submitted after jadu has been recorded"
        );
    }

    #[test]
    fn property_step_is_never_a_dependent_submission() {
        assert!(advance(WizardStep::Property, WizardStep::Property).is_err());
    }

    #[test]
    fn round_trips_stored_names() {
        for step in WizardStep::ORDER {
            assert_eq!(step.as_str().parse::<WizardStep>().unwrap(), step);
        }
        assert!("garage".parse::<WizardStep>().is_err());
    }

    #[test]
    fn progress_reports_completion_at_parking() {
        let progress = WizardProgress::new(7, WizardStep::Parking);
        assert!(progress.complete);
        assert_eq!(progress.next_step, None);

        let progress = WizardProgress::new(7, WizardStep::Setbacks);
        assert!(!progress.complete);
        assert_eq!(progress.next_step, Some(WizardStep::PermittedUses));
    }
}
