//! Viewport actions returned by the step-analysis capability.

use crate::error::{ArgusError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of actions the analyst may request.
///
/// Anything outside this set is an `InvalidAction` error, never a silent
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    ZoomIn,
    ZoomOut,
    MoveLeft,
    MoveRight,
    Finish,
}

impl Action {
    /// Returns true if this action terminates the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::Finish)
    }

    /// The wire spelling of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ZoomIn => "zoom-in",
            Action::ZoomOut => "zoom-out",
            Action::MoveLeft => "move-left",
            Action::MoveRight => "move-right",
            Action::Finish => "finish",
        }
    }
}

impl FromStr for Action {
    type Err = ArgusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "zoom-in" => Ok(Action::ZoomIn),
            "zoom-out" => Ok(Action::ZoomOut),
            "move-left" => Ok(Action::MoveLeft),
            "move-right" => Ok(Action::MoveRight),
            "finish" => Ok(Action::Finish),
            other => Err(ArgusError::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_known_actions() {
        assert_eq!("zoom-in".parse::<Action>().unwrap(), Action::ZoomIn);
        assert_eq!("zoom-out".parse::<Action>().unwrap(), Action::ZoomOut);
        assert_eq!("move-left".parse::<Action>().unwrap(), Action::MoveLeft);
        assert_eq!("move-right".parse::<Action>().unwrap(), Action::MoveRight);
        assert_eq!("finish".parse::<Action>().unwrap(), Action::Finish);
    }

    #[test]
    fn test_from_str_trims_whitespace() {
        assert_eq!(" finish ".parse::<Action>().unwrap(), Action::Finish);
    }

    #[test]
    fn test_from_str_unknown_is_error() {
        let err = "teleport".parse::<Action>().unwrap_err();
        assert!(matches!(err, ArgusError::InvalidAction(ref s) if s == "teleport"));
    }

    #[test]
    fn test_from_str_empty_is_error() {
        assert!("".parse::<Action>().is_err());
    }

    #[test]
    fn test_only_finish_is_terminal() {
        assert!(Action::Finish.is_terminal());
        assert!(!Action::ZoomIn.is_terminal());
        assert!(!Action::ZoomOut.is_terminal());
        assert!(!Action::MoveLeft.is_terminal());
        assert!(!Action::MoveRight.is_terminal());
    }

    #[test]
    fn test_serde_kebab_case() {
        let json = serde_json::to_string(&Action::ZoomIn).unwrap();
        assert_eq!(json, "\"zoom-in\"");

        let action: Action = serde_json::from_str("\"move-right\"").unwrap();
        assert_eq!(action, Action::MoveRight);
    }

    #[test]
    fn test_serde_unknown_variant_fails() {
        let result: std::result::Result<Action, _> = serde_json::from_str("\"warp\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for action in [
            Action::ZoomIn,
            Action::ZoomOut,
            Action::MoveLeft,
            Action::MoveRight,
            Action::Finish,
        ] {
            assert_eq!(action.to_string().parse::<Action>().unwrap(), action);
        }
    }
}
