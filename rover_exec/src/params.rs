//! # Rover Executable Parameters
//!
//! This module provide parameters for the rover executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoverExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Drive log to replay when none is given on the command line. Relative paths are relative to
    /// the software root.
    pub replay_log_path: String,

    /// Image of the navigable area of the world, used to score the world map at the end of the
    /// session.
    pub ground_truth_path: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RoverExecParamsError {
    #[error("Invalid cycle period {0} s, must be finite and positive")]
    InvalidCyclePeriod(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RoverExecParams {
    /// Check the parameters are consistent.
    pub fn validate(&self) -> Result<(), RoverExecParamsError> {
        if !(self.cycle_period_s.is_finite() && self.cycle_period_s > 0.0) {
            return Err(RoverExecParamsError::InvalidCyclePeriod(self.cycle_period_s));
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_file() {
        let params: RoverExecParams =
            util::params::parse(include_str!("../../params/rover_exec.toml")).unwrap();

        assert_eq!(params.cycle_period_s, 0.04);
        assert!(params.ground_truth_path.is_some());
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_invalid_cycle_period() {
        let params: RoverExecParams =
            util::params::parse(include_str!("../../params/rover_exec.toml")).unwrap();

        for &cycle_period_s in &[0.0, -0.04, f64::NAN, f64::INFINITY] {
            let params = RoverExecParams {
                cycle_period_s,
                ..params.clone()
            };

            assert!(matches!(
                params.validate(),
                Err(RoverExecParamsError::InvalidCyclePeriod(_))
            ));
        }
    }
}
