//! New-project projection
//!
//! Forward estimates for a hypothetical new project using the current
//! session's rates. The volume rate feeding the time estimate is recomputed
//! from the live inputs on every call rather than read back from an earlier
//! report.

use crate::rates::{EstimationInputs, RateEstimator};
use crate::stats::round_dp;

/// Decimal places used for projection metrics
const PROJECTION_DECIMALS: i32 = 3;

/// Projection of session rates onto a new project
pub struct Projector;

impl Projector {
    /// Minutes required to excavate or spray the new project volume at the
    /// current volume rate. `None` until the new-project dimensions and the
    /// volume-rate inputs are all filled in.
    pub fn new_time_volume(inputs: &EstimationInputs) -> Option<f64> {
        let new_area = inputs.new_area + inputs.new_overprofile;
        if new_area <= 0.0 || inputs.new_advance_length <= 0.0 {
            return None;
        }

        let rate = RateEstimator::volume_rate_raw(inputs)?;
        Some(round_dp(
            new_area * inputs.new_advance_length / rate,
            PROJECTION_DECIMALS,
        ))
    }

    /// Project duration after factoring in the observed delay share, in
    /// days. `None` until a duration is supplied, and whenever the delay
    /// share is undefined or total (zero denominator).
    pub fn new_delay(inputs: &EstimationInputs, delay_time: f64, total_time: f64) -> Option<f64> {
        if inputs.project_duration <= 0.0 || total_time == 0.0 {
            return None;
        }

        let delay_share = delay_time / total_time;
        if delay_share == 1.0 {
            return None;
        }

        Some(round_dp(
            inputs.project_duration / (1.0 - delay_share),
            PROJECTION_DECIMALS,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filled_inputs() -> EstimationInputs {
        EstimationInputs {
            theoretical_area: 10.0,
            overprofile_area: 0.0,
            time_per_advance: 5.0,
            distance_per_advance: 2.0,
            new_area: 12.0,
            new_overprofile: 1.0,
            new_advance_length: 3.0,
            project_duration: 100.0,
        }
    }

    #[test]
    fn test_new_time_volume() {
        // Volume rate 4 m^3/min, new volume 13 * 3 = 39 m^3
        assert_eq!(Projector::new_time_volume(&filled_inputs()), Some(9.75));
    }

    #[test]
    fn test_new_time_volume_requires_new_dimensions() {
        let mut inputs = filled_inputs();
        inputs.new_area = 0.0;
        inputs.new_overprofile = 0.0;
        assert_eq!(Projector::new_time_volume(&inputs), None);

        let mut inputs = filled_inputs();
        inputs.new_advance_length = 0.0;
        assert_eq!(Projector::new_time_volume(&inputs), None);
    }

    #[test]
    fn test_new_time_volume_requires_volume_rate() {
        let mut inputs = filled_inputs();
        inputs.time_per_advance = 0.0;
        assert_eq!(Projector::new_time_volume(&inputs), None);
    }

    #[test]
    fn test_new_delay_scales_by_delay_share() {
        // 25% of time lost to delays stretches 100 days to 133.333
        assert_eq!(
            Projector::new_delay(&filled_inputs(), 60.0, 240.0),
            Some(133.333)
        );
    }

    #[test]
    fn test_new_delay_requires_duration() {
        let mut inputs = filled_inputs();
        inputs.project_duration = 0.0;
        assert_eq!(Projector::new_delay(&inputs, 60.0, 240.0), None);
    }

    #[test]
    fn test_new_delay_with_total_delay_is_not_computable() {
        // delay_time == total_time would divide by zero
        assert_eq!(Projector::new_delay(&filled_inputs(), 240.0, 240.0), None);
    }

    #[test]
    fn test_new_delay_with_no_logged_time_is_not_computable() {
        assert_eq!(Projector::new_delay(&filled_inputs(), 0.0, 0.0), None);
    }
}
