//! Header frame number cross-check

use tracing::warn;

use crate::DiagnosticEvent;

/// Compares consecutive header frame numbers.
///
/// Repeats and +1 steps are normal. Anything else is reported and the new
/// value becomes the reference; nothing is corrected.
#[derive(Debug, Clone, Default)]
pub struct FrameNumberTracker {
    last: Option<u32>,
}

impl FrameNumberTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent frame number observed.
    pub fn last(&self) -> Option<u32> {
        self.last
    }

    pub fn observe(&mut self, buffer_index: u64, frame_num: u32) -> Option<DiagnosticEvent> {
        let previous = self.last.replace(frame_num)?;
        if frame_num < previous {
            warn!(
                "Frame number regressed from {} to {} at buffer {}",
                previous, frame_num, buffer_index
            );
            Some(DiagnosticEvent::FrameNumberRegression {
                buffer_index,
                previous,
                current: frame_num,
            })
        } else if frame_num - previous > 1 {
            warn!(
                "Frame number jumped from {} to {} at buffer {}",
                previous, frame_num, buffer_index
            );
            Some(DiagnosticEvent::FrameNumberGap { buffer_index, previous, current: frame_num })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe_all(nums: &[u32]) -> Vec<DiagnosticEvent> {
        let mut tracker = FrameNumberTracker::new();
        nums.iter()
            .enumerate()
            .filter_map(|(i, &n)| tracker.observe(i as u64, n))
            .collect()
    }

    #[test]
    fn single_gap_is_reported_once() {
        assert_eq!(
            observe_all(&[5, 6, 9]),
            vec![DiagnosticEvent::FrameNumberGap { buffer_index: 2, previous: 6, current: 9 }]
        );
    }

    #[test]
    fn repeats_and_steps_are_quiet() {
        assert!(observe_all(&[3, 3, 3, 4, 4, 5]).is_empty());
    }

    #[test]
    fn regression_resets_reference() {
        assert_eq!(
            observe_all(&[10, 11, 2, 3]),
            vec![DiagnosticEvent::FrameNumberRegression {
                buffer_index: 2,
                previous: 11,
                current: 2
            }]
        );
    }

    #[test]
    fn wraparound_is_a_regression() {
        let events = observe_all(&[u32::MAX, 0]);
        assert!(matches!(events[0], DiagnosticEvent::FrameNumberRegression { .. }));
    }
}
