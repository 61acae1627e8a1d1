use std::collections::VecDeque;
use std::time::Instant;

/// Rolling mean frame rate over the last `max_length` frame deltas.
#[derive(Debug, Clone)]
pub struct FrameRate {
    deltas: VecDeque<f32>,
    last_frame_time: Option<Instant>,
    max_length: usize,
}

impl FrameRate {
    pub fn new(max_length: usize) -> Self {
        Self {
            deltas: VecDeque::new(),
            last_frame_time: None,
            max_length: max_length.max(1),
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(last) = self.last_frame_time {
            let delta = now.saturating_duration_since(last).as_secs_f32();
            if delta > 0.0 {
                self.deltas.push_back(delta);
                if self.deltas.len() > self.max_length {
                    self.deltas.pop_front();
                }
            }
        }
        self.last_frame_time = Some(now);
    }

    /// Frames per second, or `None` before two frames have been seen.
    pub fn fps(&self) -> Option<f32> {
        if self.deltas.is_empty() {
            return None;
        }
        let mean = self.deltas.iter().sum::<f32>() / self.deltas.len() as f32;
        Some(1.0 / mean)
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_no_rate_before_second_frame() {
        let mut rate = FrameRate::default();
        assert_eq!(rate.fps(), None);
        rate.tick(Instant::now());
        assert_eq!(rate.fps(), None);
    }

    #[test]
    fn test_steady_rate() {
        let mut rate = FrameRate::new(5);
        let base = Instant::now();
        for i in 0..20 {
            rate.tick(base + Duration::from_millis(40 * i));
        }
        let fps = rate.fps().unwrap();
        assert!((fps - 25.0).abs() < 0.1, "{}", fps);
    }

    #[test]
    fn test_window_forgets_old_frames() {
        let mut rate = FrameRate::new(2);
        let base = Instant::now();
        rate.tick(base);
        rate.tick(base + Duration::from_secs(1));
        rate.tick(base + Duration::from_millis(1100));
        rate.tick(base + Duration::from_millis(1200));
        let fps = rate.fps().unwrap();
        assert!((fps - 10.0).abs() < 0.1, "{}", fps);
    }
}
