use std::time::{Duration, Instant};

/// Round-trip timing for one metadata probe.
pub struct ProbeTiming {
    url: String,
    started_at: Instant,
    budget: Duration,
}

impl ProbeTiming {
    pub fn start(url: &str, budget: Duration) -> Self {
        Self {
            url: url.to_string(),
            started_at: Instant::now(),
            budget,
        }
    }

    /// Log the elapsed time; probes that used more than half their timeout
    /// are reported at warn level.
    pub fn finish(self, outcome: &str) -> Duration {
        let elapsed = self.started_at.elapsed();
        let elapsed_ms = elapsed.as_millis();
        if elapsed * 2 > self.budget {
            log::warn!("[perf] probe {} slow: {elapsed_ms}ms ({outcome})", self.url);
        } else {
            log::debug!("[perf] probe {} took {elapsed_ms}ms ({outcome})", self.url);
        }
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reports_elapsed_time() {
        let timing = ProbeTiming::start("https://example.com/a.mp4", Duration::from_secs(10));
        let elapsed = timing.finish("HTTP 200");
        assert!(elapsed < Duration::from_secs(10));
    }
}
