use std::time::{Duration, Instant};

use crate::image_pipeline::offload::stage::Stage;

#[derive(Debug, Clone, Copy)]
pub struct StepTiming {
    pub stage: Stage,
    pub duration: Duration,
}

/// Wall-clock duration of every stage a call went through.
#[derive(Debug, Clone, Default)]
pub struct PipelineTimings {
    steps: Vec<StepTiming>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step(&mut self, stage: Stage, duration: Duration) {
        self.steps.push(StepTiming { stage, duration });
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    pub fn get_step(&self, stage: Stage) -> Option<Duration> {
        self.steps
            .iter()
            .filter(|s| s.stage == stage)
            .map(|s| s.duration)
            .reduce(|a, b| a + b)
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    pub fn print_summary(&self) {
        let total = self.total_duration();
        println!("\nOffload Timing Summary:");
        println!("{:-<60}", "");
        for step in &self.steps {
            let percentage = if total.as_secs_f64() > 0.0 {
                (step.duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            } else {
                0.0
            };
            println!(
                "{:<30} {:>12.3}ms ({:>5.1}%)",
                step.stage,
                step.duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        println!("{:-<60}", "");
        println!("{:<30} {:>12.3}ms", "Total", total.as_secs_f64() * 1000.0);
    }
}

pub struct Timer {
    start: Instant,
    stage: Stage,
}

impl Timer {
    pub fn start(stage: Stage) -> Self {
        Self {
            start: Instant::now(),
            stage,
        }
    }

    pub fn stop(self) -> (Stage, Duration) {
        (self.stage, self.start.elapsed())
    }
}
