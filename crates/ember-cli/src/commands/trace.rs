//! Trace command - records the GPU commands a demo issues

use super::offline_pacing;
use anyhow::{Context, Result};
use clap::ValueEnum;
use ember_player::PlayOptions;
use ember_render::shaders::U_COLOR;
use ember_render::{demo_view, GpuCommand, RecordingBackend, UniformValue};
use ember_runtime::FrameDriver;
use std::fmt::Write as _;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceFormat {
    /// Aggregate counts
    Summary,
    /// Every recorded command
    Json,
}

pub struct TraceArgs {
    pub options: PlayOptions,
    pub frames: u32,
    pub format: TraceFormat,
    pub output: Option<String>,
}

/// Aggregate view of a command log
#[derive(Debug, Default, PartialEq)]
pub struct TraceSummary {
    pub frames: usize,
    pub draws: usize,
    pub points: u64,
    pub triangles: u64,
    pub cycle_boundaries: usize,
    pub blank_frames: usize,
    pub last_time: Option<f32>,
}

impl TraceSummary {
    pub fn from_commands(commands: &[GpuCommand]) -> Self {
        let mut summary = TraceSummary::default();
        let mut frame_drew = false;
        for command in commands {
            match command {
                GpuCommand::DrawPoints { count, .. } => {
                    summary.draws += 1;
                    summary.points += *count as u64;
                    frame_drew = true;
                }
                GpuCommand::DrawTriangles { count, .. } => {
                    summary.draws += 1;
                    summary.triangles += (*count / 3) as u64;
                    frame_drew = true;
                }
                GpuCommand::Uniform { name, value } => {
                    if name == U_COLOR {
                        summary.cycle_boundaries += 1;
                    } else if let UniformValue::Float(time) = value {
                        summary.last_time = Some(*time);
                    }
                }
                GpuCommand::Flush => {
                    summary.frames += 1;
                    if !frame_drew {
                        summary.blank_frames += 1;
                    }
                    frame_drew = false;
                }
                _ => {}
            }
        }
        summary
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Frames:           {}", self.frames);
        let _ = writeln!(out, "Draw calls:       {}", self.draws);
        let _ = writeln!(out, "Points drawn:     {}", self.points);
        if self.triangles > 0 {
            let _ = writeln!(out, "Triangles drawn:  {}", self.triangles);
        }
        let _ = writeln!(out, "Cycle boundaries: {}", self.cycle_boundaries);
        let _ = writeln!(out, "Blank frames:     {}", self.blank_frames);
        if let Some(time) = self.last_time {
            let _ = writeln!(out, "Final cycle time: {time:.4}");
        }
        out
    }
}

pub fn run(args: TraceArgs) -> Result<()> {
    let config = args.options.resolve()?;

    let mut gpu = RecordingBackend::new();
    let mut view = demo_view::<RecordingBackend>(&config);
    let mut driver = FrameDriver::new(offline_pacing(&config));

    // A failed start is still worth tracing: it shows the blank frames
    if let Err(e) = driver.start(view.as_mut(), &mut gpu) {
        warn!(error = %e, view = view.name(), "View did not initialize");
    }
    driver.resize(view.as_mut(), &mut gpu, config.window.width, config.window.height);
    for _ in 0..args.frames {
        driver.tick(view.as_mut(), &mut gpu);
    }
    driver.shutdown(view.as_mut(), &mut gpu);

    let text = match args.format {
        TraceFormat::Json => {
            serde_json::to_string_pretty(gpu.commands()).context("Failed to serialize trace")?
        }
        TraceFormat::Summary => TraceSummary::from_commands(gpu.commands()).render_text(),
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("Failed to write {path}"))?;
            println!("Wrote trace of {} frames to {}", args.frames, path);
        }
        None => println!("{text}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::{Demo, EmberConfig, FramePacing};

    fn record_demo(gpu: &mut RecordingBackend, demo: Demo, frames: u32) {
        let config = EmberConfig {
            demo,
            ..EmberConfig::default()
        };
        let mut view = demo_view::<RecordingBackend>(&config);
        let mut driver = FrameDriver::new(FramePacing::default());
        let _ = driver.start(view.as_mut(), gpu);
        for _ in 0..frames {
            driver.tick(view.as_mut(), gpu);
        }
    }

    fn record(gpu: &mut RecordingBackend, frames: u32) {
        record_demo(gpu, Demo::Particles, frames);
    }

    #[test]
    fn summary_counts_frames_and_cycles() {
        let mut gpu = RecordingBackend::new();
        record(&mut gpu, 60);
        let summary = TraceSummary::from_commands(gpu.commands());
        assert_eq!(summary.frames, 60);
        assert_eq!(summary.draws, 60);
        assert_eq!(summary.points, 60_000);
        assert_eq!(summary.triangles, 0);
        assert_eq!(summary.cycle_boundaries, 2);
        assert_eq!(summary.blank_frames, 0);
        assert!(summary.last_time.is_some());
    }

    #[test]
    fn failed_link_traces_blank_frames() {
        let mut gpu = RecordingBackend::failing_link("offline");
        record(&mut gpu, 5);
        let summary = TraceSummary::from_commands(gpu.commands());
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.blank_frames, 5);
        assert_eq!(summary.draws, 0);
        assert_eq!(summary.last_time, None);
    }

    #[test]
    fn triangle_demo_draws_one_triangle_per_frame() {
        let mut gpu = RecordingBackend::new();
        record_demo(&mut gpu, Demo::Triangle, 4);
        let summary = TraceSummary::from_commands(gpu.commands());
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.draws, 4);
        assert_eq!(summary.triangles, 4);
        assert_eq!(summary.points, 0);
        assert_eq!(summary.cycle_boundaries, 0);
        assert_eq!(summary.last_time, None);
    }
}
