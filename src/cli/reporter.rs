// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::pipeline::ShapeReport;
use crate::shapes::{CircleMatch, RingStatus};
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Summary of one detection run
    pub fn report_detection(file: &str, report: &ShapeReport, duration: Duration) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "File:".bold(), file.cyan());
        println!("{}", "━".repeat(80).bright_black());

        Self::print_count("Faces", report.face_count);
        Self::print_count("Planes", report.planes.groups.len());
        Self::print_count("Ungrouped faces", report.planes.remainder.len());
        Self::print_count("Rectangles", report.rectangles.len());
        Self::print_count("Cylinders", report.cylinders.len());

        if !report.cylinders.is_empty() {
            println!("\n{}", "Cylinders:".bold());
            for (index, (cylinder, ring)) in report.cylinders.iter().zip(&report.rings).enumerate() {
                let status = match ring.status {
                    RingStatus::ClosedComplete => "closed".green(),
                    RingStatus::Growing => "open".yellow(),
                    RingStatus::Abandoned => "abandoned".red(),
                };
                println!(
                    "  {} r={:.5} h={:.5} sweep={:.2}° faces={} {}",
                    format!("#{}", index).bright_black(),
                    cylinder.radius,
                    cylinder.height(),
                    cylinder.angle.to_degrees(),
                    cylinder.face_indices.len(),
                    status
                );
            }
        }

        if !report.diagnostics.is_empty() {
            println!("\n{}", "Diagnostics:".bold());
            for diagnostic in &report.diagnostics {
                println!("  {} {}", "⚠️ ".yellow(), diagnostic);
            }
        }

        println!("\n{}", "Performance:".bold());
        println!(
            "  {} {}",
            "Detection:".bright_black(),
            Self::format_duration(duration).cyan()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Summary of a circle search
    pub fn report_circles(file: &str, circles: &[CircleMatch]) {
        println!("\n{} {}", "Circles in".bold(), file.cyan());
        for (index, found) in circles.iter().enumerate() {
            let c = &found.circle;
            println!(
                "  {} center=({:.4}, {:.4}, {:.4}) r={:.5} points={}",
                format!("#{}", index).bright_black(),
                c.center.x,
                c.center.y,
                c.center.z,
                c.radius,
                found.points.len().to_string().cyan()
            );
        }
        if circles.is_empty() {
            println!("  {}", "none".bright_black());
        }
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    fn print_count(name: &str, count: usize) {
        let value = if count == 0 {
            count.to_string().bright_black()
        } else {
            count.to_string().cyan()
        };
        println!("  {} {}", format!("{}:", name).bright_black(), value);
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}
