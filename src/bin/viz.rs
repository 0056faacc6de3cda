use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use ascent_sim::prelude::*;
use ascent_sim::sim::{PhaseCurve, PhaseCurves};

fn main() -> eframe::Result {
    let vehicle = match presets::falcon9_crew_dragon() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    let config = SimConfig { samples_per_phase: DENSE_SAMPLES, ..SimConfig::default() };
    let trajectory = match simulate(&vehicle, &config) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let app = AscentViz { curves: trajectory.curves(), trajectory };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 900.0]),
        ..Default::default()
    };
    eframe::run_native("Ascent Trajectory", options, Box::new(|_| Ok(Box::new(app))))
}

struct AscentViz {
    trajectory: Trajectory,
    curves: PhaseCurves,
}

fn phase_plot(ui: &mut egui::Ui, id: &str, y_label: &str, height: f32, curves: &[PhaseCurve]) {
    ui.label(y_label);
    Plot::new(id)
        .height(height)
        .x_axis_label("Time (s)")
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for curve in curves {
                let points: PlotPoints = curve.points.iter().copied().collect();
                plot_ui.line(Line::new(curve.phase.label(), points));
            }
        });
}

impl eframe::App for AscentViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading(format!("Vehicle: {}", self.trajectory.vehicle));
            let apex = self
                .trajectory
                .max_altitude_sample()
                .map_or(0.0, |s| s.altitude_km(self.trajectory.planet_radius));
            let outcome = match self.trajectory.termination {
                Termination::Completed => "completed".to_string(),
                Termination::SimulatedImpact { time, .. } => format!("impact at {time:.0} s"),
            };
            ui.label(format!(
                "Max altitude: {:.1} km  |  Max velocity: {:.0} m/s  |  Flight: {:.0} s  |  {}",
                apex,
                self.trajectory.max_velocity(),
                self.trajectory.duration(),
                outcome,
            ));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let third = ui.available_height() / 3.0 - 24.0;
            phase_plot(ui, "altitude", "Altitude (km)", third, &self.curves.altitude_km);
            phase_plot(ui, "velocity", "Velocity (m/s)", third, &self.curves.velocity_m_s);
            phase_plot(ui, "mass", "Mass (kg)", third, &self.curves.mass_kg);
        });
    }
}
