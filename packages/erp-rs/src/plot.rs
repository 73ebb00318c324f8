//! Evoked response rendering.
//!
//! Butterfly plot: every channel overlaid on one axis, time in
//! milliseconds, amplitude in µV, with a marker at the event onset.

use plotters::prelude::*;
use std::path::Path;

use crate::epochs::Evoked;
use crate::error::{ErpError, Result};

const PLOT_SIZE: (u32, u32) = (1024, 640);

/// Render `evoked` as a PNG butterfly plot at `path`.
pub fn plot_evoked(evoked: &Evoked, path: &Path) -> Result<()> {
    if evoked.data.is_empty() || evoked.n_times() == 0 {
        return Err(ErpError::PlotError("evoked response is empty".to_string()));
    }

    let n_times = evoked.n_times();
    let t_start_ms = evoked.time_at(0) * 1000.0;
    let t_end_ms = evoked.time_at(n_times - 1) * 1000.0;

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for channel in &evoked.data {
        for &value in channel {
            y_min = y_min.min(value);
            y_max = y_max.max(value);
        }
    }
    let margin = 0.1 * (y_max - y_min).max(1e-12);
    let (y_min, y_max) = (y_min - margin, y_max + margin);

    let root = BitMapBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ErpError::PlotError(e.to_string()))?;

    let caption = format!(
        "Evoked response: {} ({} epochs)",
        evoked.label, evoked.n_epochs
    );
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(t_start_ms..t_end_ms, y_min..y_max)
        .map_err(|e| ErpError::PlotError(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Time (ms)")
        .y_desc("Amplitude (uV)")
        .draw()
        .map_err(|e| ErpError::PlotError(e.to_string()))?;

    // Event onset marker at t = 0.
    if t_start_ms < 0.0 && t_end_ms > 0.0 {
        chart
            .draw_series(LineSeries::new(
                vec![(0.0, y_min), (0.0, y_max)],
                &BLACK.mix(0.4),
            ))
            .map_err(|e| ErpError::PlotError(e.to_string()))?;
    }

    for (ch_idx, channel) in evoked.data.iter().enumerate() {
        let color = Palette99::pick(ch_idx).mix(0.9);
        let series = channel
            .iter()
            .enumerate()
            .map(|(i, &value)| (evoked.time_at(i) * 1000.0, value));
        chart
            .draw_series(LineSeries::new(series, &color))
            .map_err(|e| ErpError::PlotError(e.to_string()))?
            .label(evoked.ch_names[ch_idx].clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK.mix(0.3))
        .background_style(&WHITE.mix(0.8))
        .draw()
        .map_err(|e| ErpError::PlotError(e.to_string()))?;

    root.present()
        .map_err(|e| ErpError::PlotError(e.to_string()))?;

    log::info!("Wrote evoked plot to {}", path.display());
    Ok(())
}
