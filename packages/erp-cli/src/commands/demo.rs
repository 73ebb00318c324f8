use std::path::Path;

use erp_rs::epochs::{Baseline, Epochs};
use erp_rs::events::find_events;
use erp_rs::filters::band_pass;
use erp_rs::plot::plot_evoked;
use erp_rs::types::EventId;

use crate::cli::DemoArgs;
use crate::exit_codes;
use crate::output;
use crate::params;

pub fn execute(args: DemoArgs) -> i32 {
    if let Err(msg) = params::validate_demo_params(
        args.low,
        args.high,
        args.order,
        args.tmin,
        args.tmax,
        &args.label,
    ) {
        eprintln!("Error: {}", msg);
        return exit_codes::INPUT_ERROR;
    }

    println!("Loading sample EEG dataset...");
    let input = match params::resolve_input(&args.file) {
        Ok(path) => path,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let mut recording = match params::load_recording(&input) {
        Ok(rec) => rec,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::EXECUTION_ERROR;
        }
    };
    if !args.quiet {
        eprintln!(
            "Loaded {}: {} channels, {:.1} s at {} Hz",
            input.display(),
            recording.n_channels(),
            recording.duration_secs(),
            recording.sfreq
        );
    }

    if let Err(e) = band_pass(&mut recording, args.low, args.high, args.order) {
        eprintln!("Error: {}", e);
        return exit_codes::EXECUTION_ERROR;
    }
    recording.set_average_reference();
    if !args.quiet {
        eprintln!(
            "Band-passed {}-{} Hz, average reference set (projection)",
            args.low, args.high
        );
    }

    let events = match find_events(&recording, &args.stim_channel) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    };
    if !args.quiet {
        eprintln!(
            "Found {} events on '{}' (codes: {:?})",
            events.len(),
            args.stim_channel,
            events.codes()
        );
    }

    let event_id = EventId::audvis_demo();
    let epochs = match Epochs::from_events(
        &recording,
        &events,
        &event_id,
        args.tmin,
        args.tmax,
        Some(Baseline::default()),
    ) {
        Ok(epochs) => epochs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    };
    if !args.quiet {
        eprintln!(
            "Built {} epochs ({} samples, {} channels)",
            epochs.len(),
            epochs.n_times(),
            epochs.ch_names.len()
        );
    }

    let evoked = match epochs.average(&args.label) {
        Ok(evoked) => evoked,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    };

    if let Err(e) = plot_evoked(&evoked, Path::new(&args.plot)) {
        eprintln!("Error: {}", e);
        return exit_codes::EXECUTION_ERROR;
    }
    if !args.quiet {
        eprintln!(
            "Averaged {} '{}' epochs, plot written to {}",
            evoked.n_epochs, args.label, args.plot
        );
    }

    if let Some(ref path) = args.output {
        let format = output::JsonFormat::from_compact(args.compact);
        if let Err(e) = output::emit_json(&evoked, format, Some(path)) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
        if !args.quiet {
            eprintln!("Evoked record written to {}", path);
        }
    }

    println!("EEG preprocessing demo finished successfully!");
    exit_codes::SUCCESS
}
