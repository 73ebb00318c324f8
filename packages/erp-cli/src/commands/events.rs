use erp_rs::events::find_events;

use crate::cli::EventsArgs;
use crate::exit_codes;
use crate::output;
use crate::params;

pub fn execute(args: EventsArgs) -> i32 {
    let input = match params::resolve_input(&args.file) {
        Ok(path) => path,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let recording = match params::load_recording(&input) {
        Ok(rec) => rec,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::EXECUTION_ERROR;
        }
    };

    let table = match find_events(&recording, &args.stim_channel) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    };

    if args.json {
        if let Err(e) = output::emit_json(&table, output::JsonFormat::Pretty, None) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    } else {
        println!(
            "{} events on '{}' (codes: {:?})",
            table.len(),
            table.stim_channel,
            table.codes()
        );
        for event in &table.events {
            let t = event.sample as f64 / recording.sfreq;
            println!("  sample {:>8}  t {:>8.3} s  code {}", event.sample, t, event.code);
        }
    }

    exit_codes::SUCCESS
}
