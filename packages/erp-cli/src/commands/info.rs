use serde::Serialize;

use erp_rs::EdfReader;

use crate::cli::InfoArgs;
use crate::exit_codes;
use crate::output;
use crate::params;

#[derive(Serialize)]
struct InfoOutput {
    file: String,
    version: String,
    recording_id: String,
    start_date: String,
    start_time: String,
    num_signals: usize,
    num_data_records: i64,
    record_duration: f64,
    duration_secs: f64,
    sample_rate: f64,
    channels: Vec<String>,
}

pub fn execute(args: InfoArgs) -> i32 {
    let input = match params::resolve_input(&args.file) {
        Ok(path) => path,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let reader = match EdfReader::open(&input) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    };

    let sample_rate = reader
        .signal_headers
        .first()
        .map(|sh| sh.sample_frequency(reader.header.record_duration))
        .unwrap_or(0.0);

    let info = InfoOutput {
        file: input.display().to_string(),
        version: reader.header.version.clone(),
        recording_id: reader.header.recording_id.clone(),
        start_date: reader.header.start_date.clone(),
        start_time: reader.header.start_time.clone(),
        num_signals: reader.header.num_signals,
        num_data_records: reader.header.num_data_records,
        record_duration: reader.header.record_duration,
        duration_secs: reader.total_duration(),
        sample_rate,
        channels: reader
            .signal_headers
            .iter()
            .map(|sh| sh.label.clone())
            .collect(),
    };

    if args.json {
        if let Err(e) = output::emit_json(&info, output::JsonFormat::Pretty, None) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    } else {
        println!("Recording: {}", info.file);
        println!("  Id: {}", info.recording_id);
        println!("  Start: {} {}", info.start_date, info.start_time);
        println!(
            "  Duration: {:.1} s ({} records of {} s)",
            info.duration_secs, info.num_data_records, info.record_duration
        );
        println!("  Sample rate: {} Hz", info.sample_rate);
        println!("  Channels ({}):", info.num_signals);
        for label in &info.channels {
            println!("    {}", label);
        }
    }

    exit_codes::SUCCESS
}
