use serde::Serialize;
use std::path::Path;

use erp_rs::EdfReader;

use crate::cli::ValidateArgs;
use crate::exit_codes;
use crate::output;

#[derive(Serialize)]
struct ValidateOutput {
    file: String,
    exists: bool,
    readable: bool,
    supported: bool,
    well_formed: bool,
    num_signals: Option<usize>,
    size_bytes: Option<u64>,
    error: Option<String>,
}

pub fn execute(args: ValidateArgs) -> i32 {
    let path = Path::new(&args.file);

    let exists = path.exists();
    let readable = path.is_file() && std::fs::File::open(path).is_ok();

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let supported = extension.eq_ignore_ascii_case("edf");

    let size_bytes = if readable {
        std::fs::metadata(path).ok().map(|m| m.len())
    } else {
        None
    };

    // Header parse only runs once the cheaper checks pass.
    let header = if exists && readable && supported {
        Some(EdfReader::open(path).map(|reader| reader.header.num_signals))
    } else {
        None
    };
    let well_formed = matches!(header, Some(Ok(_)));
    let num_signals = match header {
        Some(Ok(n)) => Some(n),
        _ => None,
    };

    let error = if !exists {
        Some(format!("File not found: {}", args.file))
    } else if !readable {
        Some(format!("File is not readable: {}", args.file))
    } else if !supported {
        Some(format!(
            "Unsupported file extension '{}'. Supported: edf",
            extension
        ))
    } else if !well_formed {
        Some(format!("Malformed EDF file: {}", args.file))
    } else {
        None
    };

    let result = ValidateOutput {
        file: args.file.clone(),
        exists,
        readable,
        supported,
        well_formed,
        num_signals,
        size_bytes,
        error: error.clone(),
    };

    if args.json {
        if let Err(e) = output::emit_json(&result, output::JsonFormat::Pretty, None) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    } else if let Some(ref err) = error {
        eprintln!("Error: {}", err);
    } else {
        println!(
            "File '{}' is valid ({} signals, {} bytes)",
            args.file,
            num_signals.unwrap_or(0),
            size_bytes.unwrap_or(0)
        );
    }

    if error.is_some() {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::SUCCESS
    }
}
