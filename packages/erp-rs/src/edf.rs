// EDF (European Data Format) reader/writer.
// Specification: https://www.edfplus.info/specs/edf.html

use rayon::prelude::*;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{ErpError, Result};
use crate::types::Recording;

/// Main header record, 256 bytes of fixed-width ASCII fields.
#[derive(Debug, Clone)]
pub struct EdfHeader {
    pub version: String,
    pub patient_id: String,
    pub recording_id: String,
    pub start_date: String,
    pub start_time: String,
    pub header_bytes: usize,
    pub num_data_records: i64,
    pub record_duration: f64,
    pub num_signals: usize,
}

/// Per-signal header, 256 bytes of fixed-width ASCII fields spread
/// field-by-field across all signals.
#[derive(Debug, Clone)]
pub struct EdfSignalHeader {
    pub label: String,
    pub transducer_type: String,
    pub physical_dimension: String,
    pub physical_minimum: f64,
    pub physical_maximum: f64,
    pub digital_minimum: i64,
    pub digital_maximum: i64,
    pub prefiltering: String,
    pub samples_per_record: usize,
}

impl EdfSignalHeader {
    pub fn sample_frequency(&self, record_duration: f64) -> f64 {
        self.samples_per_record as f64 / record_duration
    }

    /// Physical units per digital step.
    pub fn gain(&self) -> f64 {
        (self.physical_maximum - self.physical_minimum)
            / (self.digital_maximum - self.digital_minimum) as f64
    }

    pub fn offset(&self) -> f64 {
        self.physical_maximum - self.gain() * self.digital_maximum as f64
    }
}

fn read_fixed_string<R: Read>(reader: &mut R, size: usize) -> Result<String> {
    let mut buffer = vec![0u8; size];
    reader
        .read_exact(&mut buffer)
        .map_err(|e| ErpError::FormatError(format!("truncated header field: {}", e)))?;
    Ok(String::from_utf8_lossy(&buffer).trim().to_string())
}

fn read_fixed_number<R: Read, T: std::str::FromStr>(
    reader: &mut R,
    size: usize,
    what: &str,
) -> Result<T> {
    let s = read_fixed_string(reader, size)?;
    s.trim()
        .parse::<T>()
        .map_err(|_| ErpError::FormatError(format!("invalid {} field '{}'", what, s)))
}

pub struct EdfReader {
    file: BufReader<File>,
    pub header: EdfHeader,
    pub signal_headers: Vec<EdfSignalHeader>,
    data_start_offset: u64,
}

impl EdfReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ErpError::FileNotFound(path.display().to_string()));
        }
        let mut file = BufReader::new(File::open(path)?);

        let header = Self::read_header(&mut file)?;
        let signal_headers = Self::read_signal_headers(&mut file, header.num_signals)?;
        let data_start_offset = header.header_bytes as u64;

        Ok(Self {
            file,
            header,
            signal_headers,
            data_start_offset,
        })
    }

    fn read_header<R: Read>(reader: &mut R) -> Result<EdfHeader> {
        let version = read_fixed_string(reader, 8)?;
        let patient_id = read_fixed_string(reader, 80)?;
        let recording_id = read_fixed_string(reader, 80)?;
        let start_date = read_fixed_string(reader, 8)?;
        let start_time = read_fixed_string(reader, 8)?;
        let header_bytes = read_fixed_number::<_, usize>(reader, 8, "header bytes")?;
        let _reserved = read_fixed_string(reader, 44)?;
        let num_data_records = read_fixed_number::<_, i64>(reader, 8, "data record count")?;
        let record_duration = read_fixed_number::<_, f64>(reader, 8, "record duration")?;
        let num_signals = read_fixed_number::<_, usize>(reader, 4, "signal count")?;

        if num_data_records < 0 {
            return Err(ErpError::FormatError(
                "unknown data record count (-1) is not supported".to_string(),
            ));
        }
        if record_duration <= 0.0 {
            return Err(ErpError::FormatError(format!(
                "non-positive record duration {}",
                record_duration
            )));
        }

        log::debug!(
            "EDF header: {} records of {}s, {} signals",
            num_data_records,
            record_duration,
            num_signals
        );

        Ok(EdfHeader {
            version,
            patient_id,
            recording_id,
            start_date,
            start_time,
            header_bytes,
            num_data_records,
            record_duration,
            num_signals,
        })
    }

    fn read_signal_headers<R: Read>(reader: &mut R, n: usize) -> Result<Vec<EdfSignalHeader>> {
        // Each field is stored contiguously for all signals.
        let mut labels = Vec::with_capacity(n);
        for _ in 0..n {
            labels.push(read_fixed_string(reader, 16)?);
        }
        let mut transducer_types = Vec::with_capacity(n);
        for _ in 0..n {
            transducer_types.push(read_fixed_string(reader, 80)?);
        }
        let mut physical_dimensions = Vec::with_capacity(n);
        for _ in 0..n {
            physical_dimensions.push(read_fixed_string(reader, 8)?);
        }
        let mut physical_minimums = Vec::with_capacity(n);
        for _ in 0..n {
            physical_minimums.push(read_fixed_number::<_, f64>(reader, 8, "physical minimum")?);
        }
        let mut physical_maximums = Vec::with_capacity(n);
        for _ in 0..n {
            physical_maximums.push(read_fixed_number::<_, f64>(reader, 8, "physical maximum")?);
        }
        let mut digital_minimums = Vec::with_capacity(n);
        for _ in 0..n {
            digital_minimums.push(read_fixed_number::<_, i64>(reader, 8, "digital minimum")?);
        }
        let mut digital_maximums = Vec::with_capacity(n);
        for _ in 0..n {
            digital_maximums.push(read_fixed_number::<_, i64>(reader, 8, "digital maximum")?);
        }
        let mut prefilterings = Vec::with_capacity(n);
        for _ in 0..n {
            prefilterings.push(read_fixed_string(reader, 80)?);
        }
        let mut samples_per_records = Vec::with_capacity(n);
        for _ in 0..n {
            samples_per_records.push(read_fixed_number::<_, usize>(reader, 8, "sample count")?);
        }
        for _ in 0..n {
            let _reserved = read_fixed_string(reader, 32)?;
        }

        let mut signal_headers = Vec::with_capacity(n);
        for i in 0..n {
            if digital_maximums[i] == digital_minimums[i] {
                return Err(ErpError::FormatError(format!(
                    "signal '{}' has a zero digital range",
                    labels[i]
                )));
            }
            signal_headers.push(EdfSignalHeader {
                label: labels[i].clone(),
                transducer_type: transducer_types[i].clone(),
                physical_dimension: physical_dimensions[i].clone(),
                physical_minimum: physical_minimums[i],
                physical_maximum: physical_maximums[i],
                digital_minimum: digital_minimums[i],
                digital_maximum: digital_maximums[i],
                prefiltering: prefilterings[i].clone(),
                samples_per_record: samples_per_records[i],
            });
        }

        Ok(signal_headers)
    }

    pub fn total_duration(&self) -> f64 {
        self.header.num_data_records as f64 * self.header.record_duration
    }

    /// Read one data record as raw digital samples, one Vec per signal.
    fn read_record(&mut self, record_index: usize) -> Result<Vec<Vec<i16>>> {
        if record_index >= self.header.num_data_records as usize {
            return Err(ErpError::FormatError(format!(
                "record index {} out of bounds (max {})",
                record_index,
                self.header.num_data_records - 1
            )));
        }

        // Every sample is a 16-bit little-endian integer.
        let record_size: usize = self
            .signal_headers
            .iter()
            .map(|sh| sh.samples_per_record * 2)
            .sum();
        let record_offset = self.data_start_offset + (record_index * record_size) as u64;
        self.file.seek(SeekFrom::Start(record_offset))?;

        let mut signals = Vec::with_capacity(self.signal_headers.len());
        for signal_header in &self.signal_headers {
            let mut raw = vec![0u8; signal_header.samples_per_record * 2];
            self.file
                .read_exact(&mut raw)
                .map_err(|e| ErpError::FormatError(format!("truncated data record: {}", e)))?;
            let samples: Vec<i16> = raw
                .chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            signals.push(samples);
        }

        Ok(signals)
    }

    /// Load the entire file into a [`Recording`], converting digital
    /// samples to physical units channel by channel.
    ///
    /// All signals must share one sampling rate; mixed-rate EDF files
    /// are rejected.
    pub fn read_recording(&mut self) -> Result<Recording> {
        let n_signals = self.header.num_signals;
        if n_signals == 0 {
            return Err(ErpError::FormatError("file contains no signals".to_string()));
        }

        let samples_per_record = self.signal_headers[0].samples_per_record;
        if self
            .signal_headers
            .iter()
            .any(|sh| sh.samples_per_record != samples_per_record)
        {
            return Err(ErpError::FormatError(
                "signals with differing sampling rates are not supported".to_string(),
            ));
        }

        let n_records = self.header.num_data_records as usize;
        let mut digital: Vec<Vec<i16>> =
            vec![Vec::with_capacity(n_records * samples_per_record); n_signals];
        for record_index in 0..n_records {
            let record = self.read_record(record_index)?;
            for (signal_idx, samples) in record.into_iter().enumerate() {
                digital[signal_idx].extend_from_slice(&samples);
            }
        }

        let data: Vec<Vec<f64>> = digital
            .par_iter()
            .enumerate()
            .map(|(signal_idx, samples)| {
                let sh = &self.signal_headers[signal_idx];
                let gain = sh.gain();
                let offset = sh.offset();
                samples.iter().map(|&d| gain * d as f64 + offset).collect()
            })
            .collect();

        let ch_names: Vec<String> = self
            .signal_headers
            .iter()
            .map(|sh| sh.label.clone())
            .collect();
        let sfreq = self.signal_headers[0].sample_frequency(self.header.record_duration);

        log::info!(
            "Loaded {} channels x {} samples at {} Hz",
            ch_names.len(),
            data.first().map(|ch| ch.len()).unwrap_or(0),
            sfreq
        );

        Recording::new(ch_names, sfreq, data)
    }
}

pub struct EdfWriter {
    file: BufWriter<File>,
    header: EdfHeader,
    signal_headers: Vec<EdfSignalHeader>,
}

impl EdfWriter {
    pub fn create<P: AsRef<Path>>(
        path: P,
        recording_id: &str,
        record_duration: f64,
        signal_headers: Vec<EdfSignalHeader>,
    ) -> Result<Self> {
        let num_signals = signal_headers.len();
        let header = EdfHeader {
            version: "0".to_string(),
            patient_id: "X X X X".to_string(),
            recording_id: recording_id.to_string(),
            start_date: "01.01.00".to_string(),
            start_time: "00.00.00".to_string(),
            header_bytes: 256 + num_signals * 256,
            num_data_records: -1, // patched by finalize()
            record_duration,
            num_signals,
        };

        let file = BufWriter::new(File::create(path)?);
        let mut writer = Self {
            file,
            header,
            signal_headers,
        };
        writer.write_header()?;
        Ok(writer)
    }

    fn write_fixed_string(&mut self, s: &str, size: usize) -> Result<()> {
        let mut buffer = vec![b' '; size];
        let bytes = s.as_bytes();
        let copy_len = bytes.len().min(size);
        buffer[..copy_len].copy_from_slice(&bytes[..copy_len]);
        self.file.write_all(&buffer)?;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        let header = self.header.clone();
        self.write_fixed_string(&header.version, 8)?;
        self.write_fixed_string(&header.patient_id, 80)?;
        self.write_fixed_string(&header.recording_id, 80)?;
        self.write_fixed_string(&header.start_date, 8)?;
        self.write_fixed_string(&header.start_time, 8)?;
        self.write_fixed_string(&header.header_bytes.to_string(), 8)?;
        self.write_fixed_string("", 44)?;
        self.write_fixed_string(&header.num_data_records.to_string(), 8)?;
        self.write_fixed_string(&format!("{}", header.record_duration), 8)?;
        self.write_fixed_string(&header.num_signals.to_string(), 4)?;

        let signal_headers = self.signal_headers.clone();
        for sh in &signal_headers {
            self.write_fixed_string(&sh.label, 16)?;
        }
        for sh in &signal_headers {
            self.write_fixed_string(&sh.transducer_type, 80)?;
        }
        for sh in &signal_headers {
            self.write_fixed_string(&sh.physical_dimension, 8)?;
        }
        for sh in &signal_headers {
            self.write_fixed_string(&sh.physical_minimum.to_string(), 8)?;
        }
        for sh in &signal_headers {
            self.write_fixed_string(&sh.physical_maximum.to_string(), 8)?;
        }
        for sh in &signal_headers {
            self.write_fixed_string(&sh.digital_minimum.to_string(), 8)?;
        }
        for sh in &signal_headers {
            self.write_fixed_string(&sh.digital_maximum.to_string(), 8)?;
        }
        for sh in &signal_headers {
            self.write_fixed_string(&sh.prefiltering, 80)?;
        }
        for sh in &signal_headers {
            self.write_fixed_string(&sh.samples_per_record.to_string(), 8)?;
        }
        for _ in &signal_headers {
            self.write_fixed_string("", 32)?;
        }

        Ok(())
    }

    /// Write one data record of physical samples, one slice per signal.
    pub fn write_physical_record(&mut self, physical_data: &[Vec<f64>]) -> Result<()> {
        if physical_data.len() != self.signal_headers.len() {
            return Err(ErpError::InvalidParameter(format!(
                "expected {} signals, got {}",
                self.signal_headers.len(),
                physical_data.len()
            )));
        }

        for (signal_idx, physical_samples) in physical_data.iter().enumerate() {
            let sh = &self.signal_headers[signal_idx];
            if physical_samples.len() != sh.samples_per_record {
                return Err(ErpError::InvalidParameter(format!(
                    "signal {} expected {} samples per record, got {}",
                    signal_idx,
                    sh.samples_per_record,
                    physical_samples.len()
                )));
            }

            let gain = sh.gain();
            let offset = sh.offset();
            for &physical in physical_samples {
                let digital = ((physical - offset) / gain).round() as i16;
                self.file.write_all(&digital.to_le_bytes())?;
            }
        }

        Ok(())
    }

    /// Patch the record count into the header and flush.
    pub fn finalize(mut self, num_records_written: i64) -> Result<()> {
        self.file.flush()?;
        self.file.seek(SeekFrom::Start(236))?;
        self.write_fixed_string(&num_records_written.to_string(), 8)?;
        self.file.flush()?;
        Ok(())
    }
}
