pub mod dataset;
pub mod edf;
pub mod epochs;
pub mod error;
pub mod events;
pub mod filters;
pub mod plot;
pub mod reference;
pub mod types;

pub use edf::{EdfReader, EdfWriter};
pub use epochs::{Baseline, Epochs, Evoked};
pub use error::{ErpError, Result};
pub use events::find_events;
pub use types::{Event, EventId, EventTable, Recording};
