//! Diagnostic reports on the serial console.

use crate::alert::{
    Report,
    ReportSink,
};

/// Prints reports as plain text. `defmt` cannot render fixed-precision
/// floats, so this goes through `esp_println` directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct Console;

impl ReportSink for Console {
    fn report(&mut self, report: &Report) {
        esp_println::println!("{}", report);
    }
}
