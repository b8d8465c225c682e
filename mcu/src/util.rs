use alloc::string::String;
use core::fmt::Write;

use embassy_time::Instant;
use log::{Metadata, Record};
use rtt_target::rprintln;

/// Mirrors every record to RTT and the UART console, stamped with the time
/// since boot.
pub struct MultiLogger;

impl log::Log for MultiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let millis = Instant::now().as_millis();
        let mut line = String::new();
        let _ = write!(
            &mut line,
            "{:>6}.{:03} [{}] {}: {}",
            millis / 1000,
            millis % 1000,
            record.level(),
            record.target(),
            record.args()
        );

        rprintln!("{}", line);
        // println! goes straight to the UART, log! here would recurse
        esp_println::println!("{}", line);
    }

    fn flush(&self) {}
}

/// A `&'static mut` zeroed buffer, one per call site.
#[macro_export]
macro_rules! static_buf {
    ($ty:ty, $size:expr) => {{
        static mut BUF: [$ty; $size] = [0; $size];
        #[allow(static_mut_refs)]
        #[allow(unsafe_code)]
        unsafe {
            &mut BUF
        }
    }};
}
