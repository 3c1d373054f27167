//! Identity transform that writes its payload to stdout one byte at a time,
//! with a small delay between bytes to simulate a typewriter. The delay is
//! compiled out under `#[cfg(test)]` so unit and integration tests never
//! block on wall-clock time.

use crate::record::Record;
use crate::stage::Transform;
use std::io::Write;

#[cfg(not(test))]
const BYTE_DELAY: std::time::Duration = std::time::Duration::from_millis(40);

pub struct Typewriter;

impl Transform for Typewriter {
    fn name(&self) -> &str {
        "typewriter"
    }

    fn transform(&mut self, input: &Record) -> Option<Record> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = handle.write_all(b"[typewriter] ");
        let _ = handle.flush();
        for byte in input.as_bytes() {
            let _ = handle.write_all(&[*byte]);
            let _ = handle.flush();
            #[cfg(not(test))]
            std::thread::sleep(BYTE_DELAY);
        }
        let _ = handle.write_all(b"\n");
        Some(input.clone())
    }
}
