//! Console output for the fmt layer.
//!
//! The fmt layer writes each event in several `write` calls. The browser console has
//! no notion of partial lines, so [`ConsoleWriter`] buffers until it is flushed or
//! dropped (once per event) and emits the whole line at once: through
//! `console.log` on wasm32, to stderr elsewhere.

use std::io::{self, Write};
use tracing_subscriber::fmt::MakeWriter;

/// Hands the fmt layer a fresh [`ConsoleWriter`] per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::default()
    }
}

/// Line-buffered console sink.
#[derive(Debug, Default)]
pub struct ConsoleWriter {
    buffer: Vec<u8>,
}

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        {
            let text = String::from_utf8_lossy(&self.buffer);
            emit(text.trim_end_matches('\n'));
        }
        self.buffer.clear();
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(line: &str) {
    web_sys::console::log_1(&wasm_bindgen::JsValue::from_str(line));
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(line: &str) {
    let _ = writeln!(io::stderr().lock(), "{line}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_accumulate_until_flush() {
        let mut writer = ConsoleWriter::default();
        write!(writer, "DEBUG ").unwrap();
        writeln!(writer, "playlist rebuilt cards=3").unwrap();
        assert_eq!(writer.buffer, b"DEBUG playlist rebuilt cards=3\n");

        writer.flush().unwrap();
        assert!(writer.buffer.is_empty());
        writer.flush().unwrap();
    }
}
