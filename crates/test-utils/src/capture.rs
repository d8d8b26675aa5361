use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use guardian::report::Reporter;

/// Shared in-memory sink. Clones write to the same buffer, so a test keeps
/// one handle and gives another to a [`Reporter`].
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter whose console output lands in this buffer.
    pub fn reporter(&self) -> Reporter {
        Reporter::new(Box::new(self.clone()))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
