use std::fs::File;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Routes diagnostics to a log file when one is configured, else to stderr.
///
/// Stdout belongs to prompts and spinners, so diagnostics never go there.
#[derive(Clone, Default)]
pub(crate) struct LogMakeWriter {
    pub file: Option<Arc<Mutex<File>>>,
}

impl LogMakeWriter {
    pub fn to_file(file: File) -> Self {
        Self {
            file: Some(Arc::new(Mutex::new(file))),
        }
    }
}

impl<'a> MakeWriter<'a> for LogMakeWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            file: self.file.clone(),
        }
    }
}

pub(crate) struct LogWriter {
    file: Option<Arc<Mutex<File>>>,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &self.file {
            Some(file) => {
                let mut file = file
                    .lock()
                    .map_err(|_| std::io::Error::other("log file lock poisoned"))?;
                file.write_all(buf)?;
            }
            None => std::io::stderr().write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &self.file {
            Some(file) => file
                .lock()
                .map_err(|_| std::io::Error::other("log file lock poisoned"))?
                .flush(),
            None => std::io::stderr().flush(),
        }
    }
}
