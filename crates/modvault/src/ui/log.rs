use std::io::{self, Write};

use indicatif::MultiProgress;
use tracing_subscriber::fmt::MakeWriter;

/// Stderr writer that hides the progress bars while a log line is printed.
#[derive(Clone)]
pub struct LogWriter<W = fn() -> io::Stderr> {
    bars: MultiProgress,
    sink: W,
}

impl LogWriter {
    pub fn stderr(bars: &MultiProgress) -> Self {
        Self {
            bars: bars.clone(),
            sink: io::stderr,
        }
    }
}

impl<W, O> LogWriter<W>
where
    W: Fn() -> O,
    O: Write,
{
    pub fn with_sink(bars: &MultiProgress, sink: W) -> Self {
        Self {
            bars: bars.clone(),
            sink,
        }
    }
}

impl<W, O> Write for LogWriter<W>
where
    W: Fn() -> O,
    O: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let sink = &self.sink;
        self.bars
            .suspend(|| sink().write_all(buf))
            .map(|()| buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let sink = &self.sink;
        self.bars.suspend(|| sink().flush())
    }
}

impl<'a, W, O> MakeWriter<'a> for LogWriter<W>
where
    W: Fn() -> O + Clone + 'a,
    O: Write,
{
    type Writer = LogWriter<W>;

    fn make_writer(&'a self) -> Self::Writer { self.clone() }
}
