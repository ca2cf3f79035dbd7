use std::{
  fmt::Display,
  io::Write,
  sync::{Arc, Mutex, PoisonError},
};

type Sink = Arc<Mutex<dyn Write + Send>>;

/// Line-oriented output shared by every build. Each line is written under the
/// sink's lock, so concurrent builds interleave whole lines only.
#[derive(Clone)]
pub struct Reporter {
  out: Sink,
  err: Sink,
}

impl Reporter {
  pub fn new(out: impl Write + Send + 'static, err: impl Write + Send + 'static) -> Self {
    Self { out: Arc::new(Mutex::new(out)), err: Arc::new(Mutex::new(err)) }
  }

  pub fn stdio() -> Self {
    Self::new(std::io::stdout(), std::io::stderr())
  }

  pub fn info(&self, line: impl Display) {
    Self::write_line(&self.out, line);
  }

  pub fn error(&self, line: impl Display) {
    Self::write_line(&self.err, line);
  }

  fn write_line(sink: &Sink, line: impl Display) {
    let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(err) = writeln!(sink, "{line}").and_then(|()| sink.flush()) {
      tracing::warn!("failed to write build output: {err}");
    }
  }
}

impl std::fmt::Debug for Reporter {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Reporter").finish_non_exhaustive()
  }
}

/// In-memory sink for asserting on what a [`Reporter`] printed.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct MemorySink(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl MemorySink {
  pub fn lines(&self) -> Vec<String> {
    let buffer = self.0.lock().unwrap();
    String::from_utf8_lossy(&buffer).lines().map(ToString::to_string).collect()
  }
}

#[cfg(test)]
impl Write for MemorySink {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    self.0.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> std::io::Result<()> {
    Ok(())
  }
}

#[cfg(test)]
pub(crate) fn memory_reporter() -> (Reporter, MemorySink, MemorySink) {
  let out = MemorySink::default();
  let err = MemorySink::default();
  (Reporter::new(out.clone(), err.clone()), out, err)
}

#[test]
fn test_reporter_separates_streams() {
  let (reporter, out, err) = memory_reporter();
  reporter.info("[watch] build finished for ./src/client.ts");
  reporter.error(format_args!("> {}:{}:{}: error: {}", "a.ts", 1, 2, "bad"));

  assert_eq!(out.lines(), vec!["[watch] build finished for ./src/client.ts"]);
  assert_eq!(err.lines(), vec!["> a.ts:1:2: error: bad"]);
}
