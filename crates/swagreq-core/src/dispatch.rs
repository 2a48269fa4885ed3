use std::collections::HashSet;
use std::path::PathBuf;

use crate::assemble::request::PreparedRequest;
use crate::error::DispatchError;

/// Receives prepared requests, typically to hand them to an HTTP client or
/// an interactive tool.
pub trait Dispatch {
    fn dispatch(&mut self, request: &PreparedRequest) -> Result<(), DispatchError>;
}

/// Writes each request's raw bytes to `<METHOD>_<path>.txt` in a directory.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    taken: HashSet<String>,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Create the sink, creating `dir` if it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DispatchError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| DispatchError::Write {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            dir,
            taken: HashSet::new(),
            written: Vec::new(),
        })
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn next_name(&mut self, request: &PreparedRequest) -> String {
        let caption = request.caption();
        let path = caption.split_once(' ').map_or(caption, |(_, path)| path);
        let stem = format!("{}_{}", request.method(), file_safe(path));

        let mut name = format!("{stem}.txt");
        let mut n = 2;
        while self.taken.contains(&name) || self.dir.join(&name).exists() {
            name = format!("{stem}_{n}.txt");
            n += 1;
        }
        self.taken.insert(name.clone());
        name
    }
}

impl Dispatch for DirectorySink {
    fn dispatch(&mut self, request: &PreparedRequest) -> Result<(), DispatchError> {
        let name = self.next_name(request);
        let path = self.dir.join(name);
        std::fs::write(&path, request.raw()).map_err(|source| DispatchError::Write {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

/// Send every request to `sink`. Failures are logged and skipped; returns
/// how many were accepted.
pub fn dispatch_all<'a>(
    requests: impl IntoIterator<Item = &'a PreparedRequest>,
    sink: &mut dyn Dispatch,
) -> usize {
    let mut sent = 0;
    for request in requests {
        match sink.dispatch(request) {
            Ok(()) => sent += 1,
            Err(err) => log::warn!("Failed to dispatch {}: {err}", request.caption()),
        }
    }
    sent
}

// `/` becomes `_`; anything else a filesystem might reject does too.
fn file_safe(path: &str) -> String {
    path.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '{' | '}') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
