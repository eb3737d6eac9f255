//! Job source - turns a line-oriented reader into jobs.

use std::io::BufRead;

use super::Job;
use crate::error::Result;

/// Lazily yields one `Job` per non-blank line of the reader.
///
/// Lines are trimmed; blank lines are skipped and do not consume an index.
/// The source is single pass: once iterated it cannot be replayed.
pub struct JobSource<R> {
    reader: R,
    next_index: usize,
    buf: String,
}

impl<R: BufRead> JobSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            next_index: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for JobSource<R> {
    type Item = Result<Job>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    let cmd = self.buf.trim();
                    if cmd.is_empty() {
                        continue;
                    }
                    let job = Job::new(self.next_index, cmd);
                    self.next_index += 1;
                    return Some(Ok(job));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
