//! Progress state for one run.

/// Counters and accumulated error text owned by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub total: usize,
    pub dispatched: usize,
    pub completed: usize,
    pub errors: Vec<String>,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record_dispatch(&mut self) {
        self.dispatched += 1;
    }

    pub fn record_completion(&mut self) {
        self.completed += 1;
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    pub fn push_error(&mut self, text: String) {
        self.errors.push(text);
    }

    /// Status line: `<completed>/<total> jobs done`, then the error texts.
    pub fn message(&self) -> String {
        let head = format!("{}/{} jobs done", self.completed, self.total);
        if self.errors.is_empty() {
            head
        } else {
            format!("{}\n\n{}", head, self.errors.join("\n"))
        }
    }
}
