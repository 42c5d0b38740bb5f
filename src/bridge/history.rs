//! Back/forward bookkeeping for surfaces that do not expose their own.

/// Linear session history of one view instance.
///
/// Fresh navigations truncate the forward list. A traversal (back, forward,
/// reload) moves the cursor first; the settle that follows overwrites the
/// entry instead of pushing, so redirects keep the final url.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavHistory {
    entries: Vec<String>,
    cursor: Option<usize>,
    pending_traversal: bool,
}

impl NavHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a settled navigation.
    pub fn commit(&mut self, url: &str) {
        if std::mem::take(&mut self.pending_traversal) {
            if let Some(i) = self.cursor {
                self.entries[i] = url.to_string();
                return;
            }
        }
        if self.current() == Some(url) {
            return;
        }
        let keep = self.cursor.map_or(0, |i| i + 1);
        self.entries.truncate(keep);
        self.entries.push(url.to_string());
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Step back; returns the url to load, or `None` at the start.
    pub fn begin_back(&mut self) -> Option<String> {
        let i = self.cursor.filter(|&i| i > 0)?;
        self.cursor = Some(i - 1);
        self.pending_traversal = true;
        Some(self.entries[i - 1].clone())
    }

    /// Step forward; returns the url to load, or `None` at the end.
    pub fn begin_forward(&mut self) -> Option<String> {
        let i = self.cursor.filter(|&i| i + 1 < self.entries.len())?;
        self.cursor = Some(i + 1);
        self.pending_traversal = true;
        Some(self.entries[i + 1].clone())
    }

    pub fn begin_reload(&mut self) {
        if self.cursor.is_some() {
            self.pending_traversal = true;
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor.is_some_and(|i| i > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor.is_some_and(|i| i + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<&str> {
        self.cursor.map(|i| self.entries[i].as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
