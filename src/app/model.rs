//! Browser model: the visible sample list, selection and filter state.
//!
//! `App` mirrors the session's database as one label per record; indices
//! here are database indices.

/// The main browser model.
pub struct App {
    labels: Vec<String>,
    lower_labels: Vec<String>,
    pub selected: usize,

    pub filter_mode: bool,
    pub filter_query: String,
    pub metadata_window: bool,

    pub current_dir: Option<String>,
    /// One-line message shown in the status box (scan results, errors).
    pub status: Option<String>,
    /// Index of the record being auditioned, if any.
    pub auditioning: Option<usize>,
}

impl App {
    /// Create a new `App` showing `labels`.
    pub fn new(labels: Vec<String>) -> Self {
        let lower_labels = labels.iter().map(|l| l.to_lowercase()).collect();
        Self {
            labels,
            lower_labels,
            selected: 0,
            filter_mode: false,
            filter_query: String::new(),
            metadata_window: false,
            current_dir: None,
            status: None,
            auditioning: None,
        }
    }

    /// Replace all labels, e.g. after a rescan. Resets the selection.
    pub fn set_labels(&mut self, labels: Vec<String>) {
        self.lower_labels = labels.iter().map(|l| l.to_lowercase()).collect();
        self.labels = labels;
        self.selected = 0;
        self.auditioning = None;
        self.ensure_selected_visible();
    }

    /// Update one label after its metadata arrived.
    pub fn set_label(&mut self, idx: usize, label: String) {
        if let (Some(slot), Some(lower)) = (self.labels.get_mut(idx), self.lower_labels.get_mut(idx)) {
            *lower = label.to_lowercase();
            *slot = label;
        }
    }

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    /// Return the indices to display, in database order, after filtering.
    pub fn display_indices(&self) -> Vec<usize> {
        let query = self.filter_query.trim();
        if query.is_empty() {
            return (0..self.labels.len()).collect();
        }
        let query_lower = query.to_lowercase();
        (0..self.labels.len())
            .filter(|&i| Self::fuzzy_match_positions_lower(&self.lower_labels[i], &query_lower).is_some())
            .collect()
    }

    /// Fuzzy-match `query` against the label at `idx`.
    pub fn match_positions(&self, idx: usize, query: &str) -> Option<Vec<usize>> {
        let lower = self.lower_labels.get(idx)?;
        Self::fuzzy_match_positions_lower(lower, &query.to_lowercase())
    }

    /// Fuzzy/subsequence match: return the character positions in `title`
    /// that match `query`, or `None` if not matched.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        Self::fuzzy_match_positions_lower(&title.to_lowercase(), &query.to_lowercase())
    }

    fn fuzzy_match_positions_lower(title_lower: &str, query_lower: &str) -> Option<Vec<usize>> {
        if query_lower.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title_lower.chars().enumerate();

        for qc in query_lower.chars() {
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc == qc => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    /// Visible indices around the selection, `radius` rows each way.
    pub fn neighbourhood(&self, radius: usize) -> Vec<usize> {
        let display = self.display_indices();
        let Some(pos) = display.iter().position(|&i| i == self.selected) else {
            return Vec::new();
        };
        let start = pos.saturating_sub(radius);
        let end = (pos + radius + 1).min(display.len());
        display[start..end].to_vec()
    }

    pub fn select_first(&mut self) {
        if let Some(&first) = self.display_indices().first() {
            self.selected = first;
        }
    }

    pub fn select_last(&mut self) {
        if let Some(&last) = self.display_indices().last() {
            self.selected = last;
        }
    }

    /// Move selection to the next visible record, wrapping around.
    pub fn next(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            return;
        }
        self.selected = match display.iter().position(|&i| i == self.selected) {
            Some(p) => display[(p + 1) % display.len()],
            None => display[0],
        };
    }

    /// Move selection to the previous visible record, wrapping around.
    pub fn prev(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            return;
        }
        self.selected = match display.iter().position(|&i| i == self.selected) {
            Some(0) | None => display[display.len() - 1],
            Some(p) => display[p - 1],
        };
    }

    /// Enter filter mode.
    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.ensure_selected_visible();
    }
    /// Exit filter mode, keeping the query.
    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }
    /// Clear the active filter and restore selection visibility.
    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }
    /// Append a character to the filter query and refresh view.
    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }
    /// Remove the last character from the filter query and refresh view.
    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Keep `selected` inside the filtered view, else jump to its first entry.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            self.selected = 0;
            return;
        }
        if !display.contains(&self.selected) {
            self.selected = display[0];
        }
    }
}
