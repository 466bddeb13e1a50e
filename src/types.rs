/// One deployment-status category as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub label: String,
    pub active: u64,
    /// Total count; not guaranteed to be >= `active`.
    pub count: u64,
}

impl ReportRow {
    pub fn new(label: impl Into<String>, active: u64, count: u64) -> Self {
        ReportRow {
            label: label.into(),
            active,
            count,
        }
    }
}

/// Rows in the order the API returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportResult {
    pub rows: Vec<ReportRow>,
}

impl ReportResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<ReportRow> for ReportResult {
    fn from_iter<I: IntoIterator<Item = ReportRow>>(iter: I) -> Self {
        ReportResult {
            rows: iter.into_iter().collect(),
        }
    }
}
