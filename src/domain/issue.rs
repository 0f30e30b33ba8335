use serde_json::Value;

#[derive(Debug, Clone)]
pub struct IssueReport {
    pub description: String,
    pub location: Option<Value>,
}

impl IssueReport {
    /// Short prefix of the description for log lines.
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.description.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.description[..idx],
            None => &self.description,
        }
    }
}
