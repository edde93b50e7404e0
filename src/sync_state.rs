#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    Loading,
    Synced,
    Failed(String),
}

/// What the footer reports about the connection to the sheet.
#[derive(Clone, Debug)]
pub struct SyncState {
    pub source: String,
    pub status: SyncStatus,
    pub writes: usize,
}

impl SyncState {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            status: SyncStatus::Loading,
            writes: 0,
        }
    }

    pub fn mark_synced(&mut self) {
        self.status = SyncStatus::Synced;
    }

    pub fn mark_written(&mut self, count: usize) {
        self.writes += count;
        self.status = SyncStatus::Synced;
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = SyncStatus::Failed(message.into());
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, SyncStatus::Failed(_))
    }

    pub fn status_text(&self) -> String {
        match &self.status {
            SyncStatus::Loading => "Loading...".to_string(),
            SyncStatus::Synced if self.writes == 0 => "Synced".to_string(),
            SyncStatus::Synced => format!("Synced ({} edits)", self.writes),
            SyncStatus::Failed(message) => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_replaces_status_until_next_write() {
        let mut state = SyncState::new("Sheet1");
        assert_eq!(state.status_text(), "Loading...");

        state.mark_synced();
        assert_eq!(state.status_text(), "Synced");

        state.mark_failed("failed to write Sheet1!A2: network error: timeout");
        assert!(state.is_failed());
        assert!(state.status_text().contains("Sheet1!A2"));

        state.mark_written(2);
        assert!(!state.is_failed());
        assert_eq!(state.status_text(), "Synced (2 edits)");
    }
}
