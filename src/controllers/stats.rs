use super::{Clipboard, CopyFeedback, Notice, Pending, ViewState, NOTICE_TTL};
use crate::error::ViewError;
use crate::models::files::{FileRecord, FileStats};
use crate::services::api::Backend;
use crate::services::session::SessionManager;
use crate::utils::time::format_timestamp;
use std::sync::Arc;
use tracing::{debug, warn};

pub const NEVER_DOWNLOADED: &str = "Never";

/// One table row, already formatted for display.
#[derive(Debug, Clone)]
pub struct FileRow {
    pub file_name: String,
    pub created_at: String,
    pub download_count: u64,
    pub last_download: String,
    pub download_url: String,
    copy: CopyFeedback,
}

impl FileRow {
    fn from_record(record: &FileRecord, backend: &dyn Backend) -> Self {
        Self {
            file_name: record.file_name.clone(),
            created_at: format_timestamp(&record.created_at),
            download_count: record.download_count,
            last_download: record
                .last_download_at
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_else(|| NEVER_DOWNLOADED.to_string()),
            download_url: backend.absolute_url(&record.download_url),
            copy: CopyFeedback::default(),
        }
    }

    pub fn copy_label(&self) -> &'static str {
        self.copy.label()
    }
}

#[derive(Debug, Clone)]
pub struct StatsView {
    pub total_files: u64,
    pub rows: Vec<FileRow>,
}

impl StatsView {
    fn build(stats: &FileStats, backend: &dyn Backend) -> Self {
        Self {
            total_files: stats.total(),
            rows: stats
                .files
                .iter()
                .map(|record| FileRow::from_record(record, backend))
                .collect(),
        }
    }
}

pub struct StatsController {
    backend: Arc<dyn Backend>,
    session: SessionManager,
    clipboard: Arc<dyn Clipboard>,
    state: ViewState<StatsView>,
    notice: Option<Notice>,
}

impl StatsController {
    pub fn new(
        backend: Arc<dyn Backend>,
        session: SessionManager,
        clipboard: Arc<dyn Clipboard>,
    ) -> Self {
        Self {
            backend,
            session,
            clipboard,
            state: ViewState::Idle,
            notice: None,
        }
    }

    pub async fn load(&mut self) -> Result<(), ViewError> {
        let session = self.session.require_auth()?;
        let pending = Pending::begin(&mut self.state, None);

        match self.backend.file_stats(&session.token).await {
            Ok(stats) => {
                debug!("Loaded {} file record(s)", stats.files.len());
                pending.finish(ViewState::Success(StatsView::build(&stats, self.backend.as_ref())));
                Ok(())
            }
            Err(e) => {
                warn!("Loading file stats failed: {}", e);
                pending.finish(ViewState::Error(e.to_string()));
                self.notice = Some(Notice::error(e.to_string()).dismiss_after(NOTICE_TTL));
                self.session.on_unauthorized(&e);
                Err(e.into())
            }
        }
    }

    pub fn state(&self) -> &ViewState<StatsView> {
        &self.state
    }

    pub fn view(&self) -> Option<&StatsView> {
        self.state.success()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| n.is_visible())
    }

    /// Shown only after a load that returned no records.
    pub fn empty_state_visible(&self) -> bool {
        self.view().map_or(false, |v| v.rows.is_empty())
    }

    pub fn table_visible(&self) -> bool {
        !self.empty_state_visible()
    }

    /// Copies the absolute download URL of row `index`.
    pub fn copy_link(&mut self, index: usize) -> Option<&str> {
        let row = match &mut self.state {
            ViewState::Success(view) => view.rows.get_mut(index)?,
            _ => return None,
        };
        self.clipboard.copy(&row.download_url);
        row.copy.mark();
        Some(&row.download_url)
    }

    pub fn logout(&self) {
        self.session.logout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::{harness, signed_in};
    use crate::controllers::{MemoryClipboard, COPIED_LABEL, COPY_LABEL};
    use crate::error::ApiError;
    use crate::services::api::MockBackend;
    use crate::services::session::Route;
    use std::time::Duration;

    fn record(name: &str, last: Option<&str>) -> FileRecord {
        FileRecord {
            uuid: None,
            file_name: name.to_string(),
            created_at: "2024-03-01T10:15:00".to_string(),
            download_count: 2,
            last_download_at: last.map(str::to_string),
            download_url: format!("/api/files/download/{}", name),
        }
    }

    fn backend_with(files: Vec<FileRecord>) -> MockBackend {
        let mut backend = MockBackend::new();
        let total = files.len() as u64;
        backend.expect_file_stats().returning(move |token| {
            assert_eq!(token, "abc123");
            Ok(FileStats {
                total_files: Some(total),
                files: files.clone(),
            })
        });
        backend
            .expect_absolute_url()
            .returning(|path| format!("http://localhost:8080{}", path));
        backend
    }

    #[tokio::test]
    async fn test_empty_stats_show_empty_state() {
        let h = signed_in();
        let mut controller = StatsController::new(
            Arc::new(backend_with(Vec::new())),
            h.session.clone(),
            Arc::new(MemoryClipboard::new()),
        );

        controller.load().await.unwrap();
        assert_eq!(controller.view().unwrap().total_files, 0);
        assert!(controller.empty_state_visible());
        assert!(!controller.table_visible());
    }

    #[tokio::test]
    async fn test_rows_follow_server_order() {
        let h = signed_in();
        let files = vec![
            record("c.txt", None),
            record("a.txt", Some("2024-03-02T08:05:00")),
            record("b.txt", None),
        ];
        let mut controller = StatsController::new(
            Arc::new(backend_with(files)),
            h.session.clone(),
            Arc::new(MemoryClipboard::new()),
        );

        controller.load().await.unwrap();
        let view = controller.view().unwrap();
        let names: Vec<_> = view.rows.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["c.txt", "a.txt", "b.txt"]);
        assert_eq!(view.total_files, 3);

        let first = &view.rows[0];
        assert_eq!(first.created_at, "01.03.2024 10:15");
        assert_eq!(first.last_download, NEVER_DOWNLOADED);
        assert_eq!(first.download_url, "http://localhost:8080/api/files/download/c.txt");
        assert_eq!(view.rows[1].last_download, "02.03.2024 08:05");

        assert!(controller.table_visible());
        assert!(!controller.empty_state_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_link_per_row() {
        let h = signed_in();
        let clipboard = Arc::new(MemoryClipboard::new());
        let mut controller = StatsController::new(
            Arc::new(backend_with(vec![record("a.txt", None), record("b.txt", None)])),
            h.session.clone(),
            clipboard.clone(),
        );
        controller.load().await.unwrap();

        assert_eq!(
            controller.copy_link(1),
            Some("http://localhost:8080/api/files/download/b.txt")
        );
        assert_eq!(
            clipboard.contents().as_deref(),
            Some("http://localhost:8080/api/files/download/b.txt")
        );
        assert!(controller.copy_link(7).is_none());

        let rows = &controller.view().unwrap().rows;
        assert_eq!(rows[0].copy_label(), COPY_LABEL);
        assert_eq!(rows[1].copy_label(), COPIED_LABEL);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(controller.view().unwrap().rows[1].copy_label(), COPY_LABEL);
    }

    #[tokio::test]
    async fn test_load_without_session_redirects() {
        let h = harness();
        let mut backend = MockBackend::new();
        backend.expect_file_stats().never();
        let mut controller =
            StatsController::new(Arc::new(backend), h.session.clone(), Arc::new(MemoryClipboard::new()));

        assert!(matches!(controller.load().await, Err(ViewError::AuthRequired)));
        assert_eq!(h.navigator.visited(), vec![Route::Landing]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_logs_out() {
        let h = signed_in();
        let mut backend = MockBackend::new();
        backend.expect_file_stats().returning(|_| {
            Err(ApiError::from_response(
                401,
                Some(&serde_json::json!({ "error": "Session expired" })),
            ))
        });
        let mut controller =
            StatsController::new(Arc::new(backend), h.session.clone(), Arc::new(MemoryClipboard::new()));

        assert!(controller.load().await.is_err());
        assert_eq!(controller.notice().unwrap().text, "Session expired");
        assert!(!h.session.is_authenticated());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(h.navigator.last(), Some(Route::Landing));
    }
}
