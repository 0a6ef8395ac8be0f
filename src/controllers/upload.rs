use super::{BusyFlag, Clipboard, CopyFeedback, Notice, Pending, ViewState, NOTICE_TTL};
use crate::error::ViewError;
use crate::models::auth::Session;
use crate::models::files::UploadFile;
use crate::services::api::Backend;
use crate::services::session::SessionManager;
use std::sync::Arc;
use tracing::{info, warn};

pub const NO_FILE_SELECTED: &str = "Please select a file";
const SUBMIT_LABEL: &str = "Upload";
const BUSY_LABEL: &str = "Uploading...";

pub fn submit_label(busy: bool) -> &'static str {
    if busy {
        BUSY_LABEL
    } else {
        SUBMIT_LABEL
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub uuid: String,
    pub download_link: String,
}

pub struct UploadController {
    backend: Arc<dyn Backend>,
    session: SessionManager,
    clipboard: Arc<dyn Clipboard>,
    selected: Option<UploadFile>,
    busy: BusyFlag,
    state: ViewState<UploadResult>,
    notice: Option<Notice>,
    copy: CopyFeedback,
}

impl UploadController {
    pub fn new(
        backend: Arc<dyn Backend>,
        session: SessionManager,
        clipboard: Arc<dyn Clipboard>,
    ) -> Self {
        Self {
            backend,
            session,
            clipboard,
            selected: None,
            busy: BusyFlag::new(),
            state: ViewState::Idle,
            notice: None,
            copy: CopyFeedback::default(),
        }
    }

    pub fn open(&self) -> Result<Session, ViewError> {
        self.session.require_auth()
    }

    /// File picker selection.
    pub fn select_file(&mut self, file: UploadFile) {
        self.selected = Some(file);
    }

    /// Drag-and-drop: the first dropped file replaces any prior selection.
    pub fn drop_files(&mut self, files: Vec<UploadFile>) {
        if let Some(file) = files.into_iter().next() {
            self.selected = Some(file);
        }
    }

    pub fn selected_file_name(&self) -> Option<&str> {
        self.selected.as_ref().map(|f| f.name.as_str())
    }

    /// Handle on the busy state that stays readable while `submit` runs.
    pub fn busy(&self) -> BusyFlag {
        self.busy.clone()
    }

    pub fn submit_enabled(&self) -> bool {
        !self.busy.is_busy()
    }

    pub fn submit_label(&self) -> &'static str {
        submit_label(self.busy.is_busy())
    }

    pub fn state(&self) -> &ViewState<UploadResult> {
        &self.state
    }

    pub fn result(&self) -> Option<&UploadResult> {
        self.state.success()
    }

    /// The banner, if it has not been dismissed or timed out.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| n.is_visible())
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub async fn submit(&mut self) -> Result<UploadResult, ViewError> {
        let session = self.session.require_auth()?;

        let file = match self.selected.clone() {
            Some(file) => file,
            None => {
                self.notice = Some(Notice::error(NO_FILE_SELECTED).dismiss_after(NOTICE_TTL));
                return Err(ViewError::Validation(NO_FILE_SELECTED.to_string()));
            }
        };

        let pending = Pending::begin(&mut self.state, Some(&self.busy));
        let outcome = self.backend.upload(&file, &session.token).await;

        match outcome {
            Ok(receipt) => {
                let result = UploadResult {
                    uuid: receipt.uuid,
                    download_link: self.backend.absolute_url(&receipt.download_url),
                };
                info!("Uploaded {} as {}", file.name, result.uuid);
                pending.finish(ViewState::Success(result.clone()));
                self.selected = None;
                self.copy = CopyFeedback::default();
                Ok(result)
            }
            Err(e) => {
                warn!("Upload of {} failed: {}", file.name, e);
                pending.finish(ViewState::Error(e.to_string()));
                self.notice = Some(Notice::error(e.to_string()).dismiss_after(NOTICE_TTL));
                self.session.on_unauthorized(&e);
                Err(e.into())
            }
        }
    }

    pub fn copy_link(&mut self) -> Option<&str> {
        let link = &self.state.success()?.download_link;
        self.clipboard.copy(link);
        self.copy.mark();
        Some(link)
    }

    pub fn copy_label(&self) -> &'static str {
        self.copy.label()
    }

    pub fn logout(&self) {
        self.session.logout();
    }
}
