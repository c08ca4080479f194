//! Grading mode: binds editable grading widgets to the gradable cells of a
//! notebook and routes widget edits into the grade ledger.
//!
//! Rendering is left to the host through the [`WidgetHost`] trait. The
//! controller only decides which cells get a widget, keeps the ledger in
//! sync with edits, and guards saves.

use std::fmt;

use thiserror::Error;

use crate::models::{
    GradeLedger, GradeRecord, LedgerError, Notebook, SubmissionKey, ToolData,
};
use crate::sync::{LedgerSync, SyncError};

/// Host-assigned handle of an attached widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a widget is bound to, handed to the host when it is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct CellBinding {
    pub notebook: String,
    pub cell_index: usize,
    pub tool: ToolData,
    pub record: GradeRecord,
}

impl CellBinding {
    pub fn cell_id(&self) -> &str {
        &self.record.cell_id
    }

    /// Whether the widget shows score and extra credit fields. Solution
    /// cells have no point budget and only take comments.
    pub fn has_score_fields(&self) -> bool {
        self.tool.kind.has_points()
    }
}

/// The notebook view that displays grading widgets.
pub trait WidgetHost {
    /// Attach a grading widget to the cell at `binding.cell_index`.
    fn attach(&mut self, binding: &CellBinding) -> WidgetId;

    fn detach(&mut self, widget: WidgetId);

    /// Enable or disable input on a widget (disabled while saving).
    fn set_enabled(&mut self, widget: WidgetId, enabled: bool);
}

/// An edit made through a grading widget.
#[derive(Debug, Clone, PartialEq)]
pub enum GradeEdit {
    ManualScore(f64),
    ExtraCredit(f64),
    Comment(String),
    NeedsManualGrade(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Viewing,
    Grading,
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("grading view has been closed")]
    Disposed,

    #[error("a save is already in progress")]
    SaveInFlight,

    #[error("grading mode is not active")]
    NotGrading,

    #[error("no grading widget with id {0}")]
    UnknownWidget(WidgetId),

    #[error("widget {0} has no score fields")]
    NoScoreField(WidgetId),
}

/// A save detached from the controller.
///
/// Owns a snapshot of the ledger, so it can finish after the controller
/// has been disposed. Feed the result to
/// [`GradingModeController::complete_save`].
#[derive(Debug)]
pub struct SaveRequest {
    sync: LedgerSync,
    key: SubmissionKey,
    ledger: GradeLedger,
}

impl SaveRequest {
    pub async fn run(self) -> Result<(), SyncError> {
        self.sync.save(&self.key, &self.ledger).await
    }
}

/// Toggles a notebook between viewing and grading.
pub struct GradingModeController<H: WidgetHost> {
    sync: LedgerSync,
    key: SubmissionKey,
    notebook_name: String,
    notebook: Notebook,
    host: H,
    ledger: Option<GradeLedger>,
    bindings: Vec<(WidgetId, CellBinding)>,
    mode: Mode,
    saving: bool,
    disposed: bool,
}

impl<H: WidgetHost> GradingModeController<H> {
    pub fn new(
        sync: LedgerSync,
        key: SubmissionKey,
        notebook_name: impl Into<String>,
        notebook: Notebook,
        host: H,
    ) -> Self {
        Self {
            sync,
            key,
            notebook_name: notebook_name.into(),
            notebook,
            host,
            ledger: None,
            bindings: Vec::new(),
            mode: Mode::Viewing,
            saving: false,
            disposed: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn ledger(&self) -> Option<&GradeLedger> {
        self.ledger.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn bindings(&self) -> impl Iterator<Item = (WidgetId, &CellBinding)> {
        self.bindings.iter().map(|(id, binding)| (*id, binding))
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Switch grading mode on or off. Asking for the current mode is a no-op.
    ///
    /// Entering grading mode loads the ledger first if needed. If that fails
    /// the controller stays in viewing mode.
    pub async fn set_grading_mode(&mut self, enabled: bool) -> Result<(), ControllerError> {
        if self.disposed {
            return Err(ControllerError::Disposed);
        }

        let target = if enabled { Mode::Grading } else { Mode::Viewing };
        if target == self.mode {
            return Ok(());
        }

        match target {
            Mode::Grading => self.enter_grading().await,
            Mode::Viewing => {
                self.unbind_all();
                self.mode = Mode::Viewing;
                tracing::debug!("Left grading mode for {}", self.notebook_name);
                Ok(())
            }
        }
    }

    async fn enter_grading(&mut self) -> Result<(), ControllerError> {
        let mut ledger = match self.ledger.take() {
            Some(ledger) => ledger,
            None => self.sync.load(&self.key).await?,
        };

        let mut bindings = Vec::new();
        for (cell_index, cell) in self.notebook.cells.iter().enumerate() {
            let tool = cell.tool_data();
            let Some(cell_id) = tool.id.clone() else {
                continue;
            };
            if !tool.kind.is_gradable() {
                continue;
            }

            if ledger.ensure_entry(&self.notebook_name, &cell_id, &tool) {
                tracing::debug!("Created grading entry for cell {}", cell_id);
            }
            let record = match ledger.record(&self.notebook_name, &cell_id) {
                Ok(record) => record,
                Err(e) => {
                    self.ledger = Some(ledger);
                    return Err(e.into());
                }
            };
            bindings.push(CellBinding {
                notebook: self.notebook_name.clone(),
                cell_index,
                tool,
                record,
            });
        }

        for binding in bindings {
            let widget = self.host.attach(&binding);
            if self.saving {
                self.host.set_enabled(widget, false);
            }
            self.bindings.push((widget, binding));
        }

        self.ledger = Some(ledger);
        self.mode = Mode::Grading;
        tracing::info!(
            "Entered grading mode for {} ({} widgets)",
            self.notebook_name,
            self.bindings.len()
        );
        Ok(())
    }

    fn unbind_all(&mut self) {
        for (widget, _) in self.bindings.drain(..) {
            self.host.detach(widget);
        }
    }

    fn set_widgets_enabled(&mut self, enabled: bool) {
        for (widget, _) in &self.bindings {
            self.host.set_enabled(*widget, enabled);
        }
    }

    /// Apply a widget edit to the ledger and return the cell's new state.
    ///
    /// Scores are checked against the cell's point budget. Score and extra
    /// credit edits are refused for bindings without score fields.
    pub fn edit(&mut self, widget: WidgetId, edit: GradeEdit) -> Result<GradeRecord, ControllerError> {
        if self.disposed {
            return Err(ControllerError::Disposed);
        }
        if self.mode != Mode::Grading {
            return Err(ControllerError::NotGrading);
        }
        if self.saving {
            return Err(ControllerError::SaveInFlight);
        }

        let binding = self
            .bindings
            .iter_mut()
            .find(|(id, _)| *id == widget)
            .map(|(_, binding)| binding)
            .ok_or(ControllerError::UnknownWidget(widget))?;
        if matches!(edit, GradeEdit::ManualScore(_) | GradeEdit::ExtraCredit(_))
            && !binding.has_score_fields()
        {
            return Err(ControllerError::NoScoreField(widget));
        }
        let ledger = self.ledger.as_mut().ok_or(ControllerError::NotGrading)?;

        let notebook = binding.notebook.as_str();
        let cell_id = binding.record.cell_id.as_str();
        match edit {
            GradeEdit::ManualScore(score) => {
                let points = binding.tool.points.unwrap_or(0.0);
                ledger.set_manual_score_checked(notebook, cell_id, score, points)?
            }
            GradeEdit::ExtraCredit(extra_credit) => {
                ledger.set_extra_credit_checked(notebook, cell_id, extra_credit)?
            }
            GradeEdit::Comment(comment) => ledger.set_comment(notebook, cell_id, comment)?,
            GradeEdit::NeedsManualGrade(flag) => {
                ledger.set_needs_manual_grade(notebook, cell_id, flag)?
            }
        }

        let record = ledger.record(notebook, cell_id)?;
        binding.record = record.clone();
        Ok(record)
    }

    /// Start a save: disables the widgets and snapshots the ledger.
    pub fn begin_save(&mut self) -> Result<SaveRequest, ControllerError> {
        if self.disposed {
            return Err(ControllerError::Disposed);
        }
        if self.saving {
            return Err(ControllerError::SaveInFlight);
        }
        let ledger = self.ledger.clone().ok_or(ControllerError::NotGrading)?;

        self.saving = true;
        self.set_widgets_enabled(false);
        Ok(SaveRequest {
            sync: self.sync.clone(),
            key: self.key,
            ledger,
        })
    }

    /// Finish a save started with [`Self::begin_save`].
    ///
    /// On a disposed controller the result is dropped. The in-memory ledger
    /// is never changed by a save, so after a failure it still holds the
    /// edits and the save can be retried.
    pub fn complete_save(&mut self, result: Result<(), SyncError>) -> Result<(), ControllerError> {
        if self.disposed {
            tracing::debug!("Ignoring save result for closed grading view");
            return Ok(());
        }

        self.saving = false;
        self.set_widgets_enabled(true);
        result.map_err(ControllerError::from)
    }

    pub async fn save(&mut self) -> Result<(), ControllerError> {
        let request = self.begin_save()?;
        let result = request.run().await;
        self.complete_save(result)
    }

    /// Tear down the view. Later calls fail with [`ControllerError::Disposed`].
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.unbind_all();
        self.mode = Mode::Viewing;
        self.disposed = true;
    }
}
