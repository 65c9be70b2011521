//! Wizard orchestrator: drives one tool through its linear flow.
//!
//! ```text
//! Upload ──select──▶ Configure ──process──▶ Processing ──▶ Complete
//!    ▲                  ▲                         │
//!    │                  └────────back─────────────┤
//!    └──────────────reset─────────────────────── Error
//! ```
//!
//! Every transition is triggered by the owner; nothing times out or retries.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::artifact::ResultArtifact;
use crate::error::{Result, ToolError};
use crate::options::ToolOptions;
use crate::progress::{ProgressReporter, ProgressSink};
use crate::source::SourceFile;
use crate::tool::{Preview, Tool};

/// Which step of the flow is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    Upload,
    Configure,
    Processing,
    Complete,
    Error,
}

/// A processing failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub message: String,
    pub diagnostics: Vec<String>,
}

impl From<&ToolError> for Failure {
    fn from(err: &ToolError) -> Self {
        let message = match err {
            ToolError::Diagnostics { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            message,
            diagnostics: err.diagnostics().to_vec(),
        }
    }
}

/// One tool instance and its in-memory session state.
pub struct Wizard {
    tool: Box<dyn Tool>,
    state: WizardState,
    sources: Vec<SourceFile>,
    defaults: ToolOptions,
    options: ToolOptions,
    preview: Option<Preview>,
    artifact: Option<ResultArtifact>,
    failure: Option<Failure>,
    progress_reporter: Option<ProgressReporter>,
}

impl Wizard {
    pub fn new(tool: Box<dyn Tool>) -> Self {
        Self::with_defaults(tool, ToolOptions::default())
    }

    /// Create a wizard whose options start from (and reset to) `defaults`.
    pub fn with_defaults(tool: Box<dyn Tool>, defaults: ToolOptions) -> Self {
        Self {
            tool,
            state: WizardState::Upload,
            sources: Vec::new(),
            options: defaults.clone(),
            defaults,
            preview: None,
            artifact: None,
            failure: None,
            progress_reporter: None,
        }
    }

    /// Set a progress reporter callback.
    pub fn set_progress_reporter(&mut self, reporter: ProgressReporter) {
        self.progress_reporter = Some(reporter);
    }

    pub fn tool(&self) -> &dyn Tool {
        self.tool.as_ref()
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn sources(&self) -> &[SourceFile] {
        &self.sources
    }

    pub fn options(&self) -> &ToolOptions {
        &self.options
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn artifact(&self) -> Option<&ResultArtifact> {
        self.artifact.as_ref()
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// Accept files for the tool.
    ///
    /// All candidates are checked before anything is stored: a rejected
    /// selection leaves the wizard exactly as it was.
    pub fn select(&mut self, files: Vec<SourceFile>) -> Result<()> {
        match self.state {
            WizardState::Processing => return Err(ToolError::Busy),
            WizardState::Upload | WizardState::Configure => {}
            WizardState::Complete | WizardState::Error => {
                return Err(ToolError::InvalidState(
                    "start over before selecting new files".to_string(),
                ))
            }
        }

        let (min, max) = self.tool.file_count();
        if files.len() < min {
            return Err(ToolError::Rejected(format!(
                "{} needs at least {} file(s), got {}",
                self.tool.name(),
                min,
                files.len()
            )));
        }
        if let Some(max) = max {
            if files.len() > max {
                return Err(ToolError::Rejected(format!(
                    "{} takes at most {} file(s), got {}",
                    self.tool.name(),
                    max,
                    files.len()
                )));
            }
        }

        for file in &files {
            if let Err(e) = self.tool.validate(file) {
                warn!("{}", e);
                return Err(e);
            }
        }

        let preview = guarded(self.tool.name(), || self.tool.preview(&files)).map_err(|e| {
            warn!("Could not read selected file(s): {}", e);
            e
        })?;

        info!(
            "{}: accepted {} file(s){}",
            self.tool.name(),
            files.len(),
            preview
                .page_count
                .map(|n| format!(", {} page(s)", n))
                .unwrap_or_default()
        );

        self.sources = files;
        self.preview = Some(preview);
        self.state = WizardState::Configure;
        Ok(())
    }

    /// Mutable access to the options; only while configuring.
    pub fn options_mut(&mut self) -> Result<&mut ToolOptions> {
        match self.state {
            WizardState::Configure => Ok(&mut self.options),
            WizardState::Processing => Err(ToolError::Busy),
            other => Err(ToolError::InvalidState(format!(
                "options can only be changed before processing (currently {:?})",
                other
            ))),
        }
    }

    /// Set one option from its textual form.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        self.options_mut()?.set(key, value)
    }

    /// Run the tool on the selected files.
    ///
    /// On failure the error is logged, recorded as [`Failure`], the wizard
    /// moves to [`WizardState::Error`], and the error is returned.
    pub fn process(&mut self) -> Result<&ResultArtifact> {
        match self.state {
            WizardState::Configure => {}
            WizardState::Processing => return Err(ToolError::Busy),
            other => {
                return Err(ToolError::InvalidState(format!(
                    "nothing to process (currently {:?})",
                    other
                )))
            }
        }

        self.state = WizardState::Processing;
        self.failure = None;
        self.artifact = None;
        info!("Running {}...", self.tool.name());

        let outcome = {
            let sink = ProgressSink::new(self.progress_reporter.as_deref());
            guarded(self.tool.name(), || {
                self.tool.process(&self.sources, &self.options, &sink)
            })
        };

        let outcome = outcome.and_then(|artifact| {
            if artifact.size() == 0 {
                Err(ToolError::Other(format!(
                    "{} produced an empty result",
                    self.tool.name()
                )))
            } else {
                Ok(artifact)
            }
        });

        match outcome {
            Ok(artifact) => {
                info!(
                    "{} complete: {} ({} bytes)",
                    self.tool.name(),
                    artifact.file_name,
                    artifact.size()
                );
                self.state = WizardState::Complete;
                Ok(&*self.artifact.insert(artifact))
            }
            Err(e) => {
                error!("{} failed: {}", self.tool.name(), e);
                for item in e.diagnostics() {
                    error!("  - {}", item);
                }
                self.failure = Some(Failure::from(&e));
                self.state = WizardState::Error;
                Err(e)
            }
        }
    }

    /// Return to the options step keeping the selected files.
    pub fn back(&mut self) -> Result<()> {
        match self.state {
            WizardState::Error | WizardState::Complete => {
                self.artifact = None;
                self.failure = None;
                self.state = WizardState::Configure;
                Ok(())
            }
            WizardState::Processing => Err(ToolError::Busy),
            other => Err(ToolError::InvalidState(format!(
                "cannot go back from {:?}",
                other
            ))),
        }
    }

    /// Deliver the artifact to `target` (a file path or a directory).
    /// May be called any number of times; every call writes the same bytes.
    pub fn download(&self, target: &Path) -> Result<PathBuf> {
        match (&self.state, &self.artifact) {
            (WizardState::Complete, Some(artifact)) => artifact.save_to(target),
            _ => Err(ToolError::InvalidState(
                "there is no result to download".to_string(),
            )),
        }
    }

    /// Discard files, options, artifact and failure; back to a fresh upload step.
    pub fn reset(&mut self) -> Result<()> {
        if self.state == WizardState::Processing {
            return Err(ToolError::Busy);
        }
        self.sources.clear();
        self.options = self.defaults.clone();
        self.preview = None;
        self.artifact = None;
        self.failure = None;
        self.state = WizardState::Upload;
        info!("{}: reset", self.tool.name());
        Ok(())
    }
}

/// Run a tool callback, converting a panic inside a collaborator library
/// into an ordinary error.
fn guarded<T>(tool_name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ToolError::Other(format!(
                "{} aborted unexpectedly: {}",
                tool_name, detail
            )))
        }
    }
}

/// Builder for constructing a wizard.
pub struct WizardBuilder {
    tool: Option<Box<dyn Tool>>,
    defaults: ToolOptions,
    progress_reporter: Option<ProgressReporter>,
}

impl WizardBuilder {
    pub fn new() -> Self {
        Self {
            tool: None,
            defaults: ToolOptions::default(),
            progress_reporter: None,
        }
    }

    pub fn tool(mut self, tool: Box<dyn Tool>) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn defaults(mut self, defaults: ToolOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn progress_reporter(mut self, reporter: ProgressReporter) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    pub fn build(self) -> Result<Wizard> {
        let tool = self
            .tool
            .ok_or_else(|| ToolError::InvalidState("No tool specified".to_string()))?;
        let mut wizard = Wizard::with_defaults(tool, self.defaults);
        if let Some(reporter) = self.progress_reporter {
            wizard.set_progress_reporter(reporter);
        }
        Ok(wizard)
    }
}

impl Default for WizardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CompressionLevel, OptionKey};
    use crate::progress::Progress;
    use crate::source::Format;
    use crate::tool::ToolKind;
    use std::sync::{Arc, Mutex};

    /// Upper-cases text files; fails on files containing "boom".
    struct ShoutTool;

    impl Tool for ShoutTool {
        fn name(&self) -> &str {
            "Shout"
        }
        fn kind(&self) -> ToolKind {
            ToolKind::TxtToPdf
        }
        fn accepts(&self) -> &[Format] {
            &[Format::Txt]
        }
        fn option_keys(&self) -> &[OptionKey] {
            &[OptionKey::OutputName]
        }
        fn preview(&self, files: &[SourceFile]) -> Result<Preview> {
            Ok(Preview {
                file_count: files.len(),
                page_count: Some(1),
            })
        }
        fn process(
            &self,
            files: &[SourceFile],
            options: &ToolOptions,
            progress: &ProgressSink<'_>,
        ) -> Result<ResultArtifact> {
            let text = String::from_utf8_lossy(&files[0].bytes).to_string();
            if text.contains("boom") {
                return Err(ToolError::Diagnostics {
                    message: "cannot shout".to_string(),
                    items: vec!["contains boom".to_string()],
                });
            }
            if text.contains("panic") {
                panic!("library blew up");
            }
            progress.begin(1, "shouting");
            let out = text.to_uppercase().into_bytes();
            progress.advance("shouted");
            Ok(ResultArtifact::new(
                options.file_name_or("shout.txt"),
                Format::Txt,
                out,
            ))
        }
    }

    fn txt(content: &str) -> SourceFile {
        SourceFile::from_bytes("note.txt", content.as_bytes().to_vec())
    }

    #[test]
    fn test_rejected_type_stays_on_upload() {
        let mut wizard = Wizard::new(Box::new(ShoutTool));
        let err = wizard
            .select(vec![SourceFile::from_bytes("doc.pdf", b"%PDF".to_vec())])
            .unwrap_err();
        assert!(matches!(err, ToolError::Rejected(_)));
        assert_eq!(wizard.state(), WizardState::Upload);
        assert!(wizard.sources().is_empty());
    }

    #[test]
    fn test_rejects_too_many_files() {
        let mut wizard = Wizard::new(Box::new(ShoutTool));
        let err = wizard.select(vec![txt("a"), txt("b")]).unwrap_err();
        assert!(matches!(err, ToolError::Rejected(_)));
        assert!(wizard.sources().is_empty());
    }

    #[test]
    fn test_full_flow_and_idempotent_download() {
        let progress = Arc::new(Mutex::new(Vec::new()));
        let progress_clone = progress.clone();

        let mut wizard = WizardBuilder::new()
            .tool(Box::new(ShoutTool))
            .progress_reporter(Box::new(move |p, msg| {
                progress_clone.lock().unwrap().push((p, msg.to_string()));
            }))
            .build()
            .unwrap();

        wizard.select(vec![txt("hello")]).unwrap();
        assert_eq!(wizard.state(), WizardState::Configure);
        assert_eq!(wizard.preview().unwrap().page_count, Some(1));

        wizard.set_option("name", "loud").unwrap();
        let artifact = wizard.process().unwrap();
        assert_eq!(artifact.file_name, "loud.txt");
        assert!(artifact.size() > 0);
        assert_eq!(wizard.state(), WizardState::Complete);

        let dir = tempfile::tempdir().unwrap();
        let first = std::fs::read(wizard.download(dir.path()).unwrap()).unwrap();
        let second = std::fs::read(wizard.download(dir.path()).unwrap()).unwrap();
        assert_eq!(first, b"HELLO");
        assert_eq!(first, second);

        let progress = progress.lock().unwrap();
        assert_eq!(
            progress.last().unwrap().0,
            Progress::Determinate { done: 1, total: 1 }
        );
    }

    #[test]
    fn test_failure_goes_to_error_state() {
        let mut wizard = Wizard::new(Box::new(ShoutTool));
        wizard.select(vec![txt("boom")]).unwrap();
        assert!(wizard.process().is_err());
        assert_eq!(wizard.state(), WizardState::Error);
        assert!(wizard.artifact().is_none());
        let failure = wizard.failure().unwrap();
        assert_eq!(failure.message, "cannot shout");
        assert_eq!(failure.diagnostics, vec!["contains boom".to_string()]);
        assert!(wizard.download(Path::new(".")).is_err());

        wizard.back().unwrap();
        assert_eq!(wizard.state(), WizardState::Configure);
        assert_eq!(wizard.sources().len(), 1);
    }

    #[test]
    fn test_panic_is_caught() {
        let mut wizard = Wizard::new(Box::new(ShoutTool));
        wizard.select(vec![txt("panic")]).unwrap();
        let err = wizard.process().unwrap_err();
        assert!(err.to_string().contains("library blew up"));
        assert_eq!(wizard.state(), WizardState::Error);
    }

    #[test]
    fn test_reset_restores_fresh_state() {
        let mut defaults = ToolOptions::default();
        defaults.compression_level = CompressionLevel::Low;

        let mut wizard = WizardBuilder::new()
            .tool(Box::new(ShoutTool))
            .defaults(defaults.clone())
            .build()
            .unwrap();
        wizard.select(vec![txt("hi")]).unwrap();
        wizard.options_mut().unwrap().font_size = 30.0;
        wizard.process().unwrap();

        wizard.reset().unwrap();
        assert_eq!(wizard.state(), WizardState::Upload);
        assert!(wizard.sources().is_empty());
        assert!(wizard.artifact().is_none());
        assert!(wizard.failure().is_none());
        assert!(wizard.preview().is_none());
        assert_eq!(wizard.options(), &defaults);
    }

    #[test]
    fn test_transitions_out_of_order_are_refused() {
        let mut wizard = Wizard::new(Box::new(ShoutTool));
        assert!(matches!(wizard.process(), Err(ToolError::InvalidState(_))));
        assert!(matches!(wizard.options_mut(), Err(ToolError::InvalidState(_))));
        assert!(wizard.back().is_err());

        wizard.select(vec![txt("hi")]).unwrap();
        wizard.process().unwrap();
        assert!(matches!(
            wizard.select(vec![txt("again")]),
            Err(ToolError::InvalidState(_))
        ));
    }

    #[test]
    fn test_builder_requires_tool() {
        assert!(WizardBuilder::new().build().is_err());
    }
}
