use parking_lot::Mutex;
use std::sync::Arc;

use crate::workflow::WorkflowView;

/// Renders workflow affordances for a terminal session.
#[derive(Debug, Default)]
pub struct TerminalView {
    label: String,
    shown: Option<String>,
}

impl TerminalView {
    pub fn new(idle_label: &str) -> Self {
        Self {
            label: idle_label.to_string(),
            shown: None,
        }
    }

    pub fn shown_image(&self) -> Option<&str> {
        self.shown.as_deref()
    }
}

impl WorkflowView for TerminalView {
    fn set_submit_enabled(&mut self, enabled: bool) {
        tracing::debug!(label = %self.label, enabled, "submit control");
    }

    fn set_submit_label(&mut self, label: &str) {
        self.label = label.to_string();
        tracing::info!("{}", label);
    }

    fn set_loading_visible(&mut self, visible: bool) {
        tracing::debug!(visible, "loading indicator");
    }

    fn show_result_image(&mut self, image_url: &str) {
        println!("Generated image: {}", image_url);
        self.shown = Some(image_url.to_string());
    }

    fn hide_result_image(&mut self) {
        self.shown = None;
    }

    fn set_download_enabled(&mut self, enabled: bool) {
        tracing::debug!(enabled, "download control");
    }

    fn notify_error(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    SubmitEnabled(bool),
    SubmitLabel(String),
    LoadingVisible(bool),
    ShowResult(String),
    HideResult,
    DownloadEnabled(bool),
    Notify(String),
}

/// Headless view that keeps a log of every call. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    calls: Arc<Mutex<Vec<ViewCall>>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: ViewCall) {
        self.calls.lock().push(call);
    }

    fn last<T>(&self, pick: impl Fn(&ViewCall) -> Option<T>) -> Option<T> {
        self.calls.lock().iter().rev().find_map(pick)
    }

    pub fn submit_enabled(&self) -> bool {
        self.last(|call| match call {
            ViewCall::SubmitEnabled(enabled) => Some(*enabled),
            _ => None,
        })
        .unwrap_or(true)
    }

    pub fn submit_label(&self) -> String {
        self.last(|call| match call {
            ViewCall::SubmitLabel(label) => Some(label.clone()),
            _ => None,
        })
        .unwrap_or_default()
    }

    pub fn loading_visible(&self) -> bool {
        self.last(|call| match call {
            ViewCall::LoadingVisible(visible) => Some(*visible),
            _ => None,
        })
        .unwrap_or(false)
    }

    pub fn download_enabled(&self) -> bool {
        self.last(|call| match call {
            ViewCall::DownloadEnabled(enabled) => Some(*enabled),
            _ => None,
        })
        .unwrap_or(false)
    }

    /// Source of the result image if it is currently displayed.
    pub fn result_image(&self) -> Option<String> {
        self.last(|call| match call {
            ViewCall::ShowResult(url) => Some(Some(url.clone())),
            ViewCall::HideResult => Some(None),
            _ => None,
        })
        .flatten()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                ViewCall::Notify(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of times the loading indicator was hidden again.
    pub fn settle_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| **call == ViewCall::LoadingVisible(false))
            .count()
    }
}

impl WorkflowView for RecordingView {
    fn set_submit_enabled(&mut self, enabled: bool) {
        self.record(ViewCall::SubmitEnabled(enabled));
    }

    fn set_submit_label(&mut self, label: &str) {
        self.record(ViewCall::SubmitLabel(label.to_string()));
    }

    fn set_loading_visible(&mut self, visible: bool) {
        self.record(ViewCall::LoadingVisible(visible));
    }

    fn show_result_image(&mut self, image_url: &str) {
        self.record(ViewCall::ShowResult(image_url.to_string()));
    }

    fn hide_result_image(&mut self) {
        self.record(ViewCall::HideResult);
    }

    fn set_download_enabled(&mut self, enabled: bool) {
        self.record(ViewCall::DownloadEnabled(enabled));
    }

    fn notify_error(&mut self, message: &str) {
        self.record(ViewCall::Notify(message.to_string()));
    }
}
