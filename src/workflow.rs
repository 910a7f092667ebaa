//! Submission state machine shared by the three generation forms.
//!
//! A controller owns its view and drives it through
//! `Idle -> Submitting -> Succeeded | Failed`, settling the submit control on
//! every exit path. The form-specific parts live behind [`Workflow`].

use async_trait::async_trait;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use crate::client::{Endpoint, GenerationClient, GenerationResult};
use crate::download::DownloadBridge;
use crate::error::WorkflowError;
use crate::forms::{FestivalForm, GenerationRequest, MenuForm, PromotionalForm};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkflowState {
    #[default]
    Idle,
    Submitting,
    Succeeded(GenerationResult),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Submit,
    Succeed(GenerationResult),
    Fail(String),
    Reset,
}

impl WorkflowState {
    pub fn reduce(self, event: WorkflowEvent) -> WorkflowState {
        match (self, event) {
            (WorkflowState::Submitting, WorkflowEvent::Submit) => {
                tracing::warn!("submit while a request is in flight");
                WorkflowState::Submitting
            }
            (_, WorkflowEvent::Submit) => WorkflowState::Submitting,
            (WorkflowState::Submitting, WorkflowEvent::Succeed(result)) => {
                WorkflowState::Succeeded(result)
            }
            (WorkflowState::Submitting, WorkflowEvent::Fail(message)) => {
                WorkflowState::Failed(message)
            }
            (WorkflowState::Succeeded(_) | WorkflowState::Failed(_), WorkflowEvent::Reset) => {
                WorkflowState::Idle
            }
            (state, event) => {
                tracing::warn!(?state, ?event, "ignoring out-of-order workflow event");
                state
            }
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, WorkflowState::Submitting)
    }
}

/// UI affordances a controller drives. Injected at construction.
pub trait WorkflowView {
    fn set_submit_enabled(&mut self, enabled: bool);
    fn set_submit_label(&mut self, label: &str);
    fn set_loading_visible(&mut self, visible: bool);
    fn show_result_image(&mut self, image_url: &str);
    fn hide_result_image(&mut self);
    fn set_download_enabled(&mut self, enabled: bool);
    /// Blocking user notification.
    fn notify_error(&mut self, message: &str);
}

/// Per-form strategy: endpoint, labels and payload construction.
#[async_trait]
pub trait Workflow: Send + Sync + 'static {
    type Form: Send + Sync;

    const NAME: &'static str;
    const ENDPOINT: Endpoint;
    const IDLE_LABEL: &'static str;
    const BUSY_LABEL: &'static str;
    /// Subject of the failure notification, e.g. "poster".
    const SUBJECT: &'static str;

    async fn build_request(form: &Self::Form) -> Result<GenerationRequest, WorkflowError>;
}

pub struct PromotionalPoster;

#[async_trait]
impl Workflow for PromotionalPoster {
    type Form = PromotionalForm;

    const NAME: &'static str = "promotional";
    const ENDPOINT: Endpoint = Endpoint::Poster;
    const IDLE_LABEL: &'static str = "Generate Poster";
    const BUSY_LABEL: &'static str = "Generating Poster...";
    const SUBJECT: &'static str = "poster";

    async fn build_request(form: &PromotionalForm) -> Result<GenerationRequest, WorkflowError> {
        form.collect().await
    }
}

pub struct FestivalPoster;

#[async_trait]
impl Workflow for FestivalPoster {
    type Form = FestivalForm;

    const NAME: &'static str = "festival";
    const ENDPOINT: Endpoint = Endpoint::FestivalPoster;
    const IDLE_LABEL: &'static str = "Generate Poster";
    const BUSY_LABEL: &'static str = "Generating Poster...";
    const SUBJECT: &'static str = "poster";

    async fn build_request(form: &FestivalForm) -> Result<GenerationRequest, WorkflowError> {
        form.collect().await
    }
}

pub struct Menu;

#[async_trait]
impl Workflow for Menu {
    type Form = MenuForm;

    const NAME: &'static str = "menu";
    const ENDPOINT: Endpoint = Endpoint::Menu;
    const IDLE_LABEL: &'static str = "Generate Menu";
    const BUSY_LABEL: &'static str = "Generating Menu...";
    const SUBJECT: &'static str = "menu";

    async fn build_request(form: &MenuForm) -> Result<GenerationRequest, WorkflowError> {
        form.collect().await
    }
}

/// Recorded when a submission is dropped before it completes.
pub const CANCELLED_MESSAGE: &str = "Generation was cancelled.";

fn transition(state: &mut WorkflowState, event: WorkflowEvent, workflow: &str) {
    let next = std::mem::take(state).reduce(event);
    tracing::debug!(workflow, state = ?next, "workflow transition");
    *state = next;
}

/// Holds one submission open. Dropping it restores the submit control and
/// moves the state out of `Submitting`, with the recorded outcome or as
/// cancelled.
struct SettleGuard<'a, V: WorkflowView> {
    view: &'a mut V,
    state: &'a mut WorkflowState,
    workflow: &'static str,
    idle_label: &'static str,
    outcome: Option<WorkflowEvent>,
}

impl<'a, V: WorkflowView> SettleGuard<'a, V> {
    fn engage<W: Workflow>(view: &'a mut V, state: &'a mut WorkflowState) -> Self {
        transition(state, WorkflowEvent::Submit, W::NAME);
        view.set_submit_enabled(false);
        view.set_submit_label(W::BUSY_LABEL);
        view.set_loading_visible(true);
        view.hide_result_image();
        view.set_download_enabled(false);
        Self {
            view,
            state,
            workflow: W::NAME,
            idle_label: W::IDLE_LABEL,
            outcome: None,
        }
    }

    fn finish(&mut self, event: WorkflowEvent) {
        self.outcome = Some(event);
    }
}

impl<V: WorkflowView> Deref for SettleGuard<'_, V> {
    type Target = V;

    fn deref(&self) -> &V {
        self.view
    }
}

impl<V: WorkflowView> DerefMut for SettleGuard<'_, V> {
    fn deref_mut(&mut self) -> &mut V {
        self.view
    }
}

impl<V: WorkflowView> Drop for SettleGuard<'_, V> {
    fn drop(&mut self) {
        self.view.set_submit_enabled(true);
        self.view.set_submit_label(self.idle_label);
        self.view.set_loading_visible(false);

        let event = self.outcome.take().unwrap_or_else(|| {
            tracing::warn!(workflow = self.workflow, "submission dropped before completion");
            WorkflowEvent::Fail(CANCELLED_MESSAGE.to_string())
        });
        transition(self.state, event, self.workflow);
    }
}

pub struct WorkflowController<W: Workflow, V: WorkflowView, C: GenerationClient> {
    view: V,
    client: C,
    download: DownloadBridge,
    state: WorkflowState,
    _workflow: PhantomData<W>,
}

impl<W: Workflow, V: WorkflowView, C: GenerationClient> WorkflowController<W, V, C> {
    pub fn new(view: V, client: C, download: DownloadBridge) -> Self {
        Self {
            view,
            client,
            download,
            state: WorkflowState::Idle,
            _workflow: PhantomData,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn download(&self) -> &DownloadBridge {
        &self.download
    }

    fn apply(&mut self, event: WorkflowEvent) {
        transition(&mut self.state, event, W::NAME);
    }

    /// Runs one submission to completion.
    ///
    /// UI feedback is applied before the first await. Any error, whether from
    /// validation, encoding or the generator, ends in `Failed` and a single
    /// notification. A submission dropped midway settles as `Failed` with
    /// [`CANCELLED_MESSAGE`] and no notification.
    pub async fn submit(&mut self, form: &W::Form) -> &WorkflowState {
        self.download.clear();
        let mut ui = SettleGuard::engage::<W>(&mut self.view, &mut self.state);

        let outcome = match W::build_request(form).await {
            Ok(request) => self
                .client
                .generate(W::ENDPOINT, &request)
                .await
                .map_err(WorkflowError::from),
            Err(err) => Err(err),
        };

        let event = match outcome {
            Ok(result) => {
                ui.show_result_image(&result.image_url);
                ui.set_download_enabled(true);
                self.download.attach(&result.image_url);
                WorkflowEvent::Succeed(result)
            }
            Err(err) => {
                tracing::error!(workflow = W::NAME, error = %err, "generation failed");
                let message = err.to_string();
                ui.notify_error(&format!("Failed to generate {}: {}", W::SUBJECT, message));
                WorkflowEvent::Fail(message)
            }
        };
        ui.finish(event);
        drop(ui);

        &self.state
    }

    /// Returns a settled controller to `Idle`, clearing the previous result.
    pub fn reset(&mut self) {
        if !matches!(
            self.state,
            WorkflowState::Succeeded(_) | WorkflowState::Failed(_)
        ) {
            return;
        }
        self.view.hide_result_image();
        self.view.set_download_enabled(false);
        self.download.clear();
        self.apply(WorkflowEvent::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::LogoFile;
    use crate::error::GenerationError;
    use crate::forms::MenuItem;
    use futures::FutureExt;
    use crate::view::{RecordingView, ViewCall};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Generator double that records each call and the UI log at dispatch.
    struct StubClient {
        reply: Result<GenerationResult, GenerationError>,
        view: RecordingView,
        dispatched: Arc<Mutex<Vec<(Endpoint, Vec<ViewCall>)>>>,
    }

    impl StubClient {
        fn new(view: &RecordingView, reply: Result<GenerationResult, GenerationError>) -> Self {
            Self {
                reply,
                view: view.clone(),
                dispatched: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl GenerationClient for StubClient {
        async fn generate(
            &self,
            endpoint: Endpoint,
            request: &GenerationRequest,
        ) -> Result<GenerationResult, GenerationError> {
            assert_eq!(request.endpoint(), endpoint);
            self.dispatched.lock().push((endpoint, self.view.calls()));
            self.reply.clone()
        }
    }

    fn ok(url: &str) -> Result<GenerationResult, GenerationError> {
        Ok(GenerationResult {
            image_url: url.to_string(),
        })
    }

    #[test]
    fn reducer_ignores_completion_outside_submission() {
        let result = GenerationResult {
            image_url: "a.png".into(),
        };
        assert_eq!(
            WorkflowState::Idle.reduce(WorkflowEvent::Succeed(result.clone())),
            WorkflowState::Idle
        );
        assert_eq!(
            WorkflowState::Failed("x".into()).reduce(WorkflowEvent::Submit),
            WorkflowState::Submitting
        );
        assert_eq!(
            WorkflowState::Submitting.reduce(WorkflowEvent::Reset),
            WorkflowState::Submitting
        );
        assert_eq!(
            WorkflowState::Succeeded(result).reduce(WorkflowEvent::Reset),
            WorkflowState::Idle
        );
    }

    async fn view_at_dispatch<W: Workflow>(form: &W::Form) -> (Endpoint, Vec<ViewCall>) {
        let view = RecordingView::new();
        let client = StubClient::new(&view, ok("https://host/out/42.png"));
        let dispatched = client.dispatched.clone();
        let mut controller: WorkflowController<W, _, _> =
            WorkflowController::new(view.clone(), client, DownloadBridge::new());

        controller.submit(form).await;

        let mut dispatched = dispatched.lock();
        assert_eq!(dispatched.len(), 1);
        dispatched.remove(0)
    }

    fn busy(label: &str) -> Vec<ViewCall> {
        vec![
            ViewCall::SubmitEnabled(false),
            ViewCall::SubmitLabel(label.into()),
            ViewCall::LoadingVisible(true),
            ViewCall::HideResult,
            ViewCall::DownloadEnabled(false),
        ]
    }

    #[tokio::test]
    async fn poster_feedback_precedes_dispatch() {
        let (endpoint, at_dispatch) =
            view_at_dispatch::<PromotionalPoster>(&PromotionalForm::default()).await;
        assert_eq!(endpoint, Endpoint::Poster);
        assert_eq!(at_dispatch, busy("Generating Poster..."));
    }

    #[tokio::test]
    async fn festival_feedback_precedes_dispatch() {
        let (endpoint, at_dispatch) =
            view_at_dispatch::<FestivalPoster>(&FestivalForm::default()).await;
        assert_eq!(endpoint, Endpoint::FestivalPoster);
        assert_eq!(at_dispatch, busy("Generating Poster..."));
    }

    #[tokio::test]
    async fn menu_feedback_precedes_dispatch() {
        let form = MenuForm {
            logo: Some(LogoFile::from("data:image/png;base64,AAAA".to_string())),
            items: vec![MenuItem::new("Coffee", "3")].into(),
            ..MenuForm::default()
        };
        let (endpoint, at_dispatch) = view_at_dispatch::<Menu>(&form).await;
        assert_eq!(endpoint, Endpoint::Menu);
        assert_eq!(at_dispatch, busy("Generating Menu..."));
    }

    /// Generator that never answers.
    struct StalledClient;

    #[async_trait]
    impl GenerationClient for StalledClient {
        async fn generate(
            &self,
            _endpoint: Endpoint,
            _request: &GenerationRequest,
        ) -> Result<GenerationResult, GenerationError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn dropped_submission_settles_as_cancelled() {
        let view = RecordingView::new();
        let mut controller: WorkflowController<PromotionalPoster, _, _> =
            WorkflowController::new(view.clone(), StalledClient, DownloadBridge::new());

        assert!(controller
            .submit(&PromotionalForm::default())
            .now_or_never()
            .is_none());

        assert_eq!(
            controller.state(),
            &WorkflowState::Failed(CANCELLED_MESSAGE.to_string())
        );
        assert_eq!(view.settle_count(), 1);
        assert!(view.submit_enabled());
        assert_eq!(view.submit_label(), "Generate Poster");
        assert!(view.notifications().is_empty());

        controller.reset();
        assert_eq!(controller.state(), &WorkflowState::Idle);
    }

    #[tokio::test]
    async fn success_shows_image_and_arms_download() {
        let view = RecordingView::new();
        let client = StubClient::new(&view, ok("https://host/out/42.png"));
        let mut controller: WorkflowController<FestivalPoster, _, _> =
            WorkflowController::new(view.clone(), client, DownloadBridge::new());

        let state = controller.submit(&FestivalForm::default()).await.clone();

        assert_eq!(
            state,
            WorkflowState::Succeeded(GenerationResult {
                image_url: "https://host/out/42.png".into()
            })
        );
        assert_eq!(view.result_image().as_deref(), Some("https://host/out/42.png"));
        assert!(view.download_enabled());
        assert_eq!(view.submit_label(), "Generate Poster");
        assert!(view.submit_enabled());
        assert!(!view.loading_visible());
        assert_eq!(view.settle_count(), 1);

        let save = controller.download().trigger().unwrap();
        assert_eq!(save.filename, "42.png");
    }

    #[tokio::test]
    async fn server_failure_notifies_and_settles_once() {
        let view = RecordingView::new();
        let client = StubClient::new(&view, Err(GenerationError::new("bad style")));
        let mut controller: WorkflowController<PromotionalPoster, _, _> =
            WorkflowController::new(view.clone(), client, DownloadBridge::new());

        let state = controller.submit(&PromotionalForm::default()).await.clone();

        assert_eq!(state, WorkflowState::Failed("bad style".into()));
        assert_eq!(
            view.notifications(),
            vec!["Failed to generate poster: bad style".to_string()]
        );
        assert_eq!(view.result_image(), None);
        assert!(!view.download_enabled());
        assert_eq!(view.settle_count(), 1);
        assert_eq!(controller.download().trigger(), None);
    }

    #[tokio::test]
    async fn menu_validation_never_reaches_the_client() {
        let view = RecordingView::new();
        let client = StubClient::new(&view, ok("unused.png"));
        let dispatched = client.dispatched.clone();
        let mut controller: WorkflowController<Menu, _, _> =
            WorkflowController::new(view.clone(), client, DownloadBridge::new());

        let form = MenuForm {
            items: vec![MenuItem::new("Coffee", "3")].into(),
            ..MenuForm::default()
        };
        let state = controller.submit(&form).await.clone();

        assert_eq!(
            state,
            WorkflowState::Failed("A logo is required to generate a menu.".into())
        );
        assert!(dispatched.lock().is_empty());
        assert_eq!(view.submit_label(), "Generate Menu");
        assert_eq!(view.settle_count(), 1);
    }

    #[tokio::test]
    async fn new_submission_clears_previous_download() {
        let view = RecordingView::new();
        let client = StubClient::new(&view, ok("https://host/out/1.png"));
        let bridge = DownloadBridge::new();
        let mut controller: WorkflowController<PromotionalPoster, _, _> =
            WorkflowController::new(view.clone(), client, bridge.clone());

        controller.submit(&PromotionalForm::default()).await;
        assert!(bridge.reference().is_some());

        controller.client.reply = Err(GenerationError::new("down"));
        controller.submit(&PromotionalForm::default()).await;
        assert_eq!(bridge.reference(), None);
        assert_eq!(view.settle_count(), 2);
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let view = RecordingView::new();
        let client = StubClient::new(&view, ok("https://host/out/1.png"));
        let mut controller: WorkflowController<PromotionalPoster, _, _> =
            WorkflowController::new(view.clone(), client, DownloadBridge::new());

        controller.reset();
        assert_eq!(controller.state(), &WorkflowState::Idle);

        controller.submit(&PromotionalForm::default()).await;
        controller.reset();

        assert_eq!(controller.state(), &WorkflowState::Idle);
        assert_eq!(view.result_image(), None);
        assert!(!view.download_enabled());
        assert_eq!(controller.download().trigger(), None);
    }
}
