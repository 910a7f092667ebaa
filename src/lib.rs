//! Client side of the poster and menu generator.
//!
//! Collects form input for the promotional poster, festival poster and menu
//! workflows, sends it to the generation service and drives the UI around
//! each request.

pub mod client;
pub mod config;
pub mod download;
pub mod encoder;
pub mod error;
pub mod forms;
pub mod view;
pub mod workflow;

pub use client::{Endpoint, GenerationClient, GenerationResult, HttpGenerationClient};
pub use download::{DownloadBridge, FileSaver, SaveAction};
pub use error::{GenerationError, ValidationError, WorkflowError};
pub use workflow::{
    FestivalPoster, Menu, PromotionalPoster, Workflow, WorkflowController, WorkflowState,
    WorkflowView,
};
