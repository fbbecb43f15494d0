//! HTTP client for the HITL loops and requests API.
//!
//! The gateway never talks to the API directly; tool handlers go through the
//! [`LoopsApi`] trait so tests can substitute a fake. [`HitlClient`] is the
//! production implementation.
//!
//! # API Coverage
//!
//! - **Keys**: `GET /test`
//! - **Loops**: `GET /loops`, `POST /loops/{id}/requests`
//! - **Requests**: list, get, update, delete, cancel, feedback

pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientBuilder, DEFAULT_BASE_URL, HitlClient, LoopsApi};
pub use error::{Error, Result};
pub use types::{
    ApiResponse, CancelRequest, ContentType, CreateRequest, Feedback, FeedbackCategory, KeyInfo,
    ListRequestsQuery, Priority, ProcessingType, RequestStatus, RequestUpdate, ResponseType,
    SortOrder,
};
