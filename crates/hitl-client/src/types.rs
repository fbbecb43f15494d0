//! Request and response types for the HITL API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────────────────

/// Response envelope returned by every HITL endpoint.
///
/// Successful calls carry `error: false` and an optional `data` payload;
/// failures carry `error: true` and a human-readable `msg`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Whether the API reported a failure.
    #[serde(default)]
    pub error: bool,
    /// Human-readable message.
    #[serde(default)]
    pub msg: String,
    /// Endpoint-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResponse {
    /// Build a successful envelope around `data`.
    pub fn ok(msg: impl Into<String>, data: Value) -> Self {
        Self {
            error: false,
            msg: msg.into(),
            data: Some(data),
        }
    }

    /// The payload, or `null` when the API sent none.
    pub fn data_or_null(&self) -> Value {
        self.data.clone().unwrap_or(Value::Null)
    }
}

/// Key details returned by the `/test` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// Account owning the key.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Account email.
    #[serde(default)]
    pub email: Option<String>,
    /// Identifier of the key itself.
    #[serde(default)]
    pub api_key_id: Option<String>,
    /// Account status (active, suspended, ...).
    #[serde(default)]
    pub account_status: Option<String>,
    /// Permissions granted to the key.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Any additional fields the API reports (rate-limit tier, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Enumerations
// ─────────────────────────────────────────────────────────────────────────────

/// Declares a string-valued enum with its wire names.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every accepted wire value, in declaration order.
            pub const VALUES: &'static [&'static str] = &[$($wire),+];

            /// Wire representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            /// Parse from the wire representation.
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// How quickly a request must be answered.
    ProcessingType {
        /// Must be answered before `timeout_seconds` elapse.
        TimeSensitive => "time-sensitive",
        /// Answered whenever a reviewer gets to it.
        Deferred => "deferred",
    }
}

wire_enum! {
    /// Content type of the request body.
    ContentType {
        /// Markdown text.
        Markdown => "markdown",
        /// An image referenced by `image_url`.
        Image => "image",
    }
}

wire_enum! {
    /// Request priority.
    Priority {
        /// Low priority.
        Low => "low",
        /// Medium priority.
        Medium => "medium",
        /// High priority.
        High => "high",
        /// Critical priority.
        Critical => "critical",
    }
}

wire_enum! {
    /// Shape of the reviewer's answer.
    ResponseType {
        /// Pick one option.
        SingleSelect => "single_select",
        /// Pick several options.
        MultiSelect => "multi_select",
        /// Numeric rating.
        Rating => "rating",
        /// Free text.
        Text => "text",
        /// A number.
        Number => "number",
    }
}

wire_enum! {
    /// Lifecycle status of a request.
    RequestStatus {
        /// Waiting for a reviewer.
        Pending => "pending",
        /// A reviewer picked it up.
        Claimed => "claimed",
        /// Answered.
        Completed => "completed",
        /// Timed out before an answer.
        Timeout => "timeout",
        /// Cancelled by the requester.
        Cancelled => "cancelled",
    }
}

wire_enum! {
    /// Sort order for request listings.
    SortOrder {
        /// Newest first.
        CreatedAtDesc => "created_at_desc",
        /// Oldest first.
        CreatedAtAsc => "created_at_asc",
        /// Most urgent first.
        PriorityDesc => "priority_desc",
        /// Grouped by status.
        StatusAsc => "status_asc",
    }
}

wire_enum! {
    /// Category attached to feedback.
    FeedbackCategory {
        /// Praise.
        Positive => "positive",
        /// Suggestions.
        Constructive => "constructive",
        /// Something went wrong.
        Issue => "issue",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /loops/{loop_id}/requests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    /// Processing mode.
    pub processing_type: ProcessingType,
    /// Content type.
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// Priority.
    pub priority: Priority,
    /// Text shown to the reviewer.
    pub request_text: String,
    /// Image shown to the reviewer (image requests only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Extra structured context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Answer deadline for time-sensitive requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    /// Expected answer shape.
    pub response_type: ResponseType,
    /// Answer-shape configuration (options, scale, ...).
    pub response_config: Map<String, Value>,
    /// Answer used when the request times out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_response: Option<Value>,
    /// Webhook notified on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// Originating platform.
    pub platform: String,
    /// Originating platform version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
}

/// Body of `PUT /requests/{id}`; only present fields are changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestUpdate {
    /// New processing mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_type: Option<ProcessingType>,
    /// New content type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    /// New priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New request text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_text: Option<String>,
    /// New image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// New context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// New deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    /// New answer shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    /// New answer-shape configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_config: Option<Map<String, Value>>,
    /// New default answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_response: Option<Value>,
    /// New webhook.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// New platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// New platform version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
}

impl RequestUpdate {
    /// True when no field would be changed.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Query string of `GET /requests`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListRequestsQuery {
    /// Filter by status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    /// Filter by priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Filter by loop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_id: Option<String>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Page offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Sort order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
}

/// Body of `POST /requests/{id}/cancel`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CancelRequest {
    /// Why the request is being cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Body of `POST /requests/{id}/feedback`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Overall rating (1-5).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// Free-text comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Accuracy score (1-5).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<u8>,
    /// Timeliness score (1-5).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeliness: Option<u8>,
    /// Helpfulness score (1-5).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helpfulness: Option<u8>,
    /// Whether the reviewer would be recommended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub would_recommend: Option<bool>,
    /// Feedback category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<FeedbackCategory>,
    /// Caller-defined fields passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
