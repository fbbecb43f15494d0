//! Typed tool arguments.
//!
//! Each tool's raw JSON arguments are converted into a typed struct with
//! `TryFrom<Value>`. Conversion checks every field and cross-field rule and
//! reports all violations together; nothing is defaulted or rewritten during
//! the check. Defaults such as the `platform` of a new request are applied
//! afterwards by an explicit transform ([`CreateRequestParams::into_payload`]).

use hitl_client::{
    CancelRequest, ContentType, CreateRequest, Feedback, FeedbackCategory, ListRequestsQuery,
    Priority, ProcessingType, RequestStatus, RequestUpdate, ResponseType, SortOrder,
};
use serde_json::{Map, Value};

use crate::error::{ParamResult, ParameterValidationError};

/// Platform recorded on requests that do not name one.
pub const DEFAULT_PLATFORM: &str = "api";

/// Maximum length of `request_text`.
pub const MAX_REQUEST_TEXT_CHARS: usize = 2000;

/// Maximum length of a cancellation reason.
pub const MAX_REASON_CHARS: usize = 1000;

/// Maximum length of a feedback comment.
pub const MAX_COMMENT_CHARS: usize = 1000;

/// Largest page size for `list_requests`.
pub const MAX_LIST_LIMIT: u64 = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Extraction helpers
// ─────────────────────────────────────────────────────────────────────────────

/// JSON type name used in error messages.
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_u64() || n.is_i64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Helper trait for extracting and validating parameters from JSON.
///
/// An explicit `null` is treated the same as an absent key.
pub trait ParamExt {
    /// Get a present, non-null value.
    fn present(&self, name: &str) -> Option<&Value>;

    /// Get a required string parameter.
    fn required_str(&self, name: &'static str, hint: &'static str) -> ParamResult<&str>;

    /// Get an optional string parameter.
    fn optional_str(&self, name: &'static str) -> ParamResult<Option<&str>>;

    /// Get an optional non-negative integer parameter.
    fn optional_u64(&self, name: &'static str) -> ParamResult<Option<u64>>;

    /// Get an optional boolean parameter.
    fn optional_bool(&self, name: &'static str) -> ParamResult<Option<bool>>;

    /// Get an optional object parameter.
    fn optional_object(&self, name: &'static str) -> ParamResult<Option<&Map<String, Value>>>;
}

impl ParamExt for Value {
    fn present(&self, name: &str) -> Option<&Value> {
        self.get(name).filter(|v| !v.is_null())
    }

    fn required_str(&self, name: &'static str, hint: &'static str) -> ParamResult<&str> {
        self.optional_str(name)?
            .ok_or_else(|| ParameterValidationError::missing(name, hint))
    }

    fn optional_str(&self, name: &'static str) -> ParamResult<Option<&str>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(ParameterValidationError::invalid_type(
                name,
                "string",
                json_type(other),
            )),
        }
    }

    fn optional_u64(&self, name: &'static str) -> ParamResult<Option<u64>> {
        match self.present(name) {
            None => Ok(None),
            Some(v) => {
                if let Some(n) = v.as_u64() {
                    Ok(Some(n))
                } else if let Some(n) = v.as_i64() {
                    Err(ParameterValidationError::out_of_range(
                        name,
                        n,
                        "must be a non-negative integer",
                    ))
                } else {
                    Err(ParameterValidationError::invalid_type(
                        name,
                        "integer",
                        json_type(v),
                    ))
                }
            }
        }
    }

    fn optional_bool(&self, name: &'static str) -> ParamResult<Option<bool>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(ParameterValidationError::invalid_type(
                name,
                "boolean",
                json_type(other),
            )),
        }
    }

    fn optional_object(&self, name: &'static str) -> ParamResult<Option<&Map<String, Value>>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(ParameterValidationError::invalid_type(
                name,
                "object",
                json_type(other),
            )),
        }
    }
}

/// Accumulates violations so a payload is reported in full.
#[derive(Debug, Default)]
struct Checks {
    errors: Vec<ParameterValidationError>,
}

impl Checks {
    /// Keep the value or record the error.
    fn take<T>(&mut self, result: ParamResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    /// Like [`take`](Self::take) for optional fields, flattening the result.
    fn take_opt<T>(&mut self, result: ParamResult<Option<T>>) -> Option<T> {
        self.take(result).flatten()
    }

    fn push(&mut self, error: ParameterValidationError) {
        self.errors.push(error);
    }

    fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn finish(self) -> ParamResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ParameterValidationError::multiple(self.errors))
        }
    }
}

/// Arguments must be an object; absent arguments count as `{}`.
fn ensure_object(params: &Value) -> ParamResult<()> {
    match params {
        Value::Object(_) | Value::Null => Ok(()),
        other => Err(ParameterValidationError::invalid_type(
            "arguments",
            "object",
            json_type(other),
        )),
    }
}

fn enum_value<T>(
    params: &Value,
    name: &'static str,
    parse: fn(&str) -> Option<T>,
    allowed: &[&str],
) -> ParamResult<Option<T>> {
    let Some(raw) = params.optional_str(name)? else {
        return Ok(None);
    };
    parse(raw).map(Some).ok_or_else(|| {
        ParameterValidationError::invalid_value(
            name,
            raw,
            format!("must be one of: {}", allowed.join(", ")),
        )
    })
}

/// Report `name` as missing when it was absent. A field that is present but
/// invalid has already been reported by its own check.
fn require<T>(
    checks: &mut Checks,
    params: &Value,
    value: Option<T>,
    name: &'static str,
    hint: &'static str,
) -> Option<T> {
    if value.is_none() && params.present(name).is_none() {
        checks.push(ParameterValidationError::missing(name, hint));
    }
    value
}

fn identifier(params: &Value, name: &'static str, hint: &'static str) -> ParamResult<String> {
    let id = params.required_str(name, hint)?;
    if id.trim().is_empty() {
        return Err(ParameterValidationError::invalid_value(
            name,
            id,
            "cannot be empty",
        ));
    }
    Ok(id.to_string())
}

fn bounded_text(
    params: &Value,
    name: &'static str,
    min: usize,
    max: usize,
) -> ParamResult<Option<String>> {
    let Some(text) = params.optional_str(name)? else {
        return Ok(None);
    };
    let len = text.chars().count();
    if len < min || len > max {
        let constraint = if min == 0 {
            format!("must be at most {max} characters")
        } else {
            format!("must be between {min} and {max} characters")
        };
        return Err(ParameterValidationError::out_of_range(name, len, constraint));
    }
    Ok(Some(text.to_string()))
}

fn http_url(params: &Value, name: &'static str) -> ParamResult<Option<String>> {
    let Some(raw) = params.optional_str(name)? else {
        return Ok(None);
    };
    match url::Url::parse(raw) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(Some(raw.to_string())),
        Ok(_) => Err(ParameterValidationError::invalid_value(
            name,
            raw,
            "must be an http or https URL",
        )),
        Err(e) => Err(ParameterValidationError::invalid_value(
            name,
            raw,
            e.to_string(),
        )),
    }
}

fn score(params: &Value, name: &'static str) -> ParamResult<Option<u8>> {
    match params.optional_u64(name) {
        Ok(Some(n @ 1..=5)) => Ok(Some(n as u8)),
        Ok(Some(n)) => Err(ParameterValidationError::out_of_range(
            name,
            n,
            "must be between 1 and 5",
        )),
        Ok(None) => Ok(None),
        Err(ParameterValidationError::OutOfRange { value, .. }) => Err(
            ParameterValidationError::out_of_range(name, value, "must be between 1 and 5"),
        ),
        Err(e) => Err(e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request fields shared by create_request and update_request
// ─────────────────────────────────────────────────────────────────────────────

/// Keys that make up a request definition.
pub const REQUEST_FIELDS: &[&str] = &[
    "processing_type",
    "type",
    "priority",
    "request_text",
    "image_url",
    "context",
    "timeout_seconds",
    "response_type",
    "response_config",
    "default_response",
    "callback_url",
    "platform",
    "platform_version",
];

/// Field-level view of a request definition; every field optional.
#[derive(Debug, Clone, Default, PartialEq)]
struct RequestFields {
    processing_type: Option<ProcessingType>,
    content_type: Option<ContentType>,
    priority: Option<Priority>,
    request_text: Option<String>,
    image_url: Option<String>,
    context: Option<Value>,
    timeout_seconds: Option<u64>,
    response_type: Option<ResponseType>,
    response_config: Option<Map<String, Value>>,
    default_response: Option<Value>,
    callback_url: Option<String>,
    platform: Option<String>,
    platform_version: Option<String>,
}

impl RequestFields {
    fn parse(params: &Value, checks: &mut Checks) -> Self {
        let timeout_seconds = checks.take_opt(params.optional_u64("timeout_seconds"));
        if timeout_seconds == Some(0) {
            checks.push(ParameterValidationError::out_of_range(
                "timeout_seconds",
                0,
                "must be greater than 0",
            ));
        }

        let context = params.present("context").cloned();
        if let Some(ref ctx) = context
            && !ctx.is_object()
        {
            checks.push(ParameterValidationError::invalid_type(
                "context",
                "object",
                json_type(ctx),
            ));
        }

        Self {
            processing_type: checks.take_opt(enum_value(
                params,
                "processing_type",
                ProcessingType::parse,
                ProcessingType::VALUES,
            )),
            content_type: checks.take_opt(enum_value(
                params,
                "type",
                ContentType::parse,
                ContentType::VALUES,
            )),
            priority: checks.take_opt(enum_value(
                params,
                "priority",
                Priority::parse,
                Priority::VALUES,
            )),
            request_text: checks.take_opt(bounded_text(
                params,
                "request_text",
                1,
                MAX_REQUEST_TEXT_CHARS,
            )),
            image_url: checks.take_opt(http_url(params, "image_url")),
            context,
            timeout_seconds,
            response_type: checks.take_opt(enum_value(
                params,
                "response_type",
                ResponseType::parse,
                ResponseType::VALUES,
            )),
            response_config: checks
                .take_opt(params.optional_object("response_config"))
                .cloned(),
            default_response: params.present("default_response").cloned(),
            callback_url: checks.take_opt(http_url(params, "callback_url")),
            platform: checks
                .take_opt(params.optional_str("platform"))
                .map(str::to_string),
            platform_version: checks
                .take_opt(params.optional_str("platform_version"))
                .map(str::to_string),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Typed Parameter Structs
// ─────────────────────────────────────────────────────────────────────────────

/// Validated parameters for `list_loops` (takes none).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListLoopsParams;

impl TryFrom<Value> for ListLoopsParams {
    type Error = ParameterValidationError;

    fn try_from(params: Value) -> Result<Self, Self::Error> {
        ensure_object(&params)?;
        Ok(Self)
    }
}

/// Validated parameters for `create_request`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequestParams {
    /// Loop the request is posted to.
    pub loop_id: String,
    pub processing_type: ProcessingType,
    pub content_type: ContentType,
    pub priority: Priority,
    pub request_text: String,
    pub image_url: Option<String>,
    pub context: Option<Value>,
    pub timeout_seconds: Option<u64>,
    pub response_type: ResponseType,
    pub response_config: Map<String, Value>,
    pub default_response: Option<Value>,
    pub callback_url: Option<String>,
    /// As supplied; see [`into_payload`](Self::into_payload) for the default.
    pub platform: Option<String>,
    pub platform_version: Option<String>,
}

impl TryFrom<Value> for CreateRequestParams {
    type Error = ParameterValidationError;

    fn try_from(params: Value) -> Result<Self, Self::Error> {
        ensure_object(&params)?;
        let mut checks = Checks::default();

        let loop_id = checks.take(identifier(
            &params,
            "loop_id",
            "provide the id of the loop to post to",
        ));
        let fields = RequestFields::parse(&params, &mut checks);

        let processing_type = require(
            &mut checks,
            &params,
            fields.processing_type,
            "processing_type",
            "one of: time-sensitive, deferred",
        );
        let content_type = require(
            &mut checks,
            &params,
            fields.content_type,
            "type",
            "one of: markdown, image",
        );
        let priority = require(
            &mut checks,
            &params,
            fields.priority,
            "priority",
            "one of: low, medium, high, critical",
        );
        let request_text = require(
            &mut checks,
            &params,
            fields.request_text,
            "request_text",
            "provide the text shown to the reviewer",
        );
        let response_type = require(
            &mut checks,
            &params,
            fields.response_type,
            "response_type",
            "one of: single_select, multi_select, rating, text, number",
        );
        let response_config = require(
            &mut checks,
            &params,
            fields.response_config,
            "response_config",
            "provide an object configuring the response (e.g. options)",
        );

        if processing_type == Some(ProcessingType::TimeSensitive)
            && fields.timeout_seconds.is_none()
            && params.present("timeout_seconds").is_none()
        {
            checks.push(ParameterValidationError::missing(
                "timeout_seconds",
                "required when processing_type is time-sensitive",
            ));
        }
        if content_type == Some(ContentType::Image)
            && fields.image_url.is_none()
            && params.present("image_url").is_none()
        {
            checks.push(ParameterValidationError::missing(
                "image_url",
                "required when type is image",
            ));
        }

        match (
            checks.is_clean(),
            loop_id,
            processing_type,
            content_type,
            priority,
            request_text,
            response_type,
            response_config,
        ) {
            (
                true,
                Some(loop_id),
                Some(processing_type),
                Some(content_type),
                Some(priority),
                Some(request_text),
                Some(response_type),
                Some(response_config),
            ) => Ok(Self {
                loop_id,
                processing_type,
                content_type,
                priority,
                request_text,
                image_url: fields.image_url,
                context: fields.context,
                timeout_seconds: fields.timeout_seconds,
                response_type,
                response_config,
                default_response: fields.default_response,
                callback_url: fields.callback_url,
                platform: fields.platform,
                platform_version: fields.platform_version,
            }),
            _ => Err(checks.finish().err().unwrap_or_else(|| {
                ParameterValidationError::missing("arguments", "provide the request definition")
            })),
        }
    }
}

impl CreateRequestParams {
    /// Split into the target loop and the API payload, applying defaults.
    pub fn into_payload(self) -> (String, CreateRequest) {
        let payload = CreateRequest {
            processing_type: self.processing_type,
            content_type: self.content_type,
            priority: self.priority,
            request_text: self.request_text,
            image_url: self.image_url,
            context: self.context,
            timeout_seconds: self.timeout_seconds,
            response_type: self.response_type,
            response_config: self.response_config,
            default_response: self.default_response,
            callback_url: self.callback_url,
            platform: self
                .platform
                .unwrap_or_else(|| DEFAULT_PLATFORM.to_string()),
            platform_version: self.platform_version,
        };
        (self.loop_id, payload)
    }
}

/// Validated parameters for `list_requests`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListRequestsParams {
    pub query: ListRequestsQuery,
}

impl TryFrom<Value> for ListRequestsParams {
    type Error = ParameterValidationError;

    fn try_from(params: Value) -> Result<Self, Self::Error> {
        ensure_object(&params)?;
        let mut checks = Checks::default();

        let limit = checks.take_opt(params.optional_u64("limit"));
        if let Some(limit) = limit
            && !(1..=MAX_LIST_LIMIT).contains(&limit)
        {
            checks.push(ParameterValidationError::out_of_range(
                "limit",
                limit,
                format!("must be between 1 and {MAX_LIST_LIMIT}"),
            ));
        }

        let query = ListRequestsQuery {
            status: checks.take_opt(enum_value(
                &params,
                "status",
                RequestStatus::parse,
                RequestStatus::VALUES,
            )),
            priority: checks.take_opt(enum_value(
                &params,
                "priority",
                Priority::parse,
                Priority::VALUES,
            )),
            loop_id: checks
                .take_opt(params.optional_str("loop_id"))
                .map(str::to_string),
            limit,
            offset: checks.take_opt(params.optional_u64("offset")),
            sort: checks.take_opt(enum_value(
                &params,
                "sort",
                SortOrder::parse,
                SortOrder::VALUES,
            )),
        };

        checks.finish()?;
        Ok(Self { query })
    }
}

/// Validated parameters for tools addressing one request by id.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestIdParams {
    pub request_id: String,
}

impl TryFrom<Value> for RequestIdParams {
    type Error = ParameterValidationError;

    fn try_from(params: Value) -> Result<Self, Self::Error> {
        ensure_object(&params)?;
        Ok(Self {
            request_id: identifier(&params, "request_id", "provide the request id")?,
        })
    }
}

/// Validated parameters for `cancel_request`.
#[derive(Debug, Clone, PartialEq)]
pub struct CancelRequestParams {
    pub request_id: String,
    pub body: CancelRequest,
}

impl TryFrom<Value> for CancelRequestParams {
    type Error = ParameterValidationError;

    fn try_from(params: Value) -> Result<Self, Self::Error> {
        ensure_object(&params)?;
        let mut checks = Checks::default();

        let request_id = checks.take(identifier(
            &params,
            "request_id",
            "provide the request id",
        ));
        let reason = checks.take_opt(bounded_text(&params, "reason", 1, MAX_REASON_CHARS));

        checks.finish()?;
        match request_id {
            Some(request_id) => Ok(Self {
                request_id,
                body: CancelRequest { reason },
            }),
            None => Err(ParameterValidationError::missing(
                "request_id",
                "provide the request id",
            )),
        }
    }
}

/// Validated parameters for `update_request`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequestParams {
    pub request_id: String,
    pub updates: RequestUpdate,
}

impl TryFrom<Value> for UpdateRequestParams {
    type Error = ParameterValidationError;

    fn try_from(params: Value) -> Result<Self, Self::Error> {
        ensure_object(&params)?;
        let mut checks = Checks::default();

        let request_id = checks.take(identifier(
            &params,
            "request_id",
            "provide the request id",
        ));

        let updates = match params.optional_object("updates") {
            Ok(Some(map)) => {
                let fields = RequestFields::parse(&Value::Object(map.clone()), &mut checks);
                let updates = RequestUpdate {
                    processing_type: fields.processing_type,
                    content_type: fields.content_type,
                    priority: fields.priority,
                    request_text: fields.request_text,
                    image_url: fields.image_url,
                    context: fields.context,
                    timeout_seconds: fields.timeout_seconds,
                    response_type: fields.response_type,
                    response_config: fields.response_config,
                    default_response: fields.default_response,
                    callback_url: fields.callback_url,
                    platform: fields.platform,
                    platform_version: fields.platform_version,
                };
                let has_known_key = REQUEST_FIELDS
                    .iter()
                    .any(|key| map.get(*key).is_some_and(|v| !v.is_null()));
                if !has_known_key {
                    checks.push(ParameterValidationError::invalid_value(
                        "updates",
                        Value::Object(map.clone()).to_string(),
                        format!(
                            "provide at least one field to update ({})",
                            REQUEST_FIELDS.join(", ")
                        ),
                    ));
                }
                Some(updates)
            }
            Ok(None) => {
                checks.push(ParameterValidationError::missing(
                    "updates",
                    "provide at least one field to update",
                ));
                None
            }
            Err(e) => {
                checks.push(e);
                None
            }
        };

        checks.finish()?;
        match (request_id, updates) {
            (Some(request_id), Some(updates)) => Ok(Self {
                request_id,
                updates,
            }),
            _ => Err(ParameterValidationError::missing(
                "updates",
                "provide at least one field to update",
            )),
        }
    }
}

/// Validated parameters for `add_request_feedback`.
#[derive(Debug, Clone, PartialEq)]
pub struct AddFeedbackParams {
    pub request_id: String,
    pub feedback: Feedback,
}

/// Feedback keys with a typed meaning; anything else passes through.
const FEEDBACK_FIELDS: &[&str] = &[
    "rating",
    "comment",
    "accuracy",
    "timeliness",
    "helpfulness",
    "would_recommend",
    "category",
];

impl TryFrom<Value> for AddFeedbackParams {
    type Error = ParameterValidationError;

    fn try_from(params: Value) -> Result<Self, Self::Error> {
        ensure_object(&params)?;
        let mut checks = Checks::default();

        let request_id = checks.take(identifier(
            &params,
            "request_id",
            "provide the request id",
        ));

        let feedback = match params.optional_object("feedback") {
            Ok(Some(map)) if map.values().all(Value::is_null) => {
                checks.push(ParameterValidationError::invalid_value(
                    "feedback",
                    Value::Object(map.clone()).to_string(),
                    "provide at least one non-null field",
                ));
                None
            }
            Ok(Some(map)) => {
                let fb = Value::Object(map.clone());
                let extra: Map<String, Value> = map
                    .iter()
                    .filter(|(key, value)| {
                        !value.is_null() && !FEEDBACK_FIELDS.contains(&key.as_str())
                    })
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                Some(Feedback {
                    rating: checks.take_opt(score(&fb, "rating")),
                    comment: checks.take_opt(bounded_text(&fb, "comment", 0, MAX_COMMENT_CHARS)),
                    accuracy: checks.take_opt(score(&fb, "accuracy")),
                    timeliness: checks.take_opt(score(&fb, "timeliness")),
                    helpfulness: checks.take_opt(score(&fb, "helpfulness")),
                    would_recommend: checks.take_opt(fb.optional_bool("would_recommend")),
                    category: checks.take_opt(enum_value(
                        &fb,
                        "category",
                        FeedbackCategory::parse,
                        FeedbackCategory::VALUES,
                    )),
                    extra,
                })
            }
            Ok(None) => {
                checks.push(ParameterValidationError::missing(
                    "feedback",
                    "provide an object with at least one field",
                ));
                None
            }
            Err(e) => {
                checks.push(e);
                None
            }
        };

        checks.finish()?;
        match (request_id, feedback) {
            (Some(request_id), Some(feedback)) => Ok(Self {
                request_id,
                feedback,
            }),
            _ => Err(ParameterValidationError::missing(
                "feedback",
                "provide an object with at least one field",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_args() -> Value {
        json!({
            "loop_id": "loop_1",
            "processing_type": "deferred",
            "type": "markdown",
            "priority": "high",
            "request_text": "Review this",
            "response_type": "single_select",
            "response_config": {"options": ["A", "B"]}
        })
    }

    // ── create_request ──────────────────────────────────────────────────────

    #[test]
    fn test_create_request_valid_applies_platform_default() {
        let params = CreateRequestParams::try_from(create_args()).unwrap();
        assert_eq!(params.platform, None);

        let (loop_id, payload) = params.into_payload();
        assert_eq!(loop_id, "loop_1");
        assert_eq!(payload.platform, "api");
        assert_eq!(payload.priority, Priority::High);
        assert_eq!(payload.content_type, ContentType::Markdown);
        assert_eq!(payload.response_config["options"], json!(["A", "B"]));
    }

    #[test]
    fn test_create_request_keeps_explicit_platform() {
        let mut args = create_args();
        args["platform"] = json!("slack");
        let (_, payload) = CreateRequestParams::try_from(args).unwrap().into_payload();
        assert_eq!(payload.platform, "slack");
    }

    #[test]
    fn test_validation_is_pure() {
        let args = create_args();
        let first = CreateRequestParams::try_from(args.clone()).unwrap();
        let second = CreateRequestParams::try_from(args).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_time_sensitive_requires_timeout() {
        let mut args = create_args();
        args["processing_type"] = json!("time-sensitive");

        let err = CreateRequestParams::try_from(args.clone()).unwrap_err();
        assert_eq!(err.parameter_name(), Some("timeout_seconds"));

        args["timeout_seconds"] = json!(300);
        let params = CreateRequestParams::try_from(args).unwrap();
        assert_eq!(params.timeout_seconds, Some(300));
    }

    #[test]
    fn test_image_requires_image_url() {
        let mut args = create_args();
        args["type"] = json!("image");

        let err = CreateRequestParams::try_from(args.clone()).unwrap_err();
        assert_eq!(err.parameter_name(), Some("image_url"));

        args["image_url"] = json!("https://cdn.example.com/a.png");
        assert!(CreateRequestParams::try_from(args).is_ok());
    }

    #[test]
    fn test_image_url_must_be_http() {
        let mut args = create_args();
        args["type"] = json!("image");
        args["image_url"] = json!("ftp://example.com/a.png");

        let err = CreateRequestParams::try_from(args).unwrap_err();
        // Reported once as an invalid value, not again as missing
        assert_eq!(err.parameter_names(), vec!["image_url"]);
    }

    #[test]
    fn test_request_text_length_bounds() {
        let mut args = create_args();
        args["request_text"] = json!("");
        let err = CreateRequestParams::try_from(args.clone()).unwrap_err();
        assert_eq!(err.parameter_names(), vec!["request_text"]);

        args["request_text"] = json!("x".repeat(MAX_REQUEST_TEXT_CHARS));
        assert!(CreateRequestParams::try_from(args.clone()).is_ok());

        args["request_text"] = json!("x".repeat(MAX_REQUEST_TEXT_CHARS + 1));
        assert!(CreateRequestParams::try_from(args).is_err());
    }

    #[test]
    fn test_create_request_reports_every_violation() {
        let err = CreateRequestParams::try_from(json!({
            "processing_type": "urgent",
            "type": "markdown",
            "priority": "high",
            "request_text": "x",
            "response_type": "single_select"
        }))
        .unwrap_err();

        let names = err.parameter_names();
        assert!(names.contains(&"loop_id"));
        assert!(names.contains(&"processing_type"));
        assert!(names.contains(&"response_config"));
        assert!(err.to_string().contains("time-sensitive, deferred"));
    }

    #[test]
    fn test_wrong_field_type() {
        let mut args = create_args();
        args["response_config"] = json!(["A", "B"]);
        let err = CreateRequestParams::try_from(args).unwrap_err();
        assert!(matches!(
            err,
            ParameterValidationError::InvalidType {
                name: "response_config",
                ..
            }
        ));
    }

    #[test]
    fn test_arguments_must_be_object() {
        let err = CreateRequestParams::try_from(json!(["loop_1"])).unwrap_err();
        assert_eq!(err.parameter_name(), Some("arguments"));
        assert!(ListLoopsParams::try_from(Value::Null).is_ok());
        assert!(ListLoopsParams::try_from(json!({})).is_ok());
    }

    // ── list_requests ───────────────────────────────────────────────────────

    #[test]
    fn test_list_requests_all_optional() {
        let params = ListRequestsParams::try_from(json!({})).unwrap();
        assert_eq!(params.query, ListRequestsQuery::default());
    }

    #[test]
    fn test_list_requests_filters() {
        let params = ListRequestsParams::try_from(json!({
            "status": "pending",
            "priority": "critical",
            "loop_id": "loop_1",
            "limit": 100,
            "offset": 0,
            "sort": "priority_desc"
        }))
        .unwrap();
        assert_eq!(params.query.status, Some(RequestStatus::Pending));
        assert_eq!(params.query.limit, Some(100));
        assert_eq!(params.query.offset, Some(0));
        assert_eq!(params.query.sort, Some(SortOrder::PriorityDesc));
    }

    #[test]
    fn test_list_requests_limit_and_offset_bounds() {
        for limit in [0, 101] {
            let err = ListRequestsParams::try_from(json!({ "limit": limit })).unwrap_err();
            assert_eq!(err.parameter_name(), Some("limit"));
        }
        let err = ListRequestsParams::try_from(json!({ "offset": -1 })).unwrap_err();
        assert!(matches!(
            err,
            ParameterValidationError::OutOfRange { name: "offset", .. }
        ));
        let err = ListRequestsParams::try_from(json!({ "limit": 2.5 })).unwrap_err();
        assert!(matches!(
            err,
            ParameterValidationError::InvalidType { name: "limit", .. }
        ));
    }

    // ── get / delete / cancel ───────────────────────────────────────────────

    #[test]
    fn test_request_id_required() {
        let err = RequestIdParams::try_from(json!({})).unwrap_err();
        assert_eq!(err.parameter_name(), Some("request_id"));
        let err = RequestIdParams::try_from(json!({ "request_id": "  " })).unwrap_err();
        assert_eq!(err.parameter_name(), Some("request_id"));
        let ok = RequestIdParams::try_from(json!({ "request_id": "req_1" })).unwrap();
        assert_eq!(ok.request_id, "req_1");
    }

    #[test]
    fn test_cancel_reason_bounds() {
        let ok = CancelRequestParams::try_from(json!({ "request_id": "req_1" })).unwrap();
        assert_eq!(ok.body.reason, None);

        let ok = CancelRequestParams::try_from(json!({
            "request_id": "req_1",
            "reason": "no longer needed"
        }))
        .unwrap();
        assert_eq!(ok.body.reason.as_deref(), Some("no longer needed"));

        let err = CancelRequestParams::try_from(json!({ "request_id": "req_1", "reason": "" }))
            .unwrap_err();
        assert_eq!(err.parameter_name(), Some("reason"));

        let err = CancelRequestParams::try_from(json!({
            "request_id": "req_1",
            "reason": "x".repeat(MAX_REASON_CHARS + 1)
        }))
        .unwrap_err();
        assert_eq!(err.parameter_name(), Some("reason"));
    }

    // ── update_request ──────────────────────────────────────────────────────

    #[test]
    fn test_update_requires_at_least_one_field() {
        let err = UpdateRequestParams::try_from(json!({
            "request_id": "req_1",
            "updates": {}
        }))
        .unwrap_err();
        assert_eq!(err.parameter_name(), Some("updates"));
        assert!(err.to_string().contains("provide at least one field"));

        let err = UpdateRequestParams::try_from(json!({
            "request_id": "req_1",
            "updates": { "unknown": true }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("provide at least one field"));
    }

    #[test]
    fn test_update_checks_field_values() {
        let err = UpdateRequestParams::try_from(json!({
            "request_id": "req_1",
            "updates": { "priority": "urgent" }
        }))
        .unwrap_err();
        assert_eq!(err.parameter_name(), Some("priority"));

        let ok = UpdateRequestParams::try_from(json!({
            "request_id": "req_1",
            "updates": { "priority": "low", "request_text": "New text" }
        }))
        .unwrap();
        assert_eq!(ok.updates.priority, Some(Priority::Low));
        assert_eq!(ok.updates.request_text.as_deref(), Some("New text"));
        assert!(!ok.updates.is_empty());
    }

    #[test]
    fn test_update_missing_updates() {
        let err = UpdateRequestParams::try_from(json!({ "request_id": "req_1" })).unwrap_err();
        assert_eq!(err.parameter_name(), Some("updates"));
    }

    // ── add_request_feedback ────────────────────────────────────────────────

    #[test]
    fn test_feedback_requires_a_key() {
        let err = AddFeedbackParams::try_from(json!({
            "request_id": "req_1",
            "feedback": {}
        }))
        .unwrap_err();
        assert_eq!(err.parameter_name(), Some("feedback"));
    }

    #[test]
    fn test_feedback_with_only_null_fields_is_empty() {
        let err = AddFeedbackParams::try_from(json!({
            "request_id": "req_1",
            "feedback": { "rating": null, "note": null }
        }))
        .unwrap_err();
        assert_eq!(err.parameter_name(), Some("feedback"));

        let params = AddFeedbackParams::try_from(json!({
            "request_id": "req_1",
            "feedback": { "rating": 4, "note": null }
        }))
        .unwrap();
        assert_eq!(params.feedback.rating, Some(4));
        assert!(params.feedback.extra.is_empty());
    }

    #[test]
    fn test_feedback_recognized_and_extra_fields() {
        let params = AddFeedbackParams::try_from(json!({
            "request_id": "req_1",
            "feedback": {
                "rating": 5,
                "comment": "Fast and accurate",
                "would_recommend": true,
                "category": "positive",
                "reviewer_tag": "night-shift"
            }
        }))
        .unwrap();

        assert_eq!(params.feedback.rating, Some(5));
        assert_eq!(params.feedback.would_recommend, Some(true));
        assert_eq!(params.feedback.category, Some(FeedbackCategory::Positive));
        assert_eq!(params.feedback.extra["reviewer_tag"], "night-shift");
        assert!(!params.feedback.extra.contains_key("rating"));
    }

    #[test]
    fn test_feedback_score_bounds() {
        for bad in [json!(0), json!(6), json!(-1)] {
            let err = AddFeedbackParams::try_from(json!({
                "request_id": "req_1",
                "feedback": { "accuracy": bad }
            }))
            .unwrap_err();
            assert_eq!(err.parameter_name(), Some("accuracy"));
        }

        let err = AddFeedbackParams::try_from(json!({
            "request_id": "req_1",
            "feedback": { "comment": "x".repeat(MAX_COMMENT_CHARS + 1) }
        }))
        .unwrap_err();
        assert_eq!(err.parameter_name(), Some("comment"));
    }
}
