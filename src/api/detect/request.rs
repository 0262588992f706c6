// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Currency detection request

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::api::errors::ApiError;
use crate::vision::{ImageError, VisionError};

/// Message returned when the `image` field is absent
pub const NO_IMAGE_PROVIDED: &str = "No image provided";

/// Body of `POST /detect`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectRequest {
    /// Base64-encoded image data
    ///
    /// `None` only when the key is absent; a present `null` or non-string
    /// value is kept so it can be reported as a processing failure.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<Value>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl DetectRequest {
    /// Take the image field as base64 text
    ///
    /// An absent key is a client error; a value that is not a string fails
    /// like any other undecodable payload. A present but empty string is
    /// passed on and fails at decode time.
    pub fn into_image(self) -> Result<String, ApiError> {
        match self.image {
            None => Err(ApiError::MissingField(NO_IMAGE_PROVIDED.to_string())),
            Some(Value::String(data)) => Ok(data),
            Some(other) => Err(ApiError::from(VisionError::from(ImageError::InvalidPayload(
                format!("expected a base64 string, got {}", json_kind(&other)),
            )))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
