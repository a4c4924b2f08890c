//! Property listing input: details, photo group modes, and admission validation.
//!
//! Pure functions shared by the admission gate (synchronous, request path)
//! and the pipeline (narration prompt building).

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Title marker that switches clip synthesis to pre-recorded placeholder clips.
pub const TEST_MODE_MARKER: &str = "[TEST]";

/// Maximum number of photo groups accepted in one request.
pub const MAX_PHOTO_GROUPS: usize = 12;

/// Maximum title length (characters).
const MAX_TITLE_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Property details
// ---------------------------------------------------------------------------

/// Serialized property description submitted alongside the photos.
///
/// Numeric-looking fields (`price`, `size`, `beds`, ...) are accepted as
/// either JSON strings or JSON numbers and normalised to strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub size: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub beds: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub baths: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub floor: Option<String>,
    #[serde(default)]
    pub extras: Vec<String>,
}

impl PropertyDetails {
    /// Whether the title carries the [`TEST_MODE_MARKER`].
    pub fn is_test_mode(&self) -> bool {
        self.title.contains(TEST_MODE_MARKER)
    }

    /// Render the known facts as `key: value` lines for prompt building.
    ///
    /// Only fields that are present are emitted, so the narration model is
    /// never shown a placeholder it could mistake for a fact.
    pub fn fact_sheet(&self) -> String {
        let mut lines = vec![
            format!("Title: {}", self.title.replace(TEST_MODE_MARKER, "").trim()),
            format!("Price: {}", self.price),
            format!("Location: {}", self.location),
        ];
        let optional = [
            ("Size", &self.size),
            ("Bedrooms", &self.beds),
            ("Bathrooms", &self.baths),
            ("Floor", &self.floor),
        ];
        for (label, value) in optional {
            if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                lines.push(format!("{label}: {v}"));
            }
        }
        if !self.extras.is_empty() {
            lines.push(format!("Extras: {}", self.extras.join(", ")));
        }
        lines.join("\n")
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string_or_number(deserializer)?.unwrap_or_default())
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Photo groups
// ---------------------------------------------------------------------------

/// How the images of one photo group drive clip synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoGroupMode {
    /// One image, simple pan/zoom.
    Single,
    /// Two images used as start and end keyframes.
    Keyframes,
}

impl PhotoGroupMode {
    /// Number of images a group in this mode must carry.
    pub fn expected_images(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Keyframes => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a generation request before any credit is touched.
///
/// `groups` pairs each group's declared mode with the number of images
/// actually uploaded for it.
pub fn validate_request(
    property: &PropertyDetails,
    groups: &[(PhotoGroupMode, usize)],
) -> Result<(), CoreError> {
    require_non_empty("title", &property.title)?;
    require_non_empty("price", &property.price)?;
    require_non_empty("location", &property.location)?;

    if property.title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "title must not exceed {MAX_TITLE_LEN} characters"
        )));
    }

    if groups.is_empty() {
        return Err(CoreError::Validation(
            "At least one photo group is required".into(),
        ));
    }
    if groups.len() > MAX_PHOTO_GROUPS {
        return Err(CoreError::Validation(format!(
            "At most {MAX_PHOTO_GROUPS} photo groups are allowed"
        )));
    }

    for (index, (mode, count)) in groups.iter().enumerate() {
        if *count == 0 {
            return Err(CoreError::Validation(format!(
                "Photo group {index} has no images"
            )));
        }
        if *count != mode.expected_images() {
            return Err(CoreError::Validation(format!(
                "Photo group {index} in {mode:?} mode needs {} image(s), got {count}",
                mode.expected_images()
            )));
        }
    }

    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        Err(CoreError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
