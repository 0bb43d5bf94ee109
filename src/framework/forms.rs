// Form validation - explicit per-entity validators
//
// Each validator returns either the bound, typed value or a FormErrors map
// from field name to messages. Handlers re-render (posts) or ignore
// (comments) the errors; storage failures travel separately as AppError.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::error::AppResult;
use crate::infrastructure::database::BlogStore;
use crate::infrastructure::media;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.@+-]{1,150}$").expect("username pattern"));
static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,50}$").expect("slug pattern"));

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

/// Field name -> error messages, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Submitted text fields and file parts
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: HashMap<String, String>) -> Self {
        Self {
            fields,
            files: HashMap::new(),
        }
    }

    pub fn insert_field(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_string(), value.to_string());
    }

    pub fn insert_file(&mut self, name: &str, file: UploadedFile) {
        self.files.insert(name.to_string(), file);
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }
}

/// A validated post submission
#[derive(Debug, Clone)]
pub struct PostForm {
    pub text: String,
    pub group_id: Option<i64>,
    /// Verified to decode as an image
    pub image: Option<UploadedFile>,
}

/// A validated comment submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentForm {
    pub text: String,
}

fn required_text(data: &FormData, field: &str, errors: &mut FormErrors) -> String {
    match data.field(field).map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => {
            errors.add(field, REQUIRED);
            String::new()
        }
    }
}

/// Validate `text`, `group` and `image` of a post submission
pub async fn validate_post_form(
    data: &FormData,
    store: &dyn BlogStore,
) -> AppResult<Result<PostForm, FormErrors>> {
    let mut errors = FormErrors::new();

    let text = required_text(data, "text", &mut errors);

    let group_id = match data.field("group").map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let existing = match raw.parse::<i64>() {
                Ok(id) => store.group_by_id(id).await?.map(|group| group.id),
                Err(_) => None,
            };
            if existing.is_none() {
                errors.add("group", INVALID_CHOICE);
            }
            existing
        }
    };

    let image = match data.file("image") {
        Some(file) if !file.data.is_empty() => {
            if media::verify_image(file.data.clone()).await? {
                Some(file.clone())
            } else {
                errors.add("image", INVALID_IMAGE);
                None
            }
        }
        _ => None,
    };

    Ok(errors.into_result(PostForm {
        text,
        group_id,
        image,
    }))
}

/// Validate the `text` of a comment submission
pub fn validate_comment_form(data: &FormData) -> Result<CommentForm, FormErrors> {
    let mut errors = FormErrors::new();
    let text = required_text(data, "text", &mut errors);
    errors.into_result(CommentForm { text })
}
