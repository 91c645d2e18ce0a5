use crate::helper::sanitization_helpers::strip_all_html;
use crate::helper::storage_helpers::UploadedFile;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::StreamExt;
use std::collections::HashMap;
use thiserror::Error;
use url::form_urlencoded;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("File is too large. Maximum size is {limit_mb}MB.")]
    TooLarge { limit_mb: u64 },
    #[error("Invalid UTF-8 in form field '{0}'.")]
    InvalidUtf8(String),
    #[error("Invalid date '{0}'. Use YYYY-MM-DD or an RFC 3339 timestamp.")]
    InvalidDate(String),
    #[error("Malformed multipart body: {0}")]
    Multipart(String),
    #[error("Unsupported file type '{0}'. Please upload a PNG or JPG image.")]
    UnsupportedFileType(String),
}

/// Logos are small raster images.
pub const LOGO_MAX_BYTES: u64 = 5 * 1024 * 1024;
const LOGO_CONTENT_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/jpg"];

/// Parses URL-encoded form data from bytes, handling potential UTF-8 errors gracefully.
pub fn parse_form(form_bytes: &web::Bytes) -> Result<HashMap<String, String>, HttpResponse> {
    let body = match String::from_utf8(form_bytes.to_vec()) {
        Ok(s) => s,
        Err(_) => return Err(HttpResponse::BadRequest().body("Invalid UTF-8 in request body.")),
    };
    Ok(form_urlencoded::parse(body.as_bytes()).into_owned().collect())
}

/// Text fields and file parts of one multipart submission.
#[derive(Debug, Default, Clone)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.trim())
    }

    /// `None` when the field was not sent, `Some(None)` when it was sent
    /// blank, `Some(Some(v))` otherwise.
    pub fn optional_text(&self, name: &str) -> Option<Option<String>> {
        self.text(name).map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
    }

    /// `None` when the field was not sent. Browsers leave unticked
    /// checkboxes out entirely, so whole-form updates read `None` as false.
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.text(name)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "on" | "true" | "1" | "yes"))
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

/// Buffers a multipart body. File parts larger than `max_bytes` abort the
/// read; file inputs left empty by the browser are skipped.
pub async fn read_multipart(
    mut payload: Multipart,
    max_bytes: u64,
) -> Result<MultipartForm, FormError> {
    let limit_mb = max_bytes / (1024 * 1024);
    let mut form = MultipartForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| FormError::Multipart(e.to_string()))?;
        let field_name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();
        let file_name = field.content_disposition().get_filename().map(str::to_string);
        let content_type = field.content_type().map(|mime| mime.to_string());

        let mut data: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| FormError::Multipart(e.to_string()))?;
            if (data.len() + chunk.len()) as u64 > max_bytes {
                return Err(FormError::TooLarge { limit_mb });
            }
            data.extend_from_slice(&chunk);
        }

        match file_name {
            Some(file_name) => {
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                let upload = UploadedFile {
                    file_name,
                    content_type: content_type
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                    bytes: data,
                };
                form.files.insert(field_name, upload);
            }
            None => {
                let value = String::from_utf8(data)
                    .map_err(|_| FormError::InvalidUtf8(field_name.clone()))?;
                form.fields.insert(field_name, value);
            }
        }
    }

    Ok(form)
}

/// Fails with every required field that is absent or blank, in order.
pub fn require_fields(
    fields: &HashMap<String, String>,
    required: &[&str],
) -> Result<(), FormError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| fields.get(**name).map_or(true, |v| v.trim().is_empty()))
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(FormError::MissingFields(missing))
    }
}

fn parse_date(form: &MultipartForm) -> Result<Option<DateTime<Utc>>, FormError> {
    let Some(raw) = form.text("date").filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(stamp.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| Some(midnight.and_utc()))
        .ok_or_else(|| FormError::InvalidDate(raw.to_string()))
}

// --- Manager forms ---

#[derive(Debug, Clone, PartialEq)]
pub struct NewsForm {
    pub title: String,
    pub content: String,
    pub published: Option<bool>,
    pub author: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub featured_image: Option<Option<String>>,
    pub image: Option<UploadedFile>,
}

impl NewsForm {
    pub fn from_multipart(mut form: MultipartForm) -> Result<Self, FormError> {
        require_fields(&form.fields, &["title", "content"])?;
        Ok(Self {
            title: strip_all_html(form.text("title").unwrap_or_default()),
            content: form.fields.get("content").cloned().unwrap_or_default(),
            published: form.flag("published"),
            author: form.text("author").filter(|v| !v.is_empty()).map(strip_all_html),
            date: parse_date(&form)?,
            featured_image: form.optional_text("featuredImage"),
            image: form.take_file("image"),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: Option<DateTime<Utc>>,
    pub file_url: Option<Option<String>>,
    pub external_url: Option<Option<String>>,
    pub file: Option<UploadedFile>,
}

impl ResourceForm {
    pub fn from_multipart(mut form: MultipartForm) -> Result<Self, FormError> {
        require_fields(&form.fields, &["title", "description", "category"])?;
        Ok(Self {
            title: strip_all_html(form.text("title").unwrap_or_default()),
            description: form.fields.get("description").cloned().unwrap_or_default(),
            category: form.text("category").unwrap_or_default().to_string(),
            date: parse_date(&form)?,
            file_url: form.optional_text("fileUrl"),
            external_url: form.optional_text("externalUrl"),
            file: form.take_file("file"),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollaboratorForm {
    pub name: String,
    pub description: String,
    pub logo_url: Option<Option<String>>,
    pub website_url: Option<Option<String>>,
    pub featured: Option<bool>,
    pub logo: Option<UploadedFile>,
}

impl CollaboratorForm {
    pub fn from_multipart(mut form: MultipartForm) -> Result<Self, FormError> {
        require_fields(&form.fields, &["name", "description"])?;
        let logo = form.take_file("logo").map(check_logo).transpose()?;
        Ok(Self {
            name: strip_all_html(form.text("name").unwrap_or_default()),
            description: form.fields.get("description").cloned().unwrap_or_default(),
            logo_url: form.optional_text("logoUrl"),
            website_url: form.optional_text("websiteUrl"),
            featured: form.flag("featured"),
            logo,
        })
    }
}

fn check_logo(file: UploadedFile) -> Result<UploadedFile, FormError> {
    let content_type = file.content_type.to_ascii_lowercase();
    if !LOGO_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(FormError::UnsupportedFileType(file.content_type));
    }
    if file.bytes.len() as u64 > LOGO_MAX_BYTES {
        return Err(FormError::TooLarge { limit_mb: LOGO_MAX_BYTES / (1024 * 1024) });
    }
    Ok(file)
}
