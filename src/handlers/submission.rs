// Form submissions - multipart (with files) or urlencoded bodies

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use std::collections::HashMap;

use crate::error::AppError;
use crate::framework::forms::{FormData, UploadedFile};

/// Submitted form fields. Requests without a form body yield empty data,
/// which the validators then reject field by field.
#[derive(Debug, Clone, Default)]
pub struct FormSubmission(pub FormData);

impl<S> FromRequest<S> for FormSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            read_multipart(multipart).await.map(FormSubmission)
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(FormSubmission(FormData::from_fields(fields)))
        } else {
            Ok(FormSubmission::default())
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<FormData, AppError> {
    let mut data = FormData::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                // Browsers send an empty part when no file was chosen
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                data.insert_file(
                    &name,
                    UploadedFile {
                        file_name,
                        content_type,
                        data: bytes.to_vec(),
                    },
                );
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                data.insert_field(&name, &text);
            }
        }
    }

    Ok(data)
}
