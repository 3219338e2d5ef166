use crate::{config::Config, db::Db, errors::ApiError, store};
use crate::models::class::{Class, ClassOrder};
use crate::models::student::{Student, StudentFields, StudentListing};
use crate::notice::Notice;
use crate::upload::{UploadDir, UploadedImage};
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use futures_util::TryStreamExt as _;
use serde::Serialize;

use super::see_other;

#[derive(Serialize)]
struct StudentList {
    students: Vec<StudentListing>,
}

#[derive(Serialize)]
struct StudentFormPage {
    student: Option<Student>,
    classes: Vec<Class>,
    notices: Vec<Notice>,
}

struct Submission {
    fields: StudentFields,
    image: Option<UploadedImage>,
}

pub async fn list(db: web::Data<Db>) -> Result<HttpResponse, ApiError> {
    let students = store::list_students_with_class(&db).await?;
    Ok(HttpResponse::Ok().json(StudentList { students }))
}

pub async fn create_form(db: web::Data<Db>) -> Result<HttpResponse, ApiError> {
    form_page(&db, None, StatusCode::OK, Vec::new()).await
}

pub async fn create(
    cfg: web::Data<Config>,
    db: web::Data<Db>,
    uploads: web::Data<UploadDir>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let submission = read_submission(payload, cfg.max_upload_size).await?;
    if let Err(ApiError::Validation(message)) = submission.fields.validate() {
        return form_page(&db, None, StatusCode::UNPROCESSABLE_ENTITY, vec![Notice::error(message)])
            .await;
    }

    let mut notices = Vec::new();
    let stored = match &submission.image {
        Some(image) => Some(uploads.store(image)?),
        None => None,
    };
    notices.extend(stored.as_ref().map(|s| s.notice()));

    let filename = stored.as_ref().and_then(|s| s.filename());
    store::create_student(&db, &submission.fields, filename).await?;
    Ok(see_other("/", notices))
}

pub async fn view(db: web::Data<Db>, path: web::Path<i64>) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let student = store::get_student_detail(&db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(student))
}

pub async fn edit_form(db: web::Data<Db>, path: web::Path<i64>) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let student = store::get_student(&db, id).await?.ok_or(ApiError::NotFound)?;
    form_page(&db, Some(student), StatusCode::OK, Vec::new()).await
}

pub async fn edit(
    cfg: web::Data<Config>,
    db: web::Data<Db>,
    uploads: web::Data<UploadDir>,
    path: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let current = store::get_student(&db, id).await?.ok_or(ApiError::NotFound)?;

    let submission = read_submission(payload, cfg.max_upload_size).await?;
    if let Err(ApiError::Validation(message)) = submission.fields.validate() {
        return form_page(
            &db,
            Some(current),
            StatusCode::UNPROCESSABLE_ENTITY,
            vec![Notice::error(message)],
        )
        .await;
    }

    let mut notices = Vec::new();
    let stored = match &submission.image {
        Some(image) => Some(uploads.store(image)?),
        None => None,
    };
    notices.extend(stored.as_ref().map(|s| s.notice()));

    let filename = stored.as_ref().and_then(|s| s.filename());
    if !store::update_student(&db, id, &submission.fields, filename).await? {
        // deleted between the lookup and the update
        return Err(ApiError::NotFound);
    }
    Ok(see_other("/", notices))
}

pub async fn delete(
    db: web::Data<Db>,
    uploads: web::Data<UploadDir>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let deleted = store::delete_student(&db, &uploads, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let notices = deleted.image.iter().map(|r| r.notice()).collect();
    Ok(see_other("/", notices))
}

async fn form_page(
    db: &Db,
    student: Option<Student>,
    status: StatusCode,
    notices: Vec<Notice>,
) -> Result<HttpResponse, ApiError> {
    let classes = store::list_classes(db, ClassOrder::Insertion).await?;
    Ok(HttpResponse::build(status).json(StudentFormPage { student, classes, notices }))
}

async fn read_submission(mut payload: Multipart, limit: usize) -> Result<Submission, ApiError> {
    let mut fields = StudentFields::default();
    let mut image = None;
    let mut total = 0usize;
    let mut saw_email = false;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|_| ApiError::BadRequest("invalid multipart".into()))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|s| s.to_string()));

        let mut data: Vec<u8> = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|_| ApiError::BadRequest("upload read error".into()))?
        {
            total += chunk.len();
            if total > limit {
                return Err(ApiError::PayloadTooLarge);
            }
            data.extend_from_slice(&chunk);
        }

        match field_name.as_str() {
            "name" => fields.name = text(&field_name, data)?,
            "email" => {
                fields.email = text(&field_name, data)?;
                saw_email = true;
            }
            "address" => fields.address = Some(text(&field_name, data)?),
            "class_id" => fields.class_id = parse_class_id(&text(&field_name, data)?)?,
            // browsers send an empty filename when no file was picked
            "image" => {
                if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                    image = Some(UploadedImage { filename, data });
                }
            }
            other => log::debug!("ignoring form field {other:?}"),
        }
    }

    // an empty email is accepted, a form without the field is not
    if !saw_email {
        return Err(ApiError::BadRequest("missing email".into()));
    }
    Ok(Submission { fields, image })
}

fn text(name: &str, data: Vec<u8>) -> Result<String, ApiError> {
    String::from_utf8(data).map_err(|_| ApiError::BadRequest(format!("invalid {name}")))
}

fn parse_class_id(raw: &str) -> Result<Option<i64>, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| ApiError::BadRequest("invalid class_id".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_id_parsing() {
        assert_eq!(parse_class_id("3").unwrap(), Some(3));
        assert_eq!(parse_class_id(" 12 ").unwrap(), Some(12));
        assert_eq!(parse_class_id("").unwrap(), None);
        assert!(matches!(parse_class_id("seven"), Err(ApiError::BadRequest(_))));
    }
}
