use crate::{db::Db, errors::ApiError, store};
use crate::models::class::{Class, ClassOrder};
use crate::notice::Notice;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use super::see_other;

#[derive(Serialize)]
struct ClassesPage {
    classes: Vec<Class>,
    notices: Vec<Notice>,
}

#[derive(Deserialize)]
pub struct CreateClassReq {
    #[serde(default)]
    pub name: String,
}

pub async fn list(db: web::Data<Db>) -> Result<HttpResponse, ApiError> {
    page(&db, StatusCode::OK, Vec::new()).await
}

pub async fn create(
    db: web::Data<Db>,
    form: web::Form<CreateClassReq>,
) -> Result<HttpResponse, ApiError> {
    match store::create_class(&db, &form.name).await {
        Ok(_) => Ok(see_other("/classes", Vec::new())),
        Err(ApiError::Validation(message)) => {
            page(&db, StatusCode::UNPROCESSABLE_ENTITY, vec![Notice::error(message)]).await
        }
        Err(e) => Err(e),
    }
}

pub async fn delete(db: web::Data<Db>, path: web::Path<i64>) -> Result<HttpResponse, ApiError> {
    store::delete_class(&db, path.into_inner()).await?;
    Ok(see_other("/classes", Vec::new()))
}

async fn page(db: &Db, status: StatusCode, notices: Vec<Notice>) -> Result<HttpResponse, ApiError> {
    let classes = store::list_classes(db, ClassOrder::NewestFirst).await?;
    Ok(HttpResponse::build(status).json(ClassesPage { classes, notices }))
}
