pub mod classes;
pub mod health;
pub mod students;

use crate::notice::Notice;
use actix_web::http::header;
use actix_web::{HttpResponse, web};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(students::list))
        .route("/create", web::get().to(students::create_form))
        .route("/create", web::post().to(students::create))
        .route("/view/{id}", web::get().to(students::view))
        .route("/edit/{id}", web::get().to(students::edit_form))
        .route("/edit/{id}", web::post().to(students::edit))
        .route("/delete/{id}", web::post().to(students::delete))
        .route("/classes", web::get().to(classes::list))
        .route("/classes", web::post().to(classes::create))
        .route("/classes/delete/{id}", web::post().to(classes::delete))
        .route("/health", web::get().to(health::health_check));
}

/// 303 to `location`, carrying any notices in the body.
pub fn see_other(location: &str, notices: Vec<Notice>) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, location))
        .json(serde_json::json!({ "notices": notices }))
}
