//! Queries over the `classes` and `students` tables.
//!
//! Every function borrows a pooled connection for its own duration only.
//! Image files are written by the caller before a student row is inserted or
//! updated, so a failure between the two leaves an unreferenced file behind.

use crate::db::Db;
use crate::errors::ApiError;
use crate::models::class::{Class, ClassOrder};
use crate::models::student::{Student, StudentDetail, StudentFields, StudentListing};
use crate::upload::{Removal, UploadDir};
use chrono::Utc;

/// What `delete_student` did with the row's image, if it had one.
#[derive(Debug)]
pub struct DeletedStudent {
    pub image: Option<Removal>,
}

pub async fn list_students_with_class(db: &Db) -> Result<Vec<StudentListing>, ApiError> {
    let rows = sqlx::query_as::<_, StudentListing>(
        "SELECT s.id, s.name, s.email, s.created_at, c.name AS class_name, s.image
         FROM students s
         LEFT JOIN classes c ON c.id = s.class_id
         ORDER BY s.created_at DESC, s.id DESC",
    )
    .fetch_all(&db.0)
    .await?;
    Ok(rows)
}

pub async fn list_classes(db: &Db, order: ClassOrder) -> Result<Vec<Class>, ApiError> {
    let sql = match order {
        ClassOrder::Insertion => "SELECT id, name, created_at FROM classes ORDER BY id ASC",
        ClassOrder::NewestFirst => {
            "SELECT id, name, created_at FROM classes ORDER BY created_at DESC, id DESC"
        }
    };
    let classes = sqlx::query_as::<_, Class>(sql).fetch_all(&db.0).await?;
    Ok(classes)
}

pub async fn get_student(db: &Db, id: i64) -> Result<Option<Student>, ApiError> {
    let student = sqlx::query_as::<_, Student>(
        "SELECT id, name, email, address, class_id, image, created_at FROM students WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&db.0)
    .await?;
    Ok(student)
}

pub async fn get_student_detail(db: &Db, id: i64) -> Result<Option<StudentDetail>, ApiError> {
    let detail = sqlx::query_as::<_, StudentDetail>(
        "SELECT s.id, s.name, s.email, s.address, s.created_at, s.class_id, c.name AS class_name, s.image
         FROM students s
         LEFT JOIN classes c ON c.id = s.class_id
         WHERE s.id = ?",
    )
    .bind(id)
    .fetch_optional(&db.0)
    .await?;
    Ok(detail)
}

pub async fn create_student(
    db: &Db,
    fields: &StudentFields,
    image: Option<&str>,
) -> Result<i64, ApiError> {
    fields.validate()?;
    let res = sqlx::query(
        "INSERT INTO students (name, email, address, class_id, image, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&fields.name)
    .bind(&fields.email)
    .bind(&fields.address)
    .bind(fields.class_id)
    .bind(image)
    .bind(Utc::now())
    .execute(&db.0)
    .await?;
    let id = res.last_insert_rowid();
    log::info!("created student {id}");
    Ok(id)
}

/// Overwrites every editable field. `image` replaces the stored filename only
/// when `Some`; otherwise the current image stays. Returns false if no such row.
pub async fn update_student(
    db: &Db,
    id: i64,
    fields: &StudentFields,
    image: Option<&str>,
) -> Result<bool, ApiError> {
    fields.validate()?;
    let res = sqlx::query(
        "UPDATE students SET name = ?, email = ?, address = ?, class_id = ?, image = COALESCE(?, image)
         WHERE id = ?",
    )
    .bind(&fields.name)
    .bind(&fields.email)
    .bind(&fields.address)
    .bind(fields.class_id)
    .bind(image)
    .bind(id)
    .execute(&db.0)
    .await?;
    if res.rows_affected() == 0 {
        return Ok(false);
    }
    log::info!("updated student {id}");
    Ok(true)
}

/// Deletes the row, then removes its image once the delete is committed.
pub async fn delete_student(
    db: &Db,
    uploads: &UploadDir,
    id: i64,
) -> Result<Option<DeletedStudent>, ApiError> {
    let mut tx = db.0.begin().await?;
    let image: Option<Option<String>> = sqlx::query_scalar("SELECT image FROM students WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(image) = image else {
        return Ok(None);
    };
    sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    log::info!("deleted student {id}");

    let image = match image {
        Some(name) => Some(uploads.remove(&name)?),
        None => None,
    };
    Ok(Some(DeletedStudent { image }))
}

pub async fn create_class(db: &Db, name: &str) -> Result<Class, ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("Class name is required!".into()));
    }
    let created_at = Utc::now();
    let res = sqlx::query("INSERT INTO classes (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(created_at)
        .execute(&db.0)
        .await?;
    let class = Class { id: res.last_insert_rowid(), name: name.to_string(), created_at };
    log::info!("created class {} ({})", class.id, class.name);
    Ok(class)
}

/// Refuses to delete a class while any student still points at it.
pub async fn delete_class(db: &Db, id: i64) -> Result<(), ApiError> {
    let referenced: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE class_id = ?")
        .bind(id)
        .fetch_one(&db.0)
        .await?;
    if referenced > 0 {
        return Err(ApiError::Conflict(format!(
            "class {id} still has {referenced} student(s)"
        )));
    }

    let res = sqlx::query("DELETE FROM classes WHERE id = ?")
        .bind(id)
        .execute(&db.0)
        .await
        .map_err(|e| {
            if let Some(err) = e.as_database_error() {
                if err.is_foreign_key_violation() {
                    return ApiError::Conflict(format!("class {id} is still referenced"));
                }
            }
            ApiError::from(e)
        })?;

    if res.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }
    log::info!("deleted class {id}");
    Ok(())
}
