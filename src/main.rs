use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use roster::config::Config;
use roster::db::Db;
use roster::routes;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Init logger to show info by default, but can be overridden by RUST_LOG
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cfg = Config::from_env_config()?;

    let db = Db::connect_and_migrate(&cfg.database_path)
        .await
        .context("database init failed")?;
    let uploads = cfg.upload_dir();

    log::info!("Starting server at {}", cfg.listen);
    log::info!("Storing uploads in {}", uploads.root().display());

    let listen_addr = cfg.listen.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(Data::new(cfg.clone()))
            .app_data(Data::new(db.clone()))
            .app_data(Data::new(uploads.clone()))
            .configure(routes::configure)
    })
    .bind(&listen_addr)
    .with_context(|| format!("failed to bind {listen_addr}"))?
    .run()
    .await?;
    Ok(())
}
