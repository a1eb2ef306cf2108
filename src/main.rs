use actix_cors::Cors;
use actix_web::{self, http::header, middleware::Logger, web, App, HttpServer};
use std::sync::Arc;

use crate::{
    configs::{connect_database, AuthConfig},
    modules::{
        media::FfmpegProcessor,
        storage::{AssetStore, S3Storage},
        video::{VideoConfig, VideoRepositoryPg, VideoService},
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let env = constants::Env::load().map_err(|e| std::io::Error::other(e.to_string()))?;
    log::info!("Environment variables loaded");

    let db_pool = connect_database(&env.database_url)
        .await
        .map_err(|_| std::io::Error::other("Database connection error"))?;

    let storage = S3Storage::new(&env.s3_region).await;
    let media = FfmpegProcessor::new(&env.ffmpeg_path, &env.ffprobe_path);
    let assets = AssetStore::new(&env.assets_root, &env.public_base_url);
    tokio::fs::create_dir_all(assets.root()).await?;
    log::info!("Serving assets from {}", assets.root().display());

    let video_service = VideoService::with_dependencies(
        Arc::new(VideoRepositoryPg::new(db_pool)),
        Arc::new(storage),
        Arc::new(media),
        assets.clone(),
        VideoConfig::from(&env),
    );
    let auth_config = AuthConfig::new(env.jwt_secret.clone());
    let frontend_url = env.frontend_url.clone();

    log::info!("Starting server at http://{}:{}", env.ip, env.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(auth_config.clone()))
            .app_data(web::Data::new(video_service.clone()))
            .app_data(web::Data::new(assets.clone()))
            .service(health_check)
            .configure(modules::assets::route::configure)
            .service(web::scope("/api").configure(modules::video::route::configure))
    })
    .bind((env.ip.as_str(), env.port))?
    .workers(2)
    .run()
    .await
}
