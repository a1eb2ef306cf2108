use actix_web::{get, web, HttpResponse};

use crate::{api::error, modules::storage::AssetStore};

#[get("/assets/{filename}")]
pub async fn get_asset(
    assets: web::Data<AssetStore>,
    filename: web::Path<String>,
) -> Result<HttpResponse, error::Error> {
    let path = assets.resolve(&filename).ok_or_else(|| error::Error::not_found("Asset not found"))?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(error::Error::not_found("Asset not found"));
        }
        Err(e) => return Err(error::SystemError::from(e).into()),
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok(HttpResponse::Ok()
        .content_type(mime.as_ref())
        .insert_header(("Cache-Control", "no-store"))
        .body(bytes))
}
