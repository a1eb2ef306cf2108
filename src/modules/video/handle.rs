use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{delete, error::PayloadError, get, post, web, HttpRequest};
use futures_util::{Stream, StreamExt, TryStreamExt};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::{
    api::{error, success},
    constants::MAX_THUMBNAIL_SIZE,
    middlewares::{authenticate, get_claims},
    modules::video::{
        model::CreateVideoModel,
        schema::VideoEntity,
        service::{VideoService, VIDEO_CONTENT_TYPE},
    },
    utils::ValidatedJson,
};

const THUMBNAIL_CONTENT_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

fn parse_video_id(raw: &str) -> Result<Uuid, error::Error> {
    Uuid::parse_str(raw).map_err(|_| error::Error::bad_request("Invalid ID"))
}

fn form_error(err: MultipartError, message: &'static str) -> error::Error {
    match err {
        MultipartError::Payload(PayloadError::Overflow) => {
            error::Error::bad_request("Request body too large")
        }
        _ => error::Error::bad_request(message),
    }
}

/// Fails the body with `PayloadError::Overflow` once more than `limit` bytes
/// have been read, multipart framing and skipped fields included.
fn limit_body<S>(body: S, limit: usize) -> impl Stream<Item = Result<web::Bytes, PayloadError>>
where
    S: Stream<Item = Result<web::Bytes, PayloadError>>,
{
    let mut seen = 0usize;
    body.map(move |chunk| {
        let chunk = chunk?;
        seen += chunk.len();
        if seen > limit {
            return Err(PayloadError::Overflow);
        }
        Ok(chunk)
    })
}

/// Advances the form to the field called `name`, skipping any others.
async fn find_field(payload: &mut Multipart, name: &str) -> Result<Field, error::Error> {
    while let Some(field) =
        payload.try_next().await.map_err(|e| form_error(e, "Unable to parse form"))?
    {
        if field.content_disposition().and_then(|cd| cd.get_name()) == Some(name) {
            return Ok(field);
        }
    }
    Err(error::Error::bad_request(format!("Missing form file '{name}'")))
}

/// Base media type of the field, parameters dropped.
fn field_media_type(field: &Field) -> Option<String> {
    field.content_type().map(|m| m.essence_str().to_ascii_lowercase())
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, error::Error> {
    let mut bytes = Vec::new();
    while let Some(chunk) =
        field.try_next().await.map_err(|e| form_error(e, "Unable to parse form file"))?
    {
        if bytes.len() + chunk.len() > limit {
            return Err(error::Error::bad_request(format!("File exceeds {limit} bytes")));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Streams the field into a temp file that is removed when dropped.
async fn buffer_to_tempfile(field: &mut Field) -> Result<NamedTempFile, error::Error> {
    let temp = tempfile::Builder::new()
        .prefix("tubely-upload")
        .suffix(".mp4")
        .tempfile()
        .map_err(error::SystemError::from)?;
    let mut file =
        tokio::fs::File::from_std(temp.reopen().map_err(error::SystemError::from)?);

    while let Some(chunk) =
        field.try_next().await.map_err(|e| form_error(e, "Unable to parse the video"))?
    {
        file.write_all(&chunk).await.map_err(error::SystemError::from)?;
    }
    file.flush().await.map_err(error::SystemError::from)?;

    Ok(temp)
}

fn declared_length(req: &HttpRequest) -> Option<usize> {
    req.headers()
        .get(actix_web::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[post("/thumbnail_upload/{video_id}")]
pub async fn upload_thumbnail(
    video_service: web::Data<VideoService>,
    video_id: web::Path<String>,
    req: HttpRequest,
    mut payload: Multipart,
) -> Result<success::Success<VideoEntity>, error::Error> {
    let video_id = parse_video_id(&video_id)?;
    let user_id = authenticate(&req)?;
    log::info!("Uploading thumbnail for video {} by user {}", video_id, user_id);

    let mut field = find_field(&mut payload, "thumbnail").await?;
    let media_type = field_media_type(&field)
        .filter(|m| THUMBNAIL_CONTENT_TYPES.contains(&m.as_str()))
        .ok_or_else(|| error::Error::bad_request("Unsupported media type: must be png or jpeg"))?;

    let bytes = read_field(&mut field, MAX_THUMBNAIL_SIZE).await?;

    let video = video_service.upload_thumbnail(&video_id, &user_id, &media_type, bytes).await?;
    Ok(success::Success::ok(Some(video)).message("Thumbnail uploaded successfully"))
}

#[post("/video_upload/{video_id}")]
pub async fn upload_video(
    video_service: web::Data<VideoService>,
    video_id: web::Path<String>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<success::Success<VideoEntity>, error::Error> {
    let limit = video_service.upload_limit();
    if declared_length(&req).is_some_and(|len| len > limit) {
        return Err(error::Error::bad_request("Request body too large"));
    }

    let video_id = parse_video_id(&video_id)?;
    let user_id = authenticate(&req)?;

    // Ownership is settled before any of the body is read.
    let video = video_service.get_owned(&video_id, &user_id).await?;
    log::info!("Uploading video {} by user {}", video_id, user_id);

    // Chunked bodies carry no length, so every byte is counted as it arrives.
    let mut form = Multipart::new(req.headers(), limit_body(payload, limit));
    let mut field = find_field(&mut form, "video").await?;
    if field_media_type(&field).as_deref() != Some(VIDEO_CONTENT_TYPE) {
        return Err(error::Error::bad_request("Unsupported media type: must be video/mp4"));
    }

    let temp = buffer_to_tempfile(&mut field).await?;
    let video = video_service.upload_video(video, temp.path()).await?;

    Ok(success::Success::ok(Some(video)).message("Video uploaded successfully"))
}

#[post("")]
pub async fn create_video(
    video_service: web::Data<VideoService>,
    body: ValidatedJson<CreateVideoModel>,
    req: HttpRequest,
) -> Result<success::Success<VideoEntity>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let video = video_service.create(user_id, body.0).await?;
    Ok(success::Success::created(Some(video)).message("Video created successfully"))
}

#[get("")]
pub async fn list_videos(
    video_service: web::Data<VideoService>,
    req: HttpRequest,
) -> Result<success::Success<Vec<VideoEntity>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let videos = video_service.list_videos(&user_id).await?;
    Ok(success::Success::ok(Some(videos)).message("Videos retrieved successfully"))
}

#[get("/{video_id}")]
pub async fn get_video(
    video_service: web::Data<VideoService>,
    video_id: web::Path<String>,
    req: HttpRequest,
) -> Result<success::Success<VideoEntity>, error::Error> {
    let video_id = parse_video_id(&video_id)?;
    let user_id = get_claims(&req)?.sub;
    let video = video_service.get_video(&video_id, &user_id).await?;
    Ok(success::Success::ok(Some(video)).message("Video retrieved successfully"))
}

#[delete("/{video_id}")]
pub async fn delete_video(
    video_service: web::Data<VideoService>,
    video_id: web::Path<String>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let video_id = parse_video_id(&video_id)?;
    let user_id = get_claims(&req)?.sub;
    video_service.delete_video(&video_id, &user_id).await?;
    Ok(success::Success::no_content())
}
