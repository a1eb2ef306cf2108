use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error, HttpMessage, HttpRequest,
};
use uuid::Uuid;

use crate::{
    api::error,
    configs::AuthConfig,
    utils::{get_bearer_token, Claims},
};

fn decode_claims(req: &HttpRequest) -> Result<Claims, error::Error> {
    let auth = req
        .app_data::<web::Data<AuthConfig>>()
        .ok_or_else(error::Error::internal_server_error)?;

    let token = get_bearer_token(req.headers())
        .map_err(|_| error::Error::unauthorized("Couldn't find JWT"))?;

    Claims::decode(token, auth.jwt_secret.as_bytes())
        .map_err(|_| error::Error::unauthorized("Couldn't validate JWT"))
}

pub async fn authentication<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let claims = decode_claims(req.request())?;

    req.extensions_mut().insert(claims);

    next.call(req).await
}

/// Resolves the caller for handlers that must validate their path before auth.
pub fn authenticate(req: &HttpRequest) -> Result<Uuid, error::Error> {
    if let Some(claims) = req.extensions().get::<Claims>() {
        return Ok(claims.sub);
    }
    decode_claims(req).map(|claims| claims.sub)
}

pub fn get_claims(req: &HttpRequest) -> Result<Claims, error::Error> {
    let extensions = req.extensions();

    let claims = extensions
        .get::<Claims>()
        .ok_or_else(|| error::Error::unauthorized("Unauthorized"))?
        .clone();

    Ok(claims)
}
