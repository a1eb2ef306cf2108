use actix_web::{
    middleware::from_fn,
    web::{scope, ServiceConfig},
};

use crate::{middlewares::authentication, modules::video::handle::*};

pub fn configure(cfg: &mut ServiceConfig) {
    // Upload routes authenticate inline so a malformed id is rejected first.
    cfg.service(upload_thumbnail).service(upload_video).service(
        scope("/videos")
            .wrap(from_fn(authentication))
            .service(create_video)
            .service(list_videos)
            .service(get_video)
            .service(delete_video),
    );
}
