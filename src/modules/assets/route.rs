use actix_web::web::ServiceConfig;

use crate::modules::assets::handle::*;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(get_asset);
}
