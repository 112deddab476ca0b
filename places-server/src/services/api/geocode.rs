use actix_web::web::*;

use crate::handlers::geocode;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/geocode")
            .service(resource("/zip/{zip_code}").route(get().to(geocode::by_zip_code)))
            .service(resource("/address").route(get().to(geocode::by_address)))
            .service(resource("/coordinates").route(get().to(geocode::by_coordinates))),
    );
}
