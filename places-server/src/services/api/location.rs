use actix_web::web::*;

use crate::handlers::location;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/location")
            .service(
                resource("")
                    .route(post().to(location::add_location)),
            )
            .service(resource("/latest").route(get().to(location::get_latest_location)))
            .service(resource("/all").route(get().to(location::get_all_locations)))
            .service(resource("/friends").route(get().to(location::get_friends_locations))),
    );
}
