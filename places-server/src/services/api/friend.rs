use actix_web::web::*;

use crate::handlers::friend;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/friends")
            .service(resource("/request").route(post().to(friend::send_request)))
            .service(
                resource("/request/{request_id}/accept").route(put().to(friend::accept_request)),
            )
            .service(
                resource("/request/{request_id}/decline").route(put().to(friend::decline_request)),
            )
            .service(
                resource("/request/{request_id}/cancel").route(put().to(friend::cancel_request)),
            )
            .service(resource("/requests/sent").route(get().to(friend::get_sent_requests)))
            .service(resource("/requests/received").route(get().to(friend::get_received_requests)))
            .service(resource("").route(get().to(friend::get_friends)))
            .service(resource("/{friend_id}").route(delete().to(friend::remove_friend))),
    );
}
