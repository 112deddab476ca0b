use actix_web::web::*;

use crate::handlers::user;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/user").service(resource("/password").route(put().to(user::change_password))));
    cfg.service(resource("/users").route(get().to(user::get_all_users)));
}
