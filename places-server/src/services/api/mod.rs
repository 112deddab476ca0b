use actix_web::web::*;

mod auth;
mod friend;
mod geocode;
mod health;
mod location;
mod user;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/api")
            .configure(auth::configure)
            .configure(friend::configure)
            .configure(geocode::configure)
            .configure(location::configure)
            .configure(user::configure),
    );

    // Heartbeat and health live at the root, outside the /api scope
    cfg.configure(health::configure);
}
