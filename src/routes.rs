use crate::{
    api::{announcement, attendance, report, user},
    auth::middleware::auth_middleware,
    config::Config,
    store::{AnnouncementStore, AttendanceStore, UserStore},
};
use actix_governor::{
    governor::middleware::NoOpMiddleware, Governor, GovernorConfig, GovernorConfigBuilder,
    PeerIpKeyExtractor,
};
use actix_web::{middleware::from_fn, web};

pub fn configure<S>(cfg: &mut web::ServiceConfig, config: Config)
where
    S: AttendanceStore + AnnouncementStore + UserStore,
{
    // Helper to build per-route limiter config
    fn build_limiter(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    // The action limiter doubles as transport-level protection against
    // rapid repeated check-in/check-out clicks.
    let action_limiter = build_limiter(config.rate_action_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
             // authentication
            .wrap(Governor::new(&protected_limiter)) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .wrap(Governor::new(&action_limiter))
                            .route(web::post().to(attendance::check_in::<S>))
                            .route(web::put().to(attendance::check_out::<S>)),
                    )
                    // /attendance/records
                    .service(
                        web::resource("/records")
                            .route(web::get().to(attendance::list_records::<S>)),
                    )
                    // /attendance/summary
                    .service(web::resource("/summary").route(web::get().to(report::summary::<S>)))
                    // /attendance/report
                    .service(web::resource("/report").route(web::get().to(report::export_csv::<S>))),
            )
            .service(
                web::scope("/announcements")
                    // /announcements
                    .service(
                        web::resource("")
                            .route(web::get().to(announcement::board::<S>))
                            .route(web::post().to(announcement::post_announcement::<S>)),
                    )
                    // /announcements/stream
                    .service(
                        web::resource("/stream")
                            .route(web::get().to(announcement::stream_board::<S>)),
                    )
                    // /announcements/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(announcement::edit_announcement::<S>))
                            .route(web::delete().to(announcement::delete_announcement::<S>)),
                    )
                    // /announcements/{id}/pin
                    .service(
                        web::resource("/{id}/pin")
                            .route(web::put().to(announcement::toggle_pin::<S>)),
                    ),
            )
            .service(
                web::scope("/users")
                    // /users
                    .service(web::resource("").route(web::get().to(user::list_users::<S>)))
                    // /users/{id}/role
                    .service(
                        web::resource("/{id}/role").route(web::put().to(user::update_role::<S>)),
                    ),
            )
            .service(
                web::scope("/profile")
                    // /profile
                    .service(
                        web::resource("")
                            .route(web::get().to(user::get_profile::<S>))
                            .route(web::put().to(user::update_profile::<S>)),
                    )
                    // /profile/notification-token
                    .service(
                        web::resource("/notification-token")
                            .route(web::put().to(user::set_notification_token::<S>)),
                    ),
            ),
    );
}
