use crate::{
    api::{leave_quota, leave_request},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Helper to build per-scope limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/attachments, registered before /{id}
                    .service(
                        web::resource("/attachments")
                            .route(web::post().to(leave_request::upload_attachment)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    )
                    // /leave/{id}/cancel
                    .service(
                        web::resource("/{id}/cancel")
                            .route(web::put().to(leave_request::cancel_leave)),
                    ),
            )
            .service(
                web::scope("/quota")
                    // /quota/employee/{employee_id}
                    .service(
                        web::resource("/employee/{employee_id}")
                            .route(web::get().to(leave_quota::employee_quotas)),
                    )
                    // /quota/allocate/category/{category_id}
                    .service(
                        web::resource("/allocate/category/{category_id}")
                            .route(web::post().to(leave_quota::allocate_category)),
                    )
                    // /quota/allocate/employee/{employee_id}
                    .service(
                        web::resource("/allocate/employee/{employee_id}")
                            .route(web::post().to(leave_quota::allocate_employee)),
                    )
                    // /quota/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_quota::get_quota)))
                    // /quota/{id}/adjust
                    .service(
                        web::resource("/{id}/adjust")
                            .route(web::put().to(leave_quota::adjust_quota)),
                    )
                    // /quota/{id}/recalculate
                    .service(
                        web::resource("/{id}/recalculate")
                            .route(web::put().to(leave_quota::recalculate_quota)),
                    ),
            ),
    );
}
