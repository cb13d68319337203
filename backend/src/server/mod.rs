//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use melody_backend::Trace;
#[cfg(debug_assertions)]
use melody_backend::doc::ApiDoc;
use melody_backend::domain::TokenVerifier;
use melody_backend::domain::ports::FixturePaymentGateway;
use melody_backend::inbound::http::classes::{
    create_class, leave_feedback, list_all_classes, list_approved_classes, list_own_classes,
    list_popular_classes, review_class, update_class,
};
use melody_backend::inbound::http::health::{HealthState, live, ready};
use melody_backend::inbound::http::payments::{
    complete_purchase, create_payment_intent, list_enrollments,
};
use melody_backend::inbound::http::selections::{
    create_selection, delete_selection, list_selections,
};
use melody_backend::inbound::http::state::{HttpState, HttpStatePorts};
use melody_backend::inbound::http::users::{
    list_instructors, list_users, promote_user, sign_in,
};
use melody_backend::outbound::persistence::{
    DieselClassRepository, DieselEnrollmentRepository, DieselSelectionRepository,
    DieselUserDirectory,
};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Build the handler state from the configured adapters.
///
/// A database pool selects the Diesel-backed ports; otherwise fixture
/// adapters keep the server bootable for local development. The gateway
/// falls back to the fixture when none is configured.
fn build_http_state(config: &ServerConfig) -> HttpState {
    let gateway = config
        .gateway
        .clone()
        .unwrap_or_else(|| Arc::new(FixturePaymentGateway));

    let ports = config.db_pool.as_ref().map_or_else(HttpStatePorts::default, |pool| {
        HttpStatePorts {
            directory: Arc::new(DieselUserDirectory::new(pool.clone())),
            classes: Arc::new(DieselClassRepository::new(pool.clone())),
            selections: Arc::new(DieselSelectionRepository::new(pool.clone())),
            enrollments: Arc::new(DieselEnrollmentRepository::new(pool.clone())),
            ..HttpStatePorts::default()
        }
    });

    HttpState::new(HttpStatePorts {
        gateway,
        currency: config.currency.clone(),
        ..ports
    })
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    verifier: web::Data<TokenVerifier>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        verifier,
    } = deps;

    let api = web::scope("/api/v1")
        .app_data(http_state)
        .app_data(verifier)
        .service(sign_in)
        .service(list_users)
        .service(promote_user)
        .service(list_instructors)
        .service(create_class)
        .service(list_approved_classes)
        .service(list_popular_classes)
        .service(list_all_classes)
        .service(list_own_classes)
        .service(review_class)
        .service(leave_feedback)
        .service(update_class)
        .service(create_selection)
        .service(list_selections)
        .service(delete_selection)
        .service(create_payment_intent)
        .service(complete_purchase)
        .service(list_enrollments);

    let mut app = App::new()
        .app_data(health_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    {
        app = app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    app
}

#[cfg(feature = "metrics")]
fn make_metrics() -> std::io::Result<actix_web_prom::PrometheusMetrics> {
    actix_web_prom::PrometheusMetricsBuilder::new("melody")
        .endpoint("/metrics")
        .build()
        .map_err(|err| std::io::Error::other(format!("configure Prometheus metrics: {err}")))
}

/// Bind and run the HTTP server with the given configuration.
pub fn run(config: ServerConfig, health_state: web::Data<HealthState>) -> std::io::Result<Server> {
    let http_state = web::Data::new(build_http_state(&config));
    let verifier = web::Data::new(config.verifier.clone());
    let bind_addr = config.bind_addr;

    #[cfg(feature = "metrics")]
    let prometheus = match config.prometheus.clone() {
        Some(metrics) => metrics,
        None => make_metrics()?,
    };

    let server = HttpServer::new(move || {
        let deps = AppDependencies {
            health_state: health_state.clone(),
            http_state: http_state.clone(),
            verifier: verifier.clone(),
        };
        let app = build_app(deps);
        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());
        app
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}
