//! API Router with Swagger UI

use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{BookingService, StationService};
use crate::interfaces::http::common::{ApiResponse, EmptyData};
use crate::interfaces::http::modules::{bookings, health, metrics, stations};

/// Unified state for every `/api/v1` route.
/// Axum extracts the specific handler state via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub stations: Arc<StationService>,
    pub bookings: Arc<BookingService>,
}

impl FromRef<ApiState> for stations::StationAppState {
    fn from_ref(s: &ApiState) -> Self {
        stations::StationAppState {
            stations: Arc::clone(&s.stations),
            bookings: Arc::clone(&s.bookings),
        }
    }
}

impl FromRef<ApiState> for bookings::BookingAppState {
    fn from_ref(s: &ApiState) -> Self {
        bookings::BookingAppState {
            bookings: Arc::clone(&s.bookings),
        }
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-User-Id",
                    "Authenticated user, set by the gateway",
                ))),
            );
            components.add_security_scheme(
                "user_role",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-User-Role",
                    "`operator` grants station management and access to all bookings",
                ))),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Stations
        stations::list_stations,
        stations::get_station,
        stations::create_station,
        stations::update_station,
        stations::delete_station,
        // Slots
        stations::list_available_slots,
        // Bookings
        stations::list_station_bookings,
        bookings::create_booking,
        bookings::list_my_bookings,
        bookings::get_booking,
        bookings::cancel_booking,
        bookings::reschedule_booking,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            EmptyData,
            health::HealthResponse,
            health::ComponentHealth,
            // Stations
            stations::StationDto,
            stations::CreateStationRequest,
            stations::UpdateStationRequest,
            stations::SlotDto,
            stations::AvailableSlotsResponse,
            // Bookings
            bookings::BookingDto,
            bookings::CreateBookingRequest,
            bookings::RescheduleBookingRequest,
            bookings::CancelBookingResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Stations", description = "Charging station (bunk) directory"),
        (name = "Slots", description = "Free slots derived from operating hours and active bookings"),
        (name = "Bookings", description = "Book, cancel and reschedule charging slots"),
    ),
    info(
        title = "Bunk Booking API",
        version = "1.0.0",
        description = "REST API for reserving fixed-length charging slots at EV charging stations",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(
    state: ApiState,
    health_state: health::HealthState,
    metrics_handle: Option<PrometheusHandle>,
) -> Router {
    let station_routes = Router::new()
        .route(
            "/",
            get(stations::list_stations).post(stations::create_station),
        )
        .route(
            "/{station_id}",
            get(stations::get_station)
                .put(stations::update_station)
                .delete(stations::delete_station),
        )
        .route("/{station_id}/slots", get(stations::list_available_slots))
        .route(
            "/{station_id}/bookings",
            get(stations::list_station_bookings),
        )
        .with_state(state.clone());

    let booking_routes = Router::new()
        .route(
            "/",
            get(bookings::list_my_bookings).post(bookings::create_booking),
        )
        .route("/{booking_id}", get(bookings::get_booking))
        .route("/{booking_id}/cancel", post(bookings::cancel_booking))
        .route(
            "/{booking_id}/reschedule",
            post(bookings::reschedule_booking),
        )
        .with_state(state);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health_state);

    let mut router = Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Health
        .merge(health_routes)
        // Stations + slots
        .nest("/api/v1/stations", station_routes)
        // Bookings
        .nest("/api/v1/bookings", booking_routes);

    if let Some(handle) = metrics_handle {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics::prometheus_metrics))
                .with_state(metrics::MetricsState { handle }),
        );
    }

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
