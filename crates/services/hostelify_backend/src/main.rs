// File: services/hostelify_backend/src/main.rs
use axum::{routing::get, Router};
use hostelify_booking::handlers::BookingApiState;
use hostelify_booking::{occupancy::OccupancyTracker, EventBus};
use hostelify_booking::{deletion::StudentDeletion, lifecycle::BookingLifecycle};
use hostelify_config::load_config;
use hostelify_db::{
    DbClient, SqlArchiveRepository, SqlAssignmentRepository, SqlBookingRepository,
    SqlRoomRepository, SqlSettingsRepository, SqlStudentRepository,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;

#[tokio::main]
async fn main() {
    hostelify_common::logging::init();

    let config = Arc::new(load_config().expect("Failed to load config"));

    let db_client = DbClient::new(&config)
        .await
        .expect("Failed to connect to database");

    let rooms = Arc::new(SqlRoomRepository::new(db_client.clone()));
    let students = Arc::new(SqlStudentRepository::new(db_client.clone()));
    let bookings = Arc::new(SqlBookingRepository::new(db_client.clone()));
    let assignments = Arc::new(SqlAssignmentRepository::new(db_client.clone()));
    let archives = Arc::new(SqlArchiveRepository::new(db_client.clone()));
    let settings = Arc::new(SqlSettingsRepository::new(db_client.clone()));

    rooms.init_schema().await.expect("rooms schema");
    students.init_schema().await.expect("students schema");
    bookings.init_schema().await.expect("bookings schema");
    assignments.init_schema().await.expect("assignments schema");
    archives.init_schema().await.expect("archives schema");
    settings.init_schema().await.expect("settings schema");

    let events = EventBus::default();

    // Relay domain events into the log; a socket/webhook relay would
    // subscribe the same way.
    let mut event_rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            info!(?event, "domain event");
        }
    });

    let occupancy = Arc::new(OccupancyTracker::new(
        rooms.clone(),
        assignments.clone(),
        events.clone(),
    ));
    let lifecycle = Arc::new(BookingLifecycle::new(
        rooms.clone(),
        students.clone(),
        bookings.clone(),
        assignments.clone(),
        archives.clone(),
        settings.clone(),
        occupancy.clone(),
        events.clone(),
    ));
    let deletion = Arc::new(StudentDeletion::new(
        students.clone(),
        bookings.clone(),
        assignments.clone(),
        lifecycle.clone(),
        occupancy.clone(),
        events.clone(),
    ));

    let state = BookingApiState {
        lifecycle,
        deletion,
        rooms,
        students,
        settings,
    };

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to Hostelify API!" }))
        .merge(hostelify_booking::routes(state));

    let mut app = Router::new().nest("/api", api_router);

    // Serve static files in dev mode
    if cfg!(debug_assertions) {
        let static_router = Router::new().nest_service("/static", ServeDir::new("../../dist"));
        app = app.merge(static_router);
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await.unwrap();
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}
