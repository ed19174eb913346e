use axum_dinein_api::routes::health::health_check;

#[tokio::test]
async fn health_check_reports_this_service() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Service healthy");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.service, "axum-dinein-api");
}
