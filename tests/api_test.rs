//! End-to-end tests: the real router served on a loopback port, driven
//! through the typed client and the cached registry.

use chrono::{Duration, NaiveDate, Utc};
use mortis::client::{ApiClient, ClientError, Registry};
use mortis::filter::UnitFilter;
use mortis::http::{router, AppState};
use mortis::storage::UnitStatus;
use mortis::wire::{WireRecordCreate, WireUnitCreate};

/// Serve the API on an ephemeral port, returning its base URL.
async fn serve() -> String {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .try_init();

    let state = AppState::new();
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

fn unit_payload(number: &str, wing: &str) -> WireUnitCreate {
    WireUnitCreate {
        unit_number: number.to_string(),
        wing: wing.to_string(),
        floor: 1,
        temperature: 4.0,
        capacity: Some("single".to_string()),
    }
}

fn record_payload(name: &str) -> WireRecordCreate {
    WireRecordCreate {
        full_name: name.to_string(),
        date_of_birth: None,
        date_of_death: Utc::now(),
        gender: None,
        identification: None,
        cause_of_death: None,
        next_of_kin: Some("Jane Smith".to_string()),
        contact_number: None,
        address: None,
        religion: None,
        notes: None,
    }
}

fn future_deadline() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(14)
}

#[tokio::test]
async fn test_assign_and_release_round_trip() {
    let base = serve().await;
    let client = ApiClient::new(&base);

    let unit = client.create_storage_unit(&unit_payload("A-01", "Wing A")).await.unwrap();
    assert_eq!(unit.status, "available");
    assert!(unit.occupant_id.is_none());

    let record = client.add_deceased_record(&record_payload("John Smith")).await.unwrap();
    assert_eq!(record.status, "pending");

    // assign with a deadline; the server denormalizes the record name
    let updated = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        client.assign_to_unit(&unit.id, &record.id, Some(future_deadline())),
    )
    .await
    .expect("assign should not hang")
    .unwrap();

    assert_eq!(updated.status, "occupied");
    assert_eq!(updated.occupant_id.as_deref(), Some(record.id.as_str()));
    assert_eq!(updated.occupant_name.as_deref(), Some("John Smith"));
    assert!(updated.date_admitted.is_some());
    assert!(updated.storage_deadline.is_some());

    // the linked record moved to processing
    let records = client.fetch_deceased_records().await.unwrap();
    assert_eq!(records[0].status, "processing");
    assert_eq!(records[0].storage_unit_id.as_deref(), Some(unit.id.as_str()));

    // release clears every occupant field and releases the record
    let released = client.release_unit(&unit.id).await.unwrap();
    assert_eq!(released.status, "available");
    assert!(released.occupant_id.is_none());
    assert!(released.occupant_name.is_none());
    assert!(released.date_admitted.is_none());
    assert!(released.storage_deadline.is_none());

    let records = client.fetch_deceased_records().await.unwrap();
    assert_eq!(records[0].status, "released");
    assert!(records[0].storage_unit_id.is_none());
}

#[tokio::test]
async fn test_assign_rejections_leave_state_alone() {
    let base = serve().await;
    let client = ApiClient::new(&base);

    let unit = client.create_storage_unit(&unit_payload("A-01", "Wing A")).await.unwrap();
    let record = client.add_deceased_record(&record_payload("John Smith")).await.unwrap();
    let other = client.add_deceased_record(&record_payload("Mary Johnson")).await.unwrap();

    // unknown record
    let err = client.assign_to_unit(&unit.id, "rec_missing", None).await.unwrap_err();
    match err {
        ClientError::Api { status, detail } => {
            assert_eq!(status, 404);
            assert_eq!(detail, "Deceased record not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // occupy, then a second assignment must fail and change nothing
    client.assign_to_unit(&unit.id, &record.id, None).await.unwrap();
    let err = client.assign_to_unit(&unit.id, &other.id, None).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }));

    let units = client.fetch_storage_units().await.unwrap();
    assert_eq!(units[0].occupant_id.as_deref(), Some(record.id.as_str()));

    // unknown unit
    let err = client.assign_to_unit("unit_missing", &record.id, None).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 404, .. }));
}

#[tokio::test]
async fn test_assign_on_maintenance_unit_rejected() {
    let base = serve().await;
    let client = ApiClient::new(&base);

    let unit = client.create_storage_unit(&unit_payload("B-01", "Wing B")).await.unwrap();
    let record = client.add_deceased_record(&record_payload("John Smith")).await.unwrap();

    let parked = client.set_maintenance(&unit.id, true).await.unwrap();
    assert_eq!(parked.status, "maintenance");
    assert!(parked.last_maintenance.is_some());

    let err = client.assign_to_unit(&unit.id, &record.id, None).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }));

    let units = client.fetch_storage_units().await.unwrap();
    assert_eq!(units[0].status, "maintenance");

    // the exit path exists and returns the unit to service
    let back = client.set_maintenance(&unit.id, false).await.unwrap();
    assert_eq!(back.status, "available");
}

#[tokio::test]
async fn test_duplicate_unit_number_rejected() {
    let base = serve().await;
    let client = ApiClient::new(&base);

    client.create_storage_unit(&unit_payload("A-01", "Wing A")).await.unwrap();
    let err = client.create_storage_unit(&unit_payload("A-01", "Wing B")).await.unwrap_err();
    match err {
        ClientError::Api { status, detail } => {
            assert_eq!(status, 400);
            assert!(detail.contains("already exists"), "detail: {detail}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_registry_scenarios_end_to_end() {
    let base = serve().await;
    let client = ApiClient::new(&base);

    let u1 = client.create_storage_unit(&unit_payload("A-01", "Wing A")).await.unwrap();
    let u2 = client.create_storage_unit(&unit_payload("B-01", "Wing B")).await.unwrap();
    let record = client.add_deceased_record(&record_payload("John Smith")).await.unwrap();

    let mut registry = Registry::new();
    registry.load(&client).await.unwrap();
    assert_eq!(registry.units().len(), 2);

    // Scenario A: assign succeeds, cache reflects the confirmed unit
    let updated = registry
        .assign(&client, &u1.id, &record.id, future_deadline())
        .await
        .unwrap();
    assert_eq!(updated.status, UnitStatus::Occupied);
    assert_eq!(
        registry.get(&u1.id).unwrap().occupant.as_ref().unwrap().record_id,
        record.id
    );
    // every unit in the cache satisfies occupant-iff-occupied
    assert!(registry.units().iter().all(|u| u.occupant_consistent()));

    // Scenario D: searching the record id finds exactly the occupied unit
    let filter = UnitFilter::from_params(&record.id, "all", "all");
    let hits = registry.filtered(&filter);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, u1.id);

    // Scenario B: release clears the occupant entirely
    let released = registry.release(&client, &u1.id).await.unwrap();
    assert_eq!(released.status, UnitStatus::Available);
    assert!(released.occupant.is_none());

    // Scenario C: a maintenance unit rejects assignment and keeps its status
    registry.set_maintenance(&client, &u2.id, true).await.unwrap();
    let err = registry
        .assign(&client, &u2.id, &record.id, future_deadline())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }));
    assert_eq!(registry.get(&u2.id).unwrap().status, UnitStatus::Maintenance);

    // reload reconciles without disturbing confirmed state
    registry.load(&client).await.unwrap();
    assert_eq!(registry.get(&u2.id).unwrap().status, UnitStatus::Maintenance);
    assert!(registry.units().iter().all(|u| u.occupant_consistent()));
}

#[tokio::test]
async fn test_schedule_conflicts_raise_notifications() {
    let base = serve().await;
    let http = reqwest::Client::new();

    let event = serde_json::json!({
        "deceased_name": "John Smith",
        "service_type": "burial",
        "date": "2025-09-18",
        "time": "10:00:00",
        "location": "Chapel A",
        "officiant": "Rev. Adams",
    });
    let created: serde_json::Value = http
        .post(format!("{base}/schedule"))
        .json(&event)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created["service_type"], "burial");

    // same chapel, date, and time clashes
    let clashing = serde_json::json!({
        "deceased_name": "Mary Johnson",
        "service_type": "memorial",
        "date": "2025-09-18",
        "time": "10:00:00",
        "location": "Chapel A",
    });
    let response = http
        .post(format!("{base}/schedule"))
        .json(&clashing)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let notifications: Vec<serde_json::Value> = http
        .get(format!("{base}/notifications"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        notifications.iter().any(|n| n["title"] == "Schedule Conflict"),
        "expected a conflict notification, got {notifications:?}"
    );

    // updates keep the id; cancellation removes the event
    let id = created["id"].as_str().unwrap();
    let moved = serde_json::json!({
        "deceased_name": "John Smith",
        "service_type": "burial",
        "date": "2025-09-19",
        "time": "11:00:00",
        "location": "Chapel B",
    });
    let updated: serde_json::Value = http
        .patch(format!("{base}/schedule/{id}"))
        .json(&moved)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["location"], "Chapel B");

    let response = http
        .delete(format!("{base}/schedule/{id}"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let listed: Vec<serde_json::Value> = http
        .get(format!("{base}/schedule"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_notification_feed_operations() {
    let base = serve().await;
    let client = ApiClient::new(&base);
    let http = reqwest::Client::new();

    // entering and leaving maintenance both post to the feed
    let unit = client.create_storage_unit(&unit_payload("C-01", "Wing C")).await.unwrap();
    client.set_maintenance(&unit.id, true).await.unwrap();
    client.set_maintenance(&unit.id, false).await.unwrap();

    let notifications: Vec<serde_json::Value> = http
        .get(format!("{base}/notifications"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(notifications.len(), 2);
    // newest first: the completion notice leads
    assert_eq!(notifications[0]["title"], "Maintenance Complete");
    assert_eq!(notifications[1]["title"], "Storage Unit Maintenance");

    // mark one read, then only one unread remains
    let first_id = notifications[1]["id"].as_str().unwrap();
    let response = http
        .patch(format!("{base}/notifications/{first_id}/read"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let unread: Vec<serde_json::Value> = http
        .get(format!("{base}/notifications?unread=true"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unread.len(), 1);

    // clearing unread keeps the read entry
    let cleared: serde_json::Value = http
        .delete(format!("{base}/notifications?unread=true"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared["cleared"], 1);

    let remaining: Vec<serde_json::Value> = http
        .get(format!("{base}/notifications"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["read"], true);
}

#[tokio::test]
async fn test_storage_summary_counts() {
    let base = serve().await;
    let client = ApiClient::new(&base);
    let http = reqwest::Client::new();

    let a1 = client.create_storage_unit(&unit_payload("A-01", "Wing A")).await.unwrap();
    client.create_storage_unit(&unit_payload("A-02", "Wing A")).await.unwrap();
    let record = client.add_deceased_record(&record_payload("John Smith")).await.unwrap();
    client.assign_to_unit(&a1.id, &record.id, None).await.unwrap();

    let summary: serde_json::Value = http
        .get(format!("{base}/storage/summary"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["occupied"], 1);
    assert_eq!(summary["available"], 1);
    assert_eq!(summary["utilization_pct"], 50);
    assert_eq!(summary["wings"][0]["wing"], "Wing A");
    assert_eq!(summary["wings"][0]["total"], 2);
}

#[tokio::test]
async fn test_schedule_listing_is_chronological() {
    let base = serve().await;
    let http = reqwest::Client::new();

    for (name, date, time) in [
        ("Late", "2025-09-20", "15:00:00"),
        ("Early", "2025-09-18", "09:00:00"),
    ] {
        let event = serde_json::json!({
            "deceased_name": name,
            "service_type": "viewing",
            "date": date,
            "time": time,
            "location": "Chapel A",
        });
        http.post(format!("{base}/schedule")).json(&event).send().await.unwrap();
    }

    let listed: Vec<serde_json::Value> = http
        .get(format!("{base}/schedule"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = listed.iter().map(|e| e["deceased_name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Early", "Late"]);
}
