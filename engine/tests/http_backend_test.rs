//! Integration tests for the HTTP backend
//!
//! Verifies request shapes against a mock server and the mapping of
//! transport failures and error statuses onto `AssistantError`.

use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    matchers::{body_json, body_string_contains, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use rxassist_engine::backend::{download_to, Backend, HttpBackend};
use rxassist_engine::config::BackendConfig;
use rxassist_sdk::{ArtifactRef, AssistantError, Profile, ProfileField};

fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&BackendConfig {
        base_url: server.uri(),
        request_timeout_secs: 2,
        connect_timeout_secs: 1,
    })
    .unwrap()
}

#[tokio::test]
async fn test_upload_sends_multipart_file_and_reads_wrapped_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"report.pdf\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "Patient Information": {
                    "name": "Asha Rao",
                    "age": "54",
                    "weight": "61",
                    "height": "160",
                    "refDoc": "Dr. Iyer"
                },
                "Lab Test Results": {
                    "HBA1C, GLYCATED HEMOGLOBIN": "6.1",
                    "PCV": 40,
                    "Vitamin D": "12"
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = backend_for(&server)
        .upload("report.pdf", b"%PDF-1.4 lab report".to_vec())
        .await
        .unwrap();

    assert_eq!(result.patient_info.name.as_deref(), Some("Asha Rao"));
    assert_eq!(
        result.patient_info.referring_doctor.as_deref(),
        Some("Dr. Iyer")
    );
    assert_eq!(result.lab_test_results.get("PCV"), Some("40"));
    assert_eq!(result.lab_test_results.len(), 3);
}

#[tokio::test]
async fn test_upload_accepts_bare_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "patientInfo": { "name": "B" },
            "labTestResults": { "TSH": "2.4" }
        })))
        .mount(&server)
        .await;

    let result = backend_for(&server)
        .upload("scan.png", vec![0u8; 16])
        .await
        .unwrap();

    assert_eq!(result.lab_test_results.get("TSH"), Some("2.4"));
}

#[tokio::test]
async fn test_unreadable_upload_body_is_extraction_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = backend_for(&server).upload("report.pdf", vec![1]).await;
    assert!(matches!(result, Err(AssistantError::Extraction(_))));
}

#[tokio::test]
async fn test_update_profile_posts_ref_doc_key() {
    let server = MockServer::start().await;

    let mut profile = Profile::default();
    profile.set_field(ProfileField::Name, "Asha Rao");
    profile.set_field(ProfileField::ReferringDoctor, "Dr. Iyer");

    Mock::given(method("POST"))
        .and(path("/update_profile"))
        .and(body_json(json!({
            "name": "Asha Rao",
            "age": null,
            "weight": null,
            "height": null,
            "refDoc": "Dr. Iyer"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    backend_for(&server).update_profile(&profile).await.unwrap();
}

#[tokio::test]
async fn test_update_selection_posts_label_array() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/update_analysis"))
        .and(body_json(json!(["HBA1C", "PCV", "Vitamin D"])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let labels = vec![
        "HBA1C".to_string(),
        "PCV".to_string(),
        "Vitamin D".to_string(),
    ];
    backend_for(&server).update_selection(&labels).await.unwrap();
}

#[tokio::test]
async fn test_generate_sends_flag_in_query_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generate_prescription"))
        .and(query_param("isUpdate", "true"))
        .and(body_json(json!({"isUpdate": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"file_path": "/srv/Output-files/Asha_prescription.pdf"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let artifact = backend_for(&server).generate(true).await.unwrap();
    assert_eq!(artifact.as_str(), "/srv/Output-files/Asha_prescription.pdf");
}

#[tokio::test]
async fn test_generate_error_status_maps_to_backend_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generate_prescription"))
        .respond_with(ResponseTemplate::new(500).set_body_string("template missing"))
        .mount(&server)
        .await;

    match backend_for(&server).generate(false).await {
        Err(AssistantError::Backend { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "template missing");
        }
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_without_path_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generate_prescription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "done"})))
        .mount(&server)
        .await;

    let result = backend_for(&server).generate(false).await;
    assert!(matches!(result, Err(AssistantError::Decode(_))));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/update_analysis"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let result = backend_for(&server).update_selection(&[]).await;
    assert!(matches!(result, Err(AssistantError::Transport(_))));
}

#[tokio::test]
async fn test_download_saves_artifact() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/download"))
        .and(query_param("file_path", "/srv/out/Asha_prescription.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let saved = download_to(
        &backend,
        &ArtifactRef::new("/srv/out/Asha_prescription.pdf"),
        dir.path(),
    )
    .await
    .unwrap();

    assert_eq!(saved, dir.path().join("Asha_prescription.pdf"));
    assert_eq!(std::fs::read(saved).unwrap(), b"%PDF-1.7");
}

#[tokio::test]
async fn test_download_missing_artifact() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "File not found"})))
        .mount(&server)
        .await;

    let result = backend_for(&server)
        .download(&ArtifactRef::new("/srv/out/gone.pdf"))
        .await;
    assert!(matches!(result, Err(AssistantError::ArtifactNotFound(_))));
}

#[tokio::test]
async fn test_health_check_against_running_server() {
    let server = MockServer::start().await;
    // Unmatched requests get a 404, which still proves reachability
    assert!(backend_for(&server).check_health().await);
}
