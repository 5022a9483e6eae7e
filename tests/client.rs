//! Wire-protocol tests for `HttpCompressionClient` against a mock server.
//!
//! Each mock matches on method, path, headers and body, so a request that
//! drifts from the protocol gets a 404 and the test fails.

use docstamp::{
    probe_progress, start_and_download, CompressionConfig, CompressionService, DocstampError,
    FileType, HttpCompressionClient, JobHandle, JobStatus, Language, NoopProgressCallback,
    PollPolicy, ProgressProbe, StartRequest,
};
use serde_json::json;
use wiremock::matchers::{
    body_json, body_string, header, header_exists, header_regex, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "tok123";
const SESSION: &str = "sess9";

fn client_for(server: &MockServer) -> HttpCompressionClient {
    let config = CompressionConfig::builder(server.uri())
        .csrf_token(TOKEN)
        .session_cookie(SESSION)
        .request_timeout_secs(5)
        .build()
        .unwrap();
    HttpCompressionClient::new(config).unwrap()
}

// ── start ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_posts_json_with_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/async_compression/start/"))
        .and(header("X-CSRFToken", TOKEN))
        .and(header("referer", format!("{}/", server.uri()).as_str()))
        .and(header_regex("cookie", "sessionid=sess9"))
        .and(header_regex("cookie", "csrftoken=tok123"))
        .and(body_json(json!({
            "product_ids": "1,2",
            "file_type": "both",
            "language": "zh"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "task_id": "ab c&1",
            "message": "压缩任务已启动"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = StartRequest::new(["1", "2"], FileType::Both, Language::Zh);
    let handle = client.start(&request).await.unwrap();
    assert_eq!(handle.as_str(), "ab c&1");
}

#[tokio::test]
async fn test_start_refusal_is_job_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/async_compression/start/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "请选择产品"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = StartRequest::new(["7"], FileType::Pdf, Language::Zh);
    match client.start(&request).await {
        Err(DocstampError::JobRejected { message }) => assert_eq!(message, "请选择产品"),
        other => panic!("unexpected: {other:?}"),
    }
}

// ── progress ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_progress_sends_encoded_task_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/async_compression/progress/"))
        .and(query_param("task_id", "ab c&1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "progress": 42,
            "is_completed": false,
            "status": "processing"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let snapshot = client.progress(&JobHandle::new("ab c&1")).await.unwrap();
    assert_eq!(snapshot.progress, 42.0);
    assert!(!snapshot.is_completed);
    assert_eq!(snapshot.status, Some(JobStatus::Processing));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("task_id=ab+c%261"));
}

#[tokio::test]
async fn test_progress_failure_body_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/async_compression/progress/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "任务不存在"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.progress(&JobHandle::new("gone")).await.unwrap_err();
    assert!(
        matches!(err, DocstampError::ProtocolError { ref detail, .. } if detail == "任务不存在"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn test_server_error_maps_to_http_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/async_compression/progress/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.progress(&JobHandle::new("t-1")).await.unwrap_err();
    assert!(
        matches!(err, DocstampError::HttpStatus { status: 500, .. }),
        "got: {err:?}"
    );

    // The masked probe turns the same failure into an unknown state.
    let probe = probe_progress(&client, &JobHandle::new("t-1")).await;
    assert!(matches!(probe, ProgressProbe::Unknown { .. }));
    assert_eq!(probe.reported(), (0.0, false));
}

// ── download ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_download_posts_form_and_reads_disposition() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/async_compression/download/"))
        .and(header("X-CSRFToken", TOKEN))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string(
            "csrfmiddlewaretoken=tok123&task_id=ab+c%261&file_type=pdf",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", r#"attachment; filename="A-1_PDF.ZIP""#)
                .set_body_raw(b"PK\x03\x04archive".to_vec(), "application/zip"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let archive = client
        .download(&JobHandle::new("ab c&1"), FileType::Pdf)
        .await
        .unwrap();
    assert_eq!(archive.filename, "A-1_PDF.ZIP");
    assert_eq!(archive.bytes, b"PK\x03\x04archive");
    assert_eq!(archive.content_type.as_deref(), Some("application/zip"));
}

#[tokio::test]
async fn test_download_without_disposition_uses_fallback_name() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/async_compression/download/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"PK\x05\x06".to_vec(), "application/zip"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let archive = client
        .download(&JobHandle::new("t-9"), FileType::Step)
        .await
        .unwrap();
    assert_eq!(archive.filename, "t-9_step.zip");
}

#[tokio::test]
async fn test_download_json_refusal_is_not_a_file() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/async_compression/download/"))
        .and(header_exists("X-CSRFToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "压缩任务尚未完成"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.download(&JobHandle::new("t-2"), FileType::Pdf).await {
        Err(DocstampError::DownloadRejected { message }) => {
            assert_eq!(message, "压缩任务尚未完成")
        }
        other => panic!("unexpected: {other:?}"),
    }
}

// ── whole flow ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_and_download_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/async_compression/start/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "task_id": 77})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/async_compression/progress/"))
        .and(query_param("task_id", "77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "progress": 100,
            "is_completed": true,
            "status": "completed"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/async_compression/download/"))
        .and(body_string("csrfmiddlewaretoken=tok123&task_id=77&file_type=bmp"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "content-disposition",
                    "attachment; filename*=UTF-8''%E5%A4%B9%E5%85%B7_BMP.ZIP",
                )
                .set_body_raw(b"PK\x05\x06".to_vec(), "application/zip"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = StartRequest::new(["5"], FileType::Bmp, Language::En);
    let (job, archive) = start_and_download(
        &client,
        &request,
        PollPolicy::default(),
        &NoopProgressCallback,
    )
    .await
    .unwrap();

    assert_eq!(job.as_str(), "77");
    assert_eq!(archive.filename, "夹具_BMP.ZIP");
}
