use std::{sync::Arc, time::Duration};

use reqwest::StatusCode;
use sdci_api::{BearerToken, HttpApi, ServiceApiAdapter};
use sdci_core::{TaskResolver, TaskService};
use sdci_exec::{ProcConfig, ScriptRunner};
use sdci_model::RunRecord;
use serde_json::{Value, json};
use tempfile::TempDir;

const TOKEN: &str = "HAPPY123";

struct TestServer {
    _dir: TempDir,
    base: String,
    service: Arc<TaskService>,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(scripts: &[(&str, &str)], timeout: Duration) -> Self {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in scripts {
            std::fs::write(dir.path().join(format!("{name}.sh")), body).unwrap();
        }

        let runner = ScriptRunner::new(ProcConfig::new("sh"));
        let service = Arc::new(
            TaskService::new(TaskResolver::new(dir.path()), Arc::new(runner)).with_timeout(timeout),
        );
        let adapter = Arc::new(ServiceApiAdapter::new(Arc::clone(&service)));
        let app = HttpApi::new(adapter, BearerToken::new(TOKEN)).router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            sdci_api::axum::serve(listener, app).await.unwrap();
        });

        Self {
            _dir: dir,
            base: format!("http://{addr}"),
            service,
            client: reqwest::Client::new(),
        }
    }

    async fn trigger(&self, task: &str, args: &[&str]) -> reqwest::Response {
        self.client
            .post(format!("{}/tasks/{task}/", self.base))
            .bearer_auth(TOKEN)
            .json(&json!({ "args": args }))
            .send()
            .await
            .unwrap()
    }

    async fn status(&self, task: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(format!("{}/tasks/{task}/status/", self.base))
            .bearer_auth(TOKEN)
            .send()
            .await
            .unwrap();
        let code = resp.status();
        (code, resp.json().await.unwrap())
    }

    async fn wait_for_status(&self, task: &str, want: &str) -> Value {
        for _ in 0..100 {
            let (_, body) = self.status(task).await;
            if body["status"] == want {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("{task} never reached {want}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_or_wrong_token_is_challenged() {
    let srv = TestServer::start(&[("deploy", "echo done\n")], Duration::from_secs(12)).await;

    let missing = srv
        .client
        .post(format!("{}/tasks/deploy/status/", srv.base))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(missing.headers()["www-authenticate"], "Bearer");

    let wrong = srv
        .client
        .post(format!("{}/tasks/deploy/", srv.base))
        .bearer_auth("nope")
        .json(&json!({ "args": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert!(!srv.service.is_busy());
    assert_eq!(srv.service.status("deploy").unwrap(), RunRecord::stopped());
}

#[tokio::test(flavor = "multi_thread")]
async fn never_run_task_is_stopped() {
    let srv = TestServer::start(&[("deploy", "echo done\n")], Duration::from_secs(12)).await;

    let (code, body) = srv.status("deploy").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!({ "pid": null, "exit_code": null, "status": "STOPPED" }));
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_task_is_404_on_status_and_422_on_trigger() {
    let srv = TestServer::start(&[("deploy", "echo done\n")], Duration::from_secs(12)).await;

    let (code, body) = srv.status("ghost").await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("ghost.sh"));

    let resp = srv.trigger("ghost", &[]).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!srv.service.is_busy());
    assert_eq!(srv.service.status("deploy").unwrap(), RunRecord::stopped());
}

#[tokio::test(flavor = "multi_thread")]
async fn deploy_streams_and_finishes() {
    let srv = TestServer::start(&[("deploy", "echo \"done $1\"\n")], Duration::from_secs(12)).await;

    let resp = srv.trigger("deploy", &["v1.2"]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()["content-type"].to_str().unwrap().starts_with("text/plain"));

    let body = resp.text().await.unwrap();
    assert!(body.starts_with("\n**********\n"));
    assert!(body.contains("RUNNING: [\"sh\""));
    assert!(body.contains("done v1.2\n"));
    assert!(body.trim_end().ends_with("EXITED (0)"));

    let body = srv.wait_for_status("deploy", "FINISHED").await;
    assert_eq!(body["exit_code"], 0);
    assert!(body["pid"].is_u64());
}

#[tokio::test(flavor = "multi_thread")]
async fn second_trigger_is_rejected_while_running() {
    let srv = TestServer::start(
        &[("deploy", "sleep 1\necho done\n"), ("other", "echo hi\n")],
        Duration::from_secs(12),
    )
    .await;

    let first = srv.trigger("deploy", &[]).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = srv.trigger("deploy", &[]).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let other = srv.trigger("other", &[]).await;
    assert_eq!(other.status(), StatusCode::TOO_MANY_REQUESTS);

    let body = first.text().await.unwrap();
    assert!(body.contains("done"));

    srv.wait_for_status("deploy", "FINISHED").await;
    let again = srv.trigger("other", &[]).await;
    assert_eq!(again.status(), StatusCode::OK);
    assert!(again.text().await.unwrap().contains("hi"));
}

#[tokio::test(flavor = "multi_thread")]
async fn hang_reports_timeout() {
    let srv = TestServer::start(&[("hang", "sleep 30\n")], Duration::from_millis(500)).await;

    let resp = srv.trigger("hang", &[]).await;
    let (_, running) = srv.status("hang").await;
    assert_eq!(running["status"], "RUNNING");
    assert!(running["pid"].is_u64());

    let body = resp.text().await.unwrap();
    assert!(body.contains("TIMEOUT REACHED"));
    assert!(body.trim_end().ends_with("EXITED (-9)"));

    let (_, record) = srv.status("hang").await;
    assert_eq!(
        record,
        json!({ "pid": running["pid"], "exit_code": -9, "status": "TIMEOUT" })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_body_is_a_json_400() {
    let srv = TestServer::start(&[("deploy", "echo done\n")], Duration::from_secs(12)).await;

    let garbage = srv
        .client
        .post(format!("{}/tasks/deploy/", srv.base))
        .bearer_auth(TOKEN)
        .header("content-type", "application/json")
        .body("{\"args\": 5}")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);
    let body: Value = garbage.json().await.unwrap();
    assert!(body["detail"].is_string());

    let missing = srv
        .client
        .post(format!("{}/tasks/deploy/", srv.base))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    let body: Value = missing.json().await.unwrap();
    assert!(body["detail"].is_string());

    assert!(!srv.service.is_busy());
    assert_eq!(srv.service.status("deploy").unwrap(), RunRecord::stopped());
}

#[tokio::test(flavor = "multi_thread")]
async fn output_is_live_and_status_is_running_meanwhile() {
    let srv = TestServer::start(
        &[("slow", "echo first\nsleep 1\necho second\n")],
        Duration::from_secs(12),
    )
    .await;

    let mut resp = srv.trigger("slow", &[]).await;
    let mut seen = String::new();
    while !seen.contains("first\n") {
        let chunk = resp.chunk().await.unwrap().expect("stream ended early");
        seen.push_str(&String::from_utf8_lossy(&chunk));
    }
    assert!(!seen.contains("second"));

    let (_, record) = srv.status("slow").await;
    assert_eq!(record["status"], "RUNNING");
    assert_eq!(record["exit_code"], Value::Null);

    let rest = resp.text().await.unwrap();
    assert!(rest.contains("second"));
}

#[tokio::test(flavor = "multi_thread")]
async fn run_completes_after_client_disconnects() {
    let srv =
        TestServer::start(&[("deploy", "sleep 0.3\necho done\n")], Duration::from_secs(12)).await;

    let resp = srv.trigger("deploy", &[]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    drop(resp);

    let record = srv.wait_for_status("deploy", "FINISHED").await;
    assert_eq!(record["exit_code"], 0);
    assert!(!srv.service.is_busy());
}
