use std::{sync::Arc, time::Duration};

use sdci_api::{BearerToken, HttpApi, ServiceApiAdapter};
use sdci_cli::{ClientError, SdciClient};
use sdci_core::{TaskResolver, TaskService};
use sdci_exec::{ProcConfig, ScriptRunner};
use sdci_model::RunPhase;
use tempfile::TempDir;

const TOKEN: &str = "HAPPY123";

async fn start(scripts: &[(&str, &str)]) -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    for (name, body) in scripts {
        std::fs::write(dir.path().join(format!("{name}.sh")), body).unwrap();
    }
    let runner = ScriptRunner::new(ProcConfig::new("sh"));
    let service = TaskService::new(TaskResolver::new(dir.path()), Arc::new(runner))
        .with_timeout(Duration::from_secs(5));
    let adapter = Arc::new(ServiceApiAdapter::new(Arc::new(service)));
    let app = HttpApi::new(adapter, BearerToken::new(TOKEN)).router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        sdci_api::axum::serve(listener, app).await.unwrap();
    });
    (dir, addr.to_string())
}

#[tokio::test(flavor = "multi_thread")]
async fn run_streams_output_then_reads_exit_code() {
    let (_dir, addr) = start(&[("deploy", "echo \"deploying $1\"\nexit 4\n")]).await;
    let client = SdciClient::new(&addr, TOKEN);

    let mut out = Vec::new();
    client
        .trigger("deploy", &["v1.2".to_string()], &mut out)
        .await
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("deploying v1.2"));
    assert!(text.contains("EXITED (4)"));

    let record = client.status("deploy").await.unwrap();
    assert_eq!(record.status, RunPhase::Finished);
    assert_eq!(record.exit_code, Some(4));
}

#[tokio::test(flavor = "multi_thread")]
async fn failures_map_to_client_errors() {
    let (_dir, addr) = start(&[("slow", "sleep 1\n")]).await;
    let client = SdciClient::new(&addr, TOKEN);

    let err = client.status("ghost").await.unwrap_err();
    assert!(matches!(err, ClientError::TaskNotFound(d) if d.contains("ghost")));

    let err = client.trigger("ghost", &[], &mut Vec::new()).await.unwrap_err();
    assert!(matches!(err, ClientError::TaskNotFound(_)));

    let intruder = SdciClient::new(&addr, "wrong");
    assert!(matches!(
        intruder.status("slow").await,
        Err(ClientError::Unauthorized)
    ));

    let first = {
        let client = SdciClient::new(&addr, TOKEN);
        tokio::spawn(async move { client.trigger("slow", &[], &mut Vec::new()).await })
    };
    for _ in 0..50 {
        if client.status("slow").await.unwrap().status == RunPhase::Running {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let err = client.trigger("slow", &[], &mut Vec::new()).await.unwrap_err();
    assert!(matches!(err, ClientError::Busy(_)));

    first.await.unwrap().unwrap();
}
