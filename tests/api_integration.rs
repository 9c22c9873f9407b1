#![cfg(feature = "api")]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;

struct ChildGuard {
    child: Child,
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn served_sample_snapshot_answers_over_http() {
    let port = allocate_port();
    let addr = format!("127.0.0.1:{port}");
    let _child = spawn_api_process(port);

    wait_for_server(&addr, Duration::from_secs(10));

    let (status, body) = http_get(&addr, "/summary").expect("/summary request should succeed");
    assert_eq!(status, 200);
    let summary: Value = serde_json::from_str(&body).expect("summary body should be JSON");
    assert_eq!(summary["months"].as_u64(), Some(1));
    assert!(summary["total_supply_gwh"].as_f64().unwrap_or(0.0) > 0.0);

    let (status, body) = http_get(&addr, "/consistency").expect("/consistency request should succeed");
    assert_eq!(status, 200);
    let report: Value = serde_json::from_str(&body).expect("consistency body should be JSON");
    assert_eq!(report["ok"], true);

    let (status, body) = http_get(&addr, "/series/wind?view=hourly_total")
        .expect("/series request should succeed");
    assert_eq!(status, 200);
    let series: Value = serde_json::from_str(&body).expect("series body should be JSON");
    let values = series["values"].as_object().expect("values should be an object");
    assert_eq!(values.len(), 24);

    let (status, _) = http_get(&addr, "/series/nuclear").expect("/series request should succeed");
    assert_eq!(status, 404);
}

fn allocate_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("ephemeral port bind should succeed");
    let port = listener
        .local_addr()
        .expect("local_addr should be available")
        .port();
    drop(listener);
    port
}

fn spawn_api_process(port: u16) -> ChildGuard {
    let child = Command::new(env!("CARGO_BIN_EXE_re100-agg"))
        .args(["--sample", "--serve", "--port", &port.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("re100-agg process should spawn");

    ChildGuard { child }
}

fn wait_for_server(addr: &str, timeout: Duration) {
    let start = Instant::now();
    loop {
        if let Ok((200, _)) = http_get(addr, "/summary") {
            return;
        }

        if start.elapsed() >= timeout {
            panic!("timed out waiting for API server on {addr}");
        }

        thread::sleep(Duration::from_millis(50));
    }
}

fn http_get(addr: &str, path: &str) -> Result<(u16, String), String> {
    let mut stream = TcpStream::connect(addr).map_err(|err| format!("connect: {err}"))?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream
        .write_all(request.as_bytes())
        .map_err(|err| format!("write: {err}"))?;

    let mut raw = String::new();
    stream
        .read_to_string(&mut raw)
        .map_err(|err| format!("read: {err}"))?;

    let (head, body) = raw
        .split_once("\r\n\r\n")
        .ok_or_else(|| "invalid HTTP response".to_string())?;
    let status_line = head
        .lines()
        .next()
        .ok_or_else(|| "missing status line".to_string())?;
    let status_code = status_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| "missing status code".to_string())?
        .parse::<u16>()
        .map_err(|err| format!("invalid status code: {err}"))?;

    Ok((status_code, body.to_string()))
}
