use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output};
use std::thread;
use std::time::{Duration, Instant};

fn ideas_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ideas"))
}

fn ideas(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(ideas_bin())
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env_remove("IDEAS_DATA_DIR")
        .env_remove("IDEAS_JWT_SECRET")
        .env("RUST_LOG", "warn")
        .output()
        .expect("run ideas binary")
}

fn write_legacy_files(dir: &Path) -> (PathBuf, PathBuf) {
    let summary = dir.join("summary.json");
    let detailed = dir.join("detailed.json");
    fs::write(
        &summary,
        serde_json::to_vec(&serde_json::json!({
            "1": {
                "title": "Clinic queue app",
                "description": "Token system for small clinics",
                "category": "HealthTech",
                "investmentAmount": "₹1.2 Cr",
                "timeToMarket": "6 months",
                "tags": ["clinics", "queues"]
            },
            "2": {
                "title": "Chai subscription",
                "description": "Office tea delivery",
                "category": "Food",
                "investmentAmount": "5L",
                "tags": ["beverages"]
            }
        }))
        .unwrap(),
    )
    .unwrap();
    fs::write(
        &detailed,
        serde_json::to_vec(&serde_json::json!([{
            "id": 101,
            "title": "Tractor sharing",
            "detailedDescription": "Hourly rental of farm equipment",
            "category": "Agritech",
            "investment": "25 lakhs",
            "timeToMarket": "1-3 months",
            "marketAnalysis": { "marketSize": "National" },
            "businessModel": "marketplace",
            "revenueStreams": ["Rental fees"],
            "requiredSkills": "Logistics",
            "tags": ["farming"]
        }]))
        .unwrap(),
    )
    .unwrap();
    (summary, detailed)
}

#[test]
fn test_migrate_then_list_reads_the_same_store() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let (summary, detailed) = write_legacy_files(tmp.path());

    let out = ideas(
        &data,
        &[
            "migrate",
            "--summary",
            summary.to_str().unwrap(),
            "--detailed",
            detailed.to_str().unwrap(),
            "--json",
        ],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["summaryRecords"], 2);
    assert_eq!(report["detailedRecords"], 1);
    assert_eq!(report["inserted"], 3);

    let out = ideas(&data, &["list", "--source", "static", "--sort", "title", "--json"]);
    assert!(out.status.success());
    let page: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(page["total"], 3);
    assert_eq!(page["items"][0]["title"], "Chai subscription");
    assert_eq!(page["items"][2]["category"], "Agriculture");
}

#[test]
fn test_list_does_not_write_the_store() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");

    let out = ideas(&data, &["list", "--json"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(!data.join("ideas.json").exists());

    let (summary, detailed) = write_legacy_files(tmp.path());
    let out = ideas(
        &data,
        &[
            "migrate",
            "--summary",
            summary.to_str().unwrap(),
            "--detailed",
            detailed.to_str().unwrap(),
        ],
    );
    assert!(out.status.success());
    let before = fs::read(data.join("ideas.json")).unwrap();

    let out = ideas(&data, &["list", "--page", &usize::MAX.to_string()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(fs::read(data.join("ideas.json")).unwrap(), before);
}

#[test]
fn test_unreadable_legacy_file_exits_with_two() {
    let tmp = tempfile::tempdir().unwrap();
    let bad = tmp.path().join("summary.json");
    fs::write(&bad, b"{ not json").unwrap();

    let out = ideas(
        &tmp.path().join("data"),
        &[
            "migrate",
            "--summary",
            bad.to_str().unwrap(),
            "--detailed",
            tmp.path().join("missing.json").to_str().unwrap(),
        ],
    );
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn test_corrupt_store_exits_with_one() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("ideas.json"), b"garbage").unwrap();
    let (summary, detailed) = write_legacy_files(tmp.path());

    let out = ideas(
        &data,
        &[
            "migrate",
            "--summary",
            summary.to_str().unwrap(),
            "--detailed",
            detailed.to_str().unwrap(),
        ],
    );
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_serve_refuses_to_start_without_a_secret() {
    let tmp = tempfile::tempdir().unwrap();
    let out = ideas(&tmp.path().join("data"), &["serve", "--listen", "127.0.0.1:0"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("IDEAS_JWT_SECRET"));
}

struct ChildGuard {
    child: Child,
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().unwrap().to_string()
}

fn http(
    addr: &str,
    method: &str,
    path: &str,
    body: Option<&serde_json::Value>,
    token: Option<&str>,
) -> std::io::Result<(u16, serde_json::Value)> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(Duration::from_secs(5))).ok();

    let body_bytes = body
        .map(|b| serde_json::to_vec(b).unwrap())
        .unwrap_or_default();
    let mut request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        body_bytes.len()
    );
    if let Some(tok) = token {
        request.push_str(&format!("Authorization: Bearer {tok}\r\n"));
    }
    request.push_str("\r\n");
    stream.write_all(request.as_bytes())?;
    stream.write_all(&body_bytes)?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response)?;
    let response = String::from_utf8_lossy(&response);
    let status = response
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let (_, body_text) = response.split_once("\r\n\r\n").unwrap_or(("", ""));
    let json = serde_json::from_str(body_text).unwrap_or(serde_json::Value::Null);
    Ok((status, json))
}

fn wait_until_ready(addr: &str) {
    let deadline = Instant::now() + Duration::from_secs(20);
    while Instant::now() < deadline {
        if let Ok((200, _)) = http(addr, "GET", "/healthz", None, None) {
            return;
        }
        thread::sleep(Duration::from_millis(100));
    }
    panic!("server at {addr} did not become ready");
}

#[test]
fn test_serve_registers_users_and_accepts_ideas() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = free_addr();
    let child = Command::new(ideas_bin())
        .arg("--data-dir")
        .arg(tmp.path().join("data"))
        .args(["serve", "--listen", &addr, "--jwt-secret", "e2e-secret"])
        .env("RUST_LOG", "warn")
        .spawn()
        .expect("spawn server");
    let _guard = ChildGuard { child };
    wait_until_ready(&addr);

    let (status, body) = http(
        &addr,
        "POST",
        "/api/auth/register",
        Some(&serde_json::json!({
            "name": "Asha",
            "email": "asha@example.com",
            "password": "secret123"
        })),
        None,
    )
    .unwrap();
    assert_eq!(status, 201, "{body}");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = http(
        &addr,
        "POST",
        "/api/ideas",
        Some(&serde_json::json!({
            "title": "Repair cafe",
            "description": "Neighbourhood electronics repair",
            "category": "Other",
            "investmentRange": "₹1-5 Lakhs",
            "timeToStart": "Immediately",
            "businessModel": "B2C",
            "marketSize": "Local (City/Town)",
            "keyFeatures": ["Walk-in repairs"],
            "revenueStreams": ["Repair fees"],
            "requiredSkills": ["Soldering"],
            "contact": { "email": "asha@example.com" }
        })),
        Some(&token),
    )
    .unwrap();
    assert_eq!(status, 201, "{body}");

    let (status, body) = http(&addr, "GET", "/api/ideas?source=community", None, None).unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["uploadedByName"], "Asha");

    let (status, _) = http(&addr, "POST", "/api/ideas", Some(&serde_json::json!({})), None).unwrap();
    assert_eq!(status, 401);
}
