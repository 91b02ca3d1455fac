use api_client::testing::{StubResponse, StubServer};
use assert_cmd::cargo::cargo_bin_cmd;
use pdf_engine::testing::blank_pdf;
use pdf_engine::PageSize;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn write_fixture(dir: &Path, pages: u32) -> PathBuf {
    let bytes = blank_pdf(pages, PageSize::default()).expect("fixture should build");
    let path = dir.join(format!("{pages}-pages.pdf"));
    std::fs::write(&path, bytes).expect("fixture should be written");
    path
}

fn status_lines(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| line.starts_with("Page ") || line.starts_with("already"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn version_prints_package_version() {
    cargo_bin_cmd!("page-analyzer")
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn view_file_walks_pages_and_reports_dwell() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let fixture = write_fixture(temp.path(), 3);

    let output = cargo_bin_cmd!("page-analyzer")
        .arg("view-file")
        .arg(&fixture)
        .write_stdin("n\nn\nn\np\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Time on page:"))
        .stdout(predicate::str::contains("page 2: 2 visits"))
        .get_output()
        .stdout
        .clone();

    insta::assert_snapshot!(status_lines(&output), @r"
    Page 1 of 3  zoom 100%  prev: off  next: on
    Page 2 of 3  zoom 100%  prev: on  next: on
    Page 3 of 3  zoom 100%  prev: on  next: off
    already on the last page
    Page 2 of 3  zoom 100%  prev: on  next: on
    ");
}

#[test]
fn view_file_writes_zoomed_frames() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let fixture = write_fixture(temp.path(), 2);
    let frames = temp.path().join("frames");

    cargo_bin_cmd!("page-analyzer")
        .arg("view-file")
        .arg(&fixture)
        .arg("--output-dir")
        .arg(&frames)
        .write_stdin("+\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("zoom 120%"));

    let frame = image::open(frames.join("page-1.png")).expect("frame should be readable");
    assert_eq!(frame.width(), 734);
    assert_eq!(frame.height(), 950);
}

#[test]
fn unknown_input_is_reported_and_eof_closes() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let fixture = write_fixture(temp.path(), 1);

    cargo_bin_cmd!("page-analyzer")
        .arg("view-file")
        .arg(&fixture)
        .write_stdin("jump\nr\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown command: jump"))
        .stdout(predicate::str::contains("Time on page:"));
}

#[test]
fn view_file_fails_for_missing_file() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("page-analyzer")
        .arg("view-file")
        .arg(temp.path().join("missing.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn view_file_fails_for_invalid_document() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let path = temp.path().join("broken.pdf");
    std::fs::write(&path, b"not a pdf").expect("fixture should be written");

    cargo_bin_cmd!("page-analyzer")
        .arg("view-file")
        .arg(&path)
        .write_stdin("q\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open"));
}

#[test]
fn analytics_requires_login() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("page-analyzer")
        .arg("analytics")
        .arg("--data-dir")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("login required"));
}

#[test]
fn details_requires_login() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("page-analyzer")
        .args(["details", "report.pdf", "--data-dir"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("login required"));
}

#[test]
fn logout_without_login_succeeds() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("page-analyzer")
        .arg("logout")
        .arg("--data-dir")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));
}

#[test]
fn open_still_views_document_when_access_tracking_fails() {
    let pdf = blank_pdf(2, PageSize::default()).expect("fixture should build");
    let stub = StubServer::new()
        .route(
            "POST",
            "/api/track-access",
            StubResponse::json("500 Internal Server Error", r#"{"error":"db down"}"#),
        )
        .route("GET", "/api/pdf/x.pdf", StubResponse::bytes("200 OK", pdf))
        .start()
        .expect("stub should start");

    cargo_bin_cmd!("page-analyzer")
        .args(["--api-base", stub.base().as_str(), "open", "x.pdf"])
        .write_stdin("n\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Page 1 of 2"))
        .stdout(predicate::str::contains("Page 2 of 2"))
        .stdout(predicate::str::contains("Time on page:"));

    assert_eq!(stub.requests(), ["POST /api/track-access", "GET /api/pdf/x.pdf"]);
}

#[test]
fn open_fails_when_document_download_fails() {
    let stub = StubServer::new()
        .route("POST", "/api/track-access", StubResponse::json("200 OK", r#"{"success":true}"#))
        .start()
        .expect("stub should start");

    cargo_bin_cmd!("page-analyzer")
        .args(["--api-base", stub.base().as_str(), "open", "gone.pdf"])
        .write_stdin("q\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open"));
}

#[test]
fn rejected_login_keeps_analytics_locked() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let stub = StubServer::new()
        .route(
            "POST",
            "/api/login",
            StubResponse::json("401 Unauthorized", r#"{"success":false}"#),
        )
        .start()
        .expect("stub should start");

    cargo_bin_cmd!("page-analyzer")
        .args(["--api-base", stub.base().as_str(), "login"])
        .args(["--username", "admin", "--password", "nope"])
        .arg("--data-dir")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid credentials"));

    cargo_bin_cmd!("page-analyzer")
        .args(["--api-base", stub.base().as_str(), "analytics", "--data-dir"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("login required"));
}

#[test]
fn successful_login_unlocks_analytics() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let stub = StubServer::new()
        .route("POST", "/api/login", StubResponse::json("200 OK", r#"{"success":true}"#))
        .route(
            "GET",
            "/api/analytics",
            StubResponse::json(
                "200 OK",
                r#"{
                    "total_views": 5, "unique_pdfs": 1, "today_views": 2,
                    "pdf_stats": [{"filename": "x.pdf", "total_opens": 5}]
                }"#,
            ),
        )
        .start()
        .expect("stub should start");

    cargo_bin_cmd!("page-analyzer")
        .args(["--api-base", stub.base().as_str(), "login"])
        .args(["--username", "admin", "--password", "secret"])
        .arg("--data-dir")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as admin"));

    cargo_bin_cmd!("page-analyzer")
        .args(["--api-base", stub.base().as_str(), "analytics", "--data-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Total views: 5"))
        .stdout(predicate::str::contains("x.pdf"));
}
