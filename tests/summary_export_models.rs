use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_daemon() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_registerd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn registerd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn result(resp: &serde_json::Value) -> &serde_json::Value {
    assert_eq!(
        resp.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "expected ok response, got {}",
        resp
    );
    resp.get("result").expect("result")
}

struct Daemon {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    next_id: u32,
}

impl Daemon {
    fn start(workspace: &PathBuf) -> Daemon {
        let (child, stdin, reader) = spawn_daemon();
        let mut d = Daemon {
            child,
            stdin,
            reader,
            next_id: 0,
        };
        let resp = d.call(
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        result(&resp);
        d
    }

    fn call(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        request(&mut self.stdin, &mut self.reader, &id, method, params)
    }

    fn add(&mut self, name: &str, matric: &str, course: &str, date: &str, status: &str) {
        let resp = self.call(
            "attendance.add",
            json!({ "name": name, "matric": matric, "course": course, "date": date, "status": status }),
        );
        result(&resp);
    }

    fn shutdown(mut self) {
        drop(self.stdin);
        let _ = self.child.wait();
    }
}

fn seed(d: &mut Daemon) {
    d.add("Ada", "S1", "Math", "01-09-2025", "Present");
    d.add("Grace", "S2", "Math", "01-09-2025", "Absent");
    d.add("Linus", "S3", "Math", "02-09-2025", "Present");
    d.add("Ada", "S1", "Physics", "01-09-2025", "Excused");
}

#[test]
fn daily_summary_buckets_by_status() {
    let ws = temp_dir("registerd-summary");
    let mut d = Daemon::start(&ws);
    seed(&mut d);

    let resp = d.call("summary.daily", json!({ "date": "01-09-2025" }));
    let rows = result(&resp)["rows"].as_array().unwrap().clone();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["course"], "Math");
    assert_eq!(rows[0]["Present"], 1);
    assert_eq!(rows[0]["Absent"], 1);
    assert_eq!(rows[0]["Excused"], 0);
    assert_eq!(rows[1]["course"], "Physics");
    assert_eq!(rows[1]["Excused"], 1);

    let filtered = d.call(
        "summary.daily",
        json!({ "date": "01-09-2025", "course": "Physics" }),
    );
    assert_eq!(result(&filtered)["rows"].as_array().unwrap().len(), 1);

    d.shutdown();
    let _ = std::fs::remove_dir_all(ws);
}

#[test]
fn summary_without_matches_is_no_records_not_zeros() {
    let ws = temp_dir("registerd-summary-empty");
    let mut d = Daemon::start(&ws);
    seed(&mut d);

    let resp = d.call("summary.daily", json!({ "date": "25-12-2025" }));
    assert_eq!(result(&resp)["noRecords"], true);
    assert!(result(&resp).get("rows").is_none());

    let resp = d.call("summary.daily", json!({ "date": "bad-date" }));
    assert_eq!(resp["error"]["code"], "bad_params");

    d.shutdown();
    let _ = std::fs::remove_dir_all(ws);
}

#[test]
fn edit_moves_counts_between_buckets() {
    let ws = temp_dir("registerd-summary-edit");
    let mut d = Daemon::start(&ws);
    d.add("Ada", "S1", "Math", "01-09-2025", "Present");

    result(&d.call("attendance.beginEdit", json!({ "course": "Math", "index": 0 })));
    result(&d.call(
        "attendance.saveEdit",
        json!({ "name": "Ada", "matric": "S1", "status": "Excused" }),
    ));

    let resp = d.call(
        "summary.daily",
        json!({ "date": "01-09-2025", "course": "Math" }),
    );
    let rows = result(&resp)["rows"].as_array().unwrap().clone();
    assert_eq!(rows[0]["Present"], 0);
    assert_eq!(rows[0]["Excused"], 1);

    d.shutdown();
    let _ = std::fs::remove_dir_all(ws);
}

#[test]
fn export_model_carries_tables_summary_and_filename() {
    let ws = temp_dir("registerd-export");
    let mut d = Daemon::start(&ws);
    seed(&mut d);

    let resp = d.call(
        "export.attendanceModel",
        json!({ "summaryDate": "01-09-2025" }),
    );
    let model = result(&resp);

    let sections = model["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["course"], "Math");
    assert_eq!(
        sections[0]["head"],
        json!(["Name", "Matric No", "Date", "Status"])
    );
    let rows = sections[0]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], json!(["Ada", "S1", "01-09-2025", "Present"]));

    assert_eq!(
        model["summary"]["head"],
        json!(["Course", "Present", "Absent", "Excused"])
    );
    assert_eq!(
        model["summary"]["rows"].as_array().unwrap()[0],
        json!(["Math", 1, 1, 0])
    );

    // attendance_<YYYY-MM-DD_HH-mm>.pdf
    let file_name = model["fileName"].as_str().unwrap();
    assert!(file_name.starts_with("attendance_"), "{file_name}");
    assert!(file_name.ends_with(".pdf"), "{file_name}");
    let stamp = &file_name["attendance_".len()..file_name.len() - ".pdf".len()];
    assert_eq!(stamp.len(), "2025-01-01_00-00".len(), "{stamp}");
    assert_eq!(&stamp[10..11], "_");
    assert!(stamp
        .chars()
        .all(|c| c.is_ascii_digit() || c == '-' || c == '_'));

    d.shutdown();
    let _ = std::fs::remove_dir_all(ws);
}

#[test]
fn export_filter_restricts_sections_and_summary() {
    let ws = temp_dir("registerd-export-filter");
    let mut d = Daemon::start(&ws);
    seed(&mut d);

    let resp = d.call(
        "export.attendanceModel",
        json!({ "course": "Physics", "summaryDate": "02-09-2025" }),
    );
    let model = result(&resp);
    let sections = model["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0]["course"], "Physics");
    // Physics has nothing on the 2nd: the summary says so instead of a
    // zero-filled table.
    assert_eq!(model["summary"]["noRecords"], true);

    d.shutdown();
    let _ = std::fs::remove_dir_all(ws);
}
