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

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_coursebookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn coursebookd");
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
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err_code(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded",
        method
    );
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn token_for(view: &serde_json::Value, field: &str, label: &str) -> String {
    view["choices"][field]
        .as_array()
        .expect("choice list")
        .iter()
        .find(|o| o["label"] == label)
        .and_then(|o| o["token"].as_str())
        .unwrap_or_else(|| panic!("no {} choice labelled {}", field, label))
        .to_string()
}

fn create(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    entity: &str,
    values: serde_json::Value,
) -> i64 {
    let out = request_ok(
        stdin,
        reader,
        id,
        "form.create",
        json!({ "entity": entity, "values": values }),
    );
    out["id"].as_i64().expect("created id")
}

/// One instructor, courses in Computer and Civil, one offering each,
/// students Sara (Computer) and Ali (Civil).
fn seed(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>) {
    create(
        stdin,
        reader,
        "seed-1",
        "instructor",
        json!({ "name": "Dr. Rahimi", "credential": "PhD", "phone": "0912" }),
    );
    create(
        stdin,
        reader,
        "seed-2",
        "course",
        json!({ "name": "Algorithms", "credits": 3, "discipline": "Computer" }),
    );
    create(
        stdin,
        reader,
        "seed-3",
        "course",
        json!({ "name": "Statics", "credits": 2, "discipline": "Civil" }),
    );
    let view = request_ok(stdin, reader, "seed-4", "form.open", json!({ "entity": "offering" }));
    let instructor = token_for(&view, "instructorId", "Dr. Rahimi");
    for (i, (course, day)) in [("Algorithms", "Saturday"), ("Statics", "Monday")]
        .iter()
        .enumerate()
    {
        create(
            stdin,
            reader,
            &format!("seed-5-{}", i),
            "offering",
            json!({
                "instructorId": instructor,
                "courseId": token_for(&view, "courseId", course),
                "day": day
            }),
        );
    }
    for (i, (name, discipline)) in [("Sara", "Computer"), ("Ali", "Civil")].iter().enumerate() {
        create(
            stdin,
            reader,
            &format!("seed-6-{}", i),
            "student",
            json!({
                "name": name,
                "entryTerm": "012",
                "educationLevel": "BSc",
                "phone": "0912",
                "discipline": discipline
            }),
        );
    }
}

fn select_for(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    student: &str,
    offering: &str,
    score: serde_json::Value,
) {
    let view = request_ok(
        stdin,
        reader,
        &format!("{}-open", id),
        "form.open",
        json!({ "entity": "selection" }),
    );
    create(
        stdin,
        reader,
        id,
        "selection",
        json!({
            "studentId": token_for(&view, "studentId", student),
            "offeringId": token_for(&view, "offeringId", offering),
            "score": score
        }),
    );
}

fn student_id(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, name: &str) -> i64 {
    let listed = request_ok(
        stdin,
        reader,
        &format!("find-{}", name),
        "records.list",
        json!({ "entity": "student" }),
    );
    listed["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .find(|r| r["name"] == name)
        .and_then(|r| r["id"].as_i64())
        .expect("student row")
}

#[test]
fn student_average_is_credit_weighted_and_banded() {
    let workspace = temp_dir("coursebook-reports-average");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    seed(&mut stdin, &mut reader);

    // Algorithms carries 3 credits, Statics 2.
    select_for(
        &mut stdin,
        &mut reader,
        "2",
        "Sara",
        "Algorithms (Dr. Rahimi, Saturday)",
        json!(18),
    );
    select_for(
        &mut stdin,
        &mut reader,
        "3",
        "Sara",
        "Statics (Dr. Rahimi, Monday)",
        json!(12),
    );
    let sara = student_id(&mut stdin, &mut reader, "Sara");
    let report = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "reports.studentAverage",
        json!({ "studentId": sara }),
    );
    assert_eq!(report["status"], "scored");
    assert_eq!(report["studentName"], "Sara");
    let avg = report["average"].as_f64().expect("average");
    assert!((avg - 15.6).abs() < 1e-9, "average {}", avg);
    assert_eq!(report["band"], "excellent");
    assert_eq!(report["credits"], 5);
    assert_eq!(report["selections"], 2);

    // Ali: 6 on Algorithms (3 credits) and 18 on Statics (2 credits) -> 10.8.
    select_for(
        &mut stdin,
        &mut reader,
        "5",
        "Ali",
        "Algorithms (Dr. Rahimi, Saturday)",
        json!("6"),
    );
    select_for(
        &mut stdin,
        &mut reader,
        "6",
        "Ali",
        "Statics (Dr. Rahimi, Monday)",
        json!("18"),
    );
    let ali = student_id(&mut stdin, &mut reader, "Ali");
    let report = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "reports.studentAverage",
        json!({ "studentId": ali }),
    );
    let avg = report["average"].as_f64().expect("average");
    assert!((avg - 10.8).abs() < 1e-9, "average {}", avg);
    assert_eq!(report["band"], "average");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn unscored_and_missing_students() {
    let workspace = temp_dir("coursebook-reports-nodata");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    seed(&mut stdin, &mut reader);

    let sara = student_id(&mut stdin, &mut reader, "Sara");
    let report = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "reports.studentAverage",
        json!({ "studentId": sara }),
    );
    assert_eq!(report["status"], "noData");
    assert_eq!(report["studentName"], "Sara");
    assert!(report.get("average").is_none());

    // A selection without a score does not count.
    select_for(
        &mut stdin,
        &mut reader,
        "3",
        "Sara",
        "Algorithms (Dr. Rahimi, Saturday)",
        json!(null),
    );
    let report = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "reports.studentAverage",
        json!({ "studentId": sara }),
    );
    assert_eq!(report["status"], "noData");

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "5",
        "reports.studentAverage",
        json!({ "studentId": 4242 }),
    );
    assert_eq!(code, "not_found");

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "6",
        "reports.studentAverage",
        json!({}),
    );
    assert_eq!(code, "bad_params");

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "7",
        "reports.studentAverage",
        json!({ "studentId": "abc" }),
    );
    assert_eq!(code, "type_error");

    // A numeric string is parsed like form input.
    let report = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "reports.studentAverage",
        json!({ "studentId": sara.to_string() }),
    );
    assert_eq!(report["studentId"], sara);
    assert_eq!(report["studentName"], "Sara");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
