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

#[test]
fn catalog_defaults_patch_and_persist() {
    let workspace = temp_dir("coursebook-setup-catalog");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let setup = request_ok(&mut stdin, &mut reader, "2", "setup.get", json!({}));
    assert_eq!(
        setup["catalog"]["disciplines"],
        json!(["Computer", "Electrical", "Civil", "Mechanical", "Architecture", "Other"])
    );
    assert_eq!(
        setup["catalog"]["weekdays"],
        json!(["Saturday", "Sunday", "Monday", "Tuesday", "Wednesday"])
    );
    assert_eq!(setup["catalog"]["otherDiscipline"], "Other");
    assert_eq!(setup["catalog"]["unknownLabel"], "Unknown");

    for (id, patch) in [
        ("3a", json!({ "disciplines": [] })),
        ("3b", json!({ "disciplines": ["Civil", "Civil"] })),
        ("3c", json!({ "otherDiscipline": "Music" })),
        ("3d", json!({ "colour": "blue" })),
        ("3e", json!({ "weekdays": "Monday" })),
    ] {
        let code = request_err_code(
            &mut stdin,
            &mut reader,
            id,
            "setup.update",
            json!({ "section": "catalog", "patch": patch }),
        );
        assert_eq!(code, "bad_params", "{}", id);
    }
    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "3f",
        "setup.update",
        json!({ "section": "printer", "patch": {} }),
    );
    assert_eq!(code, "bad_params");

    request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "setup.update",
        json!({
            "section": "catalog",
            "patch": { "disciplines": ["Computer", "Music", "Other"], "weekdays": ["Monday", "Thursday"] }
        }),
    );

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "5",
        "form.create",
        json!({
            "entity": "course",
            "values": { "name": "Statics", "credits": 2, "discipline": "Civil" }
        }),
    );
    assert_eq!(code, "invalid_selection");
    request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "form.create",
        json!({
            "entity": "course",
            "values": { "name": "Harmony", "credits": 2, "discipline": "Music" }
        }),
    );

    let described = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "schema.describe",
        json!({ "entity": "offering" }),
    );
    let day = described["fields"]
        .as_array()
        .expect("fields")
        .iter()
        .find(|f| f["field"] == "day")
        .cloned()
        .expect("day field");
    assert_eq!(day["options"], json!(["Monday", "Thursday"]));

    // Settings live in the workspace database.
    request_ok(&mut stdin, &mut reader, "8", "workspace.close", json!({}));
    let reopened = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(reopened["counts"]["course"], 1);
    let setup = request_ok(&mut stdin, &mut reader, "10", "setup.get", json!({}));
    assert_eq!(
        setup["catalog"]["disciplines"],
        json!(["Computer", "Music", "Other"])
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
