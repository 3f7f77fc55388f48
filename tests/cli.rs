use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, file: &str) {
    let path = root.join(file);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

fn project() -> tempfile::TempDir {
    let temp_dir = tempdir().unwrap();
    write(temp_dir.path(), "src/routes/+page.svelte");
    write(temp_dir.path(), "src/routes/blog/[slug]/+page.svelte");
    write(temp_dir.path(), "src/routes/api/items/+server.js");
    temp_dir
}

fn cli() -> Command {
    Command::cargo_bin("route_manifest").unwrap()
}

#[test]
fn prints_manifest_as_json() {
    let temp_dir = project();
    let output = cli().arg("--cwd").arg(temp_dir.path()).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<_> = json["routes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|route| route["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["", "api", "blog", "api/items", "blog/[slug]"]);
    assert_eq!(json["nodes"][2]["component"], "src/routes/+page.svelte");
}

#[test]
fn prints_manifest_as_text() {
    let temp_dir = project();
    let output = cli()
        .arg("--cwd")
        .arg(temp_dir.path())
        .args(["--output", "text"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("blog/[slug]"));
    assert!(stdout.contains("endpoint"));
    assert!(stdout.contains("5 routes, 4 nodes, 0 matchers, 0 assets"));
}

#[test]
fn resolves_a_pathname() {
    let temp_dir = project();
    let output = cli()
        .arg("--cwd")
        .arg(temp_dir.path())
        .args(["--match", "/blog/hello-world", "--output", "text"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, "blog/[slug]\n  slug = hello-world\n");
}

#[test]
fn fails_when_nothing_matches() {
    let temp_dir = project();
    let output = cli()
        .arg("--cwd")
        .arg(temp_dir.path())
        .args(["--match", "/nope/nope"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Error: No route matches /nope/nope"));
}

#[test]
fn reports_build_errors() {
    let temp_dir = tempdir().unwrap();
    write(temp_dir.path(), "src/routes/(x)/a/+page.svelte");
    write(temp_dir.path(), "src/routes/(y)/a/+page.svelte");

    let output = cli().arg("--cwd").arg(temp_dir.path()).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Error: (x)/a and (y)/a occupy the same route"));
}

#[test]
fn reads_config_file() {
    let temp_dir = tempdir().unwrap();
    write(temp_dir.path(), "app/pages/about/+page.svelte");
    fs::write(
        temp_dir.path().join("routes.json"),
        r#"{ "routes": "app/pages" }"#,
    )
    .unwrap();

    let output = cli()
        .arg("--config")
        .arg(temp_dir.path().join("routes.json"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["routes"][1]["id"], "about");
    assert_eq!(json["nodes"][2]["component"], "app/pages/about/+page.svelte");
}

#[test]
fn flags_override_config_file() {
    let temp_dir = tempdir().unwrap();
    write(temp_dir.path(), "app/pages/+page.jazz");
    fs::write(
        temp_dir.path().join("routes.json"),
        r#"{ "routes": "app/pages", "extensions": [".svelte"] }"#,
    )
    .unwrap();

    let output = cli()
        .arg("--config")
        .arg(temp_dir.path().join("routes.json"))
        .args(["--extensions", ".jazz,.svelte"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["nodes"][2]["component"], "app/pages/+page.jazz");
}

#[test]
fn rejects_bad_extension() {
    let temp_dir = project();
    let output = cli()
        .arg("--cwd")
        .arg(temp_dir.path())
        .args(["--extensions", "svelte"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("must start with '.'"));
}
