//! CLI integration tests for Polyforge.
//!
//! These tests exercise the full CLI over real manifests in temporary
//! directories. Tests that need a host C compiler are ignored by default.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the polyforge binary command.
fn polyforge() -> Command {
    Command::cargo_bin("polyforge").unwrap()
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// Write a manifest and matching source directories into `dir`.
fn write_project(dir: &TempDir, manifest: &str) {
    fs::write(dir.path().join("Forge.toml"), manifest).unwrap();
    for line in manifest.lines() {
        if let Some(rest) = line.strip_prefix("source = \"") {
            let source = rest.trim_end_matches('"');
            fs::create_dir_all(dir.path().join(source)).unwrap();
        }
    }
}

const DIAMOND: &str = r#"
[project]
name = "diamond"

[[module]]
name = "base"
language = "c"
source = "src/base"

[[module]]
name = "left"
language = "c"
dependencies = ["base"]
source = "src/left"

[[module]]
name = "right"
language = "c"
dependencies = ["base"]
source = "src/right"

[[module]]
name = "top"
language = "c"
dependencies = ["left", "right"]
source = "src/top"
"#;

// ============================================================================
// polyforge graph
// ============================================================================

#[test]
fn test_graph_shows_layers() {
    let tmp = temp_dir();
    write_project(&tmp, DIAMOND);

    polyforge()
        .args(["graph"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("4 modules, 3 layers"))
        .stdout(predicate::str::contains("layer 0: base"))
        .stdout(predicate::str::contains("layer 1: left, right"))
        .stdout(predicate::str::contains("layer 2: top"));
}

#[test]
fn test_graph_json_dump() {
    let tmp = temp_dir();
    write_project(&tmp, DIAMOND);

    let output = polyforge()
        .args(["graph", "--json"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let dump: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(dump["max_parallelism"], 2);
    assert_eq!(dump["layers"][0][0], "base");
    assert_eq!(dump["modules"].as_array().unwrap().len(), 4);
}

#[test]
fn test_graph_reports_cycle_chain() {
    let tmp = temp_dir();
    write_project(
        &tmp,
        r#"
[project]
name = "cyclic"

[[module]]
name = "x"
language = "c"
dependencies = ["y"]
source = "src/x"

[[module]]
name = "y"
language = "c"
dependencies = ["x"]
source = "src/y"
"#,
    );

    polyforge()
        .args(["graph"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("circular dependency: x -> y -> x"));
}

#[test]
fn test_graph_reports_missing_dependency() {
    let tmp = temp_dir();
    write_project(
        &tmp,
        r#"
[project]
name = "broken"

[[module]]
name = "app"
language = "c"
dependencies = ["ghost"]
source = "src/app"
"#,
    );

    polyforge()
        .args(["graph"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("`app`"))
        .stderr(predicate::str::contains("`ghost`"));
}

#[test]
fn test_missing_manifest_is_an_error() {
    let tmp = temp_dir();

    polyforge()
        .args(["graph"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Forge.toml"));
}

// ============================================================================
// polyforge build
// ============================================================================

#[test]
fn test_build_unknown_language_fails_with_plugin_error() {
    let tmp = temp_dir();
    write_project(
        &tmp,
        r#"
[project]
name = "alien"

[[module]]
name = "legacy"
language = "cobol"
source = "src/legacy"
"#,
    );

    polyforge()
        .args(["build"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "no plugin registered for language `cobol`",
        ));
}

#[test]
fn test_build_unknown_module_selection_fails() {
    let tmp = temp_dir();
    write_project(&tmp, DIAMOND);

    polyforge()
        .args(["build", "--module", "ghost"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("module not found: `ghost`"));
}

#[test]
fn test_build_rejects_bad_target_triple() {
    let tmp = temp_dir();
    write_project(&tmp, DIAMOND);

    polyforge()
        .args(["build", "--target", "sparc-plan9-gnu"])
        .current_dir(tmp.path())
        .assert()
        .failure();
}

// Requires a host C compiler.
#[test]
#[ignore]
fn test_build_two_module_c_project() {
    let tmp = temp_dir();
    write_project(
        &tmp,
        r#"
[project]
name = "twomod"

[[module]]
name = "mathlib"
language = "c"
source = "src/mathlib"

[[module]]
name = "app"
language = "c"
dependencies = ["mathlib"]
source = "src/app"
"#,
    );
    fs::write(
        tmp.path().join("src/mathlib/math.c"),
        "int add(int a, int b) { return a + b; }\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("src/app/app.c"),
        "int add(int a, int b);\nint run(void) { return add(1, 2); }\n",
    )
    .unwrap();

    polyforge()
        .args(["build"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("compiled mathlib"))
        .stdout(predicate::str::contains("compiled app"))
        .stdout(predicate::str::contains("2 succeeded, 0 failed, 0 skipped"));
}

// Requires a host C compiler.
#[test]
#[ignore]
fn test_build_failure_skips_dependents_but_counts_siblings() {
    let tmp = temp_dir();
    write_project(&tmp, DIAMOND);
    fs::write(tmp.path().join("src/base/base.c"), "int base(void) { return 1; }\n").unwrap();
    fs::write(tmp.path().join("src/left/left.c"), "this is not C\n").unwrap();
    fs::write(tmp.path().join("src/right/right.c"), "int right(void) { return 2; }\n").unwrap();
    fs::write(tmp.path().join("src/top/top.c"), "int top(void) { return 3; }\n").unwrap();

    polyforge()
        .args(["build"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("failed left"))
        .stdout(predicate::str::contains("compiled right"))
        .stdout(predicate::str::contains("skipped top"));
}

// ============================================================================
// polyforge targets
// ============================================================================

#[test]
fn test_targets_lists_known_triples() {
    polyforge()
        .args(["targets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("x86_64-linux-gnu"))
        .stdout(predicate::str::contains("wasm32"));
}

#[test]
fn test_targets_json_has_availability() {
    let output = polyforge()
        .args(["targets", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let entries: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let list = entries.as_array().unwrap();
    assert!(!list.is_empty());
    for entry in list {
        assert!(entry["triple"].is_string());
        assert!(entry["available"].is_boolean());
    }
}

// ============================================================================
// polyforge extract / glue
// ============================================================================

const INTERFACE_TEXT: &str = "polyforge-interface 1
module mathlib 1.0.0
language c abi cdecl
fn add i32 (a i32, b i32)
fn lock bool (event i32)
";

#[test]
fn test_extract_garbage_artifact_yields_zero_exports() {
    let tmp = temp_dir();
    let junk = tmp.path().join("libjunk.so");
    fs::write(&junk, b"definitely not an object file").unwrap();

    polyforge()
        .arg("extract")
        .arg(&junk)
        .assert()
        .success()
        .stdout(predicate::str::contains("polyforge-interface 1"))
        .stdout(predicate::str::contains("module junk"))
        .stdout(predicate::str::contains("fn ").not());
}

#[test]
fn test_extract_missing_artifact_fails() {
    polyforge()
        .args(["extract", "/nonexistent/libnothing.so"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("extraction failed"));
}

#[test]
fn test_glue_generates_each_destination() {
    let tmp = temp_dir();
    let iface = tmp.path().join("mathlib.pfi");
    fs::write(&iface, INTERFACE_TEXT).unwrap();
    let out = tmp.path().join("out");

    for (lang, file, needle) in [
        ("csharp", "MathlibBindings.cs", "public static extern int Add(int a, int b);"),
        ("python", "mathlib_bindings.py", "def add(a, b):"),
        ("rust", "mathlib_bindings.rs", "pub fn add(a: i32, b: i32) -> i32;"),
    ] {
        polyforge()
            .arg("glue")
            .arg("--interface")
            .arg(&iface)
            .args(["--to", lang])
            .arg("--out-dir")
            .arg(&out)
            .assert()
            .success();

        let generated = fs::read_to_string(out.join(file)).unwrap();
        assert!(generated.contains(needle), "{lang} output missing {needle}");
    }
}

#[test]
fn test_glue_escapes_reserved_words() {
    let tmp = temp_dir();
    let iface = tmp.path().join("mathlib.pfi");
    fs::write(&iface, INTERFACE_TEXT).unwrap();

    polyforge()
        .arg("glue")
        .arg("--interface")
        .arg(&iface)
        .args(["--to", "csharp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bool Lock(int @event);"));
}

#[test]
fn test_glue_unknown_destination_fails() {
    let tmp = temp_dir();
    let iface = tmp.path().join("mathlib.pfi");
    fs::write(&iface, INTERFACE_TEXT).unwrap();

    polyforge()
        .arg("glue")
        .arg("--interface")
        .arg(&iface)
        .args(["--to", "cobol"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not support target language"));
}

#[test]
fn test_glue_rejects_malformed_interface_file() {
    let tmp = temp_dir();
    let iface = tmp.path().join("bad.pfi");
    fs::write(&iface, "not an interface\n").unwrap();

    polyforge()
        .arg("glue")
        .arg("--interface")
        .arg(&iface)
        .args(["--to", "rust"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad interface header"));
}

// Requires a host C compiler and nm.
#[test]
#[ignore]
fn test_extract_then_glue_round_trip() {
    let tmp = temp_dir();
    write_project(
        &tmp,
        r#"
[project]
name = "roundtrip"

[[module]]
name = "mathlib"
language = "c"
source = "src/mathlib"
"#,
    );
    fs::write(
        tmp.path().join("src/mathlib/math.c"),
        "int add(int a, int b) { return a + b; }\n",
    )
    .unwrap();

    polyforge()
        .args(["build"])
        .current_dir(tmp.path())
        .assert()
        .success();

    // The native plugin writes shared libraries under build/<target>/lib.
    let lib = walkdir::WalkDir::new(tmp.path().join("build"))
        .into_iter()
        .filter_map(Result::ok)
        .find(|e| e.file_name().to_string_lossy().contains("mathlib"))
        .expect("built library");

    let iface = tmp.path().join("mathlib.pfi");
    polyforge()
        .arg("extract")
        .arg(lib.path())
        .arg("--out")
        .arg(&iface)
        .current_dir(tmp.path())
        .assert()
        .success();

    polyforge()
        .arg("glue")
        .arg("--interface")
        .arg(&iface)
        .args(["--to", "python"])
        .assert()
        .success()
        .stdout(predicate::str::contains("def add"));
}
