use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn livecall() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("livecall").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn eval_prints_plain_text() {
    livecall()
        .args(["eval", "1+1"])
        .assert()
        .success()
        .stdout("2\n");

    livecall()
        .args(["eval", "x = 1.5; x * 2"])
        .assert()
        .success()
        .stdout("3.0\n");
}

#[test]
fn eval_reports_kernel_errors() {
    livecall()
        .args(["eval", "nope + 1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("UndefVarError: `nope` not defined"));

    livecall()
        .args(["eval", "1 +"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parser error"));
}

#[test]
fn display_forced_html_writes_page() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let output = dir.path().join("out").join("value.html");

    livecall()
        .current_dir(dir.path())
        .args(["display", r#"html("<b>bold</b>")"#, "--mime", "text/html", "--output"])
        .arg(&output)
        .assert()
        .success();

    let html = fs::read_to_string(&output)?;
    assert!(html.contains("<b>bold</b>"));
    assert!(html.contains("output-markup"));
    Ok(())
}

#[test]
fn display_to_stdout() {
    livecall()
        .args(["display", "41 + 1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<pre>42</pre>"));
}

#[test]
fn render_notebook_continues_after_failed_cell() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let notebook = dir.path().join("demo.md");
    fs::write(
        &notebook,
        r#"# Demo

Some *prose*.

```live-eval
total = sum(range(1, 10))
```

```live
missing_variable
```

```live
total
```

```live mime=text/latex
total
```
"#,
    )?;

    let assert = livecall()
        .current_dir(dir.path())
        .arg("render")
        .arg(&notebook)
        .assert()
        .success();
    let html = String::from_utf8(assert.get_output().stdout.clone())?;

    assert!(html.contains("<title>demo</title>"));
    assert!(html.contains("<em>prose</em>"));
    assert!(html.contains("UndefVarError: `missing_variable` not defined"));
    assert!(html.contains("<pre>55</pre>"));
    assert!(html.contains(r"\[55\]"));
    assert!(!html.contains("$55$"));
    Ok(())
}

#[test]
fn render_missing_notebook_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    livecall()
        .current_dir(dir.path())
        .args(["render", "missing.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read notebook"));
    Ok(())
}

#[test]
fn config_helper_script_controls_float_digits() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("short.lc"), "display_float_digits = 2\n")?;
    fs::write(
        dir.path().join("livecall.yml"),
        r#"
runtime:
  helper_script: "short.lc"
"#,
    )?;

    livecall()
        .current_dir(dir.path())
        .args(["eval", "1.0 / 3"])
        .assert()
        .success()
        .stdout("0.33\n");

    livecall()
        .args(["eval", "1.0 / 3"])
        .assert()
        .success()
        .stdout("0.333333\n");
    Ok(())
}

#[test]
fn invalid_config_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("livecall.yml"), "runtime: [not, a, map]\n")?;

    livecall()
        .current_dir(dir.path())
        .args(["eval", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
    Ok(())
}
