use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::process::Output;
use std::process::Stdio;

fn mojo(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mojo"))
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap()
}

fn mojo_with_stdin(dir: &Path, args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mojo"))
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_templates(dir: &Path, files: &[(&str, &str)]) {
    let templates = dir.join("templates");
    fs::create_dir_all(&templates).unwrap();
    for (name, content) in files {
        fs::write(templates.join(name), content).unwrap();
    }
}

mod render {
    use super::*;

    #[test]
    fn renders_template_with_data_and_partials() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("page.mustache"),
            "<h1>{{title|upper}}</h1>{{#items}}{{> item}}{{/items}}",
        )
        .unwrap();
        fs::write(
            dir.path().join("data.json"),
            r#"{"title": "menu", "items": [{"name": "tea"}, {"name": "<cake>"}]}"#,
        )
        .unwrap();
        write_templates(dir.path(), &[("item.mustache", "<li>{{name}}</li>")]);

        let output = mojo(
            dir.path(),
            &[
                "render",
                "page.mustache",
                "--data",
                "data.json",
                "--partials",
                "templates",
            ],
        );

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(
            stdout(&output),
            "<h1>MENU</h1><li>tea</li><li>&lt;cake&gt;</li>"
        );
    }

    #[test]
    fn reads_template_from_stdin() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("data.json"), r#"{"who": "world"}"#).unwrap();

        let output = mojo_with_stdin(
            dir.path(),
            &["render", "-", "--data", "data.json"],
            "Hello, {{who}}!",
        );

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(stdout(&output), "Hello, world!");
    }

    #[test]
    fn custom_tags_flag() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("t.tpl"), "<% a %> {{a}}").unwrap();
        fs::write(dir.path().join("d.json"), r#"{"a": 1}"#).unwrap();

        let output = mojo(
            dir.path(),
            &["render", "t.tpl", "-d", "d.json", "--tags", "<% %>"],
        );

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(stdout(&output), "1 {{a}}");
    }

    #[test]
    fn wrapped_data_resolves_pipelines_on_nodes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("t.mustache"),
            "{{#user}}{{name|capitalize}}{{/user}}",
        )
        .unwrap();
        fs::write(dir.path().join("d.json"), r#"{"user": {"name": "ada"}}"#).unwrap();

        let output = mojo(
            dir.path(),
            &["render", "t.mustache", "-d", "d.json", "--wrap"],
        );

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(stdout(&output), "Ada");
    }

    #[test]
    fn invalid_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("t.mustache"), "{{a}}").unwrap();
        fs::write(dir.path().join("d.json"), "{not json").unwrap();

        let output = mojo(dir.path(), &["render", "t.mustache", "-d", "d.json"]);

        assert_eq!(output.status.code(), Some(1));
        assert!(
            stderr(&output).contains("Invalid JSON"),
            "stderr: {}",
            stderr(&output)
        );
    }

    #[test]
    fn template_and_data_cannot_both_use_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let output = mojo_with_stdin(dir.path(), &["render", "-", "-d", "-"], "{}");
        assert_eq!(output.status.code(), Some(1));
    }
}

mod check {
    use super::*;

    #[test]
    fn clean_templates_exit_zero() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(
            dir.path(),
            &[("good.mustache", "{{#items}}<li>{{name}}</li>{{/items}}\n")],
        );

        let output = mojo(dir.path(), &["check", "templates/"]);

        assert!(
            output.status.success(),
            "Expected exit 0, got {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            stdout(&output),
            stderr(&output),
        );
    }

    #[test]
    fn broken_template_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(
            dir.path(),
            &[("broken.mustache", "{{#items}}\n<li>{{name}}</li>\n")],
        );

        let output = mojo(dir.path(), &["check", "templates/"]);

        assert_eq!(output.status.code(), Some(1));
        let out = stdout(&output);
        assert!(out.contains("T101"), "Expected T101 in output:\n{out}");
        assert!(out.contains("broken.mustache"), "{out}");
        assert!(
            stderr(&output).contains("Found 1 error in 1 file."),
            "stderr: {}",
            stderr(&output)
        );
    }

    #[test]
    fn ignore_suppresses_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(
            dir.path(),
            &[("broken.mustache", "{{#items}}\n<li>{{name}}</li>\n")],
        );

        let output = mojo(dir.path(), &["check", "--ignore", "T101", "templates/"]);

        assert!(
            output.status.success(),
            "Expected exit 0 with --ignore T101, got {:?}\nstdout: {}",
            output.status.code(),
            stdout(&output),
        );
        assert!(!stdout(&output).contains("T101"));
    }

    #[test]
    fn project_config_downgrades_severity() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("mojo.toml"),
            "[diagnostics.severity]\nT102 = \"warning\"\n",
        )
        .unwrap();
        write_templates(dir.path(), &[("stray.mustache", "a{{/nothing}}b")]);

        let output = mojo(dir.path(), &["check", "templates/"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(
            stdout(&output).contains("warning[T102]"),
            "stdout: {}",
            stdout(&output)
        );
    }

    #[test]
    fn debug_setting_enables_debug_logging() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mojo.toml"), "debug = true\n").unwrap();
        write_templates(dir.path(), &[("fine.mustache", "ok")]);

        let output = Command::new(env!("CARGO_BIN_EXE_mojo"))
            .args(["check", "templates/"])
            .current_dir(dir.path())
            .env_remove("RUST_LOG")
            .output()
            .unwrap();

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(
            stderr(&output).contains("discovered templates"),
            "stderr: {}",
            stderr(&output)
        );
    }

    #[test]
    fn only_configured_extensions_are_checked() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(
            dir.path(),
            &[
                ("notes.txt", "{{#never closed"),
                ("ok.html", "<p>{{body}}</p>"),
            ],
        );

        let output = mojo(dir.path(), &["check", "templates/"]);

        assert!(output.status.success(), "stdout: {}", stdout(&output));
    }

    #[test]
    fn glob_excludes_files() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(
            dir.path(),
            &[("broken.mustache", "{{#open}}"), ("fine.mustache", "ok")],
        );

        let output = mojo(
            dir.path(),
            &["check", "-g", "!broken.mustache", "templates/"],
        );

        assert!(output.status.success(), "stdout: {}", stdout(&output));
    }

    #[test]
    fn stdin_is_checked_when_no_paths() {
        let dir = tempfile::tempdir().unwrap();

        let output = mojo_with_stdin(dir.path(), &["check"], "{{#open}}<p>Hello</p>\n");

        assert_eq!(output.status.code(), Some(1));
        let out = stdout(&output);
        assert!(out.contains("T101"), "Expected T101 in stdin output:\n{out}");
        assert!(out.contains("<stdin>"), "{out}");
    }

    #[test]
    fn empty_directory_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();

        let output = mojo(dir.path(), &["check", "templates/"]);

        assert!(
            output.status.success(),
            "Expected exit 0 for empty dir, got {:?}",
            output.status.code(),
        );
    }
}
