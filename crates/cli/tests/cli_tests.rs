// End-to-end tests for the `regrade` binary.
//
// Each test works in its own temp dir and points REGRADE_SETTINGS there, so the
// user's real settings file is never read or created.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::{tempdir, TempDir};

const HEADER: &str = "ФИО,Наименование НЭ,Оценка НЭ,Оценка дисциплины-пререквизита,\
Внешнее измерение цифровых компетенций. Входной контроль,\
Внешнее измерение цифровых компетенций. Промежуточный контроль,\
Внешнее измерение цифровых компетенций. Итоговый контроль";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self { dir: tempdir().unwrap() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn grades(&self) -> PathBuf {
        self.write(
            "grades.csv",
            &format!(
                "{HEADER}\n\
                 Иванов,Экзамен по программированию,7,9,2,3,4\n\
                 ,,,,,,\n\
                 Петров,Экзамен,2,,,,\n"
            ),
        )
    }

    fn regrade(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_regrade"));
        cmd.current_dir(self.dir.path());
        cmd.env("REGRADE_SETTINGS", self.path("settings.json"));
        cmd.env_remove("RUST_LOG");
        cmd
    }
}

fn run(mut cmd: Command, args: &[&str]) -> Output {
    cmd.args(args).output().expect("spawn regrade")
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn run_writes_annotated_csv() {
    let ws = Workspace::new();
    let input = ws.grades();
    let out = ws.path("out.csv");

    let output = run(ws.regrade(), &["run", arg(&input), "--output", arg(&out)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let content = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], format!("{HEADER},Этап,ДПР_итог,НЭ_итог"));
    // Prerequisite 9 is written back clamped to 8
    assert_eq!(lines[1], "Иванов,Экзамен по программированию,7,8,2,3,4,2,,8");
    assert_eq!(lines[2], "Петров,Экзамен,2,,,,,1,,");

    let err = stderr(&output);
    assert!(err.contains("2 records"), "{err}");
    assert!(err.contains("wrote"), "{err}");
}

#[test]
fn run_json_is_a_single_value() {
    let ws = Workspace::new();
    let input = ws.grades();
    let out = ws.path("out.xlsx");

    let output = run(
        ws.regrade(),
        &["run", arg(&input), "--output", arg(&out), "--json", "--quiet"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out.exists());
    assert!(stderr(&output).is_empty(), "quiet run wrote: {}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let val: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(val["meta"]["use_dynamics"], false);
    assert_eq!(val["summary"]["total_records"], 2);
    assert_eq!(val["summary"]["exam_credited"], 1);
    assert_eq!(val["records"][0]["stage"], "interim");
    assert_eq!(val["records"][0]["exam_credit"]["rule"], "prerequisite_dominant");
    assert_eq!(val["records"][0]["exam_credit"]["credit"], 8.0);
    assert_eq!(val["records"][1]["prerequisite_credit"]["rule"], "exam_failed");
}

#[test]
fn run_names_result_after_input() {
    let ws = Workspace::new();
    let input = ws.grades();
    ws.write("settings.json", "{ \"output.format\": \"csv\" }");

    let output = run(ws.regrade(), &["run", arg(&input)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let names: Vec<String> = fs::read_dir(ws.dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("Результат_grades_"))
        .collect();
    assert_eq!(names.len(), 1, "{names:?}");
    assert!(names[0].ends_with(".csv"));
}

#[test]
fn dynamics_flag_vetoes_regression() {
    let ws = Workspace::new();
    let input = ws.write(
        "drop.csv",
        &format!("{HEADER}\nСидоров,Экзамен,6,5,9,5,5\n"),
    );
    let out = ws.path("out.csv");

    let plain = run(ws.regrade(), &["run", arg(&input), "-o", arg(&out)]);
    assert!(plain.status.success());
    let content = fs::read_to_string(&out).unwrap();
    assert!(content.ends_with(",1,9,9\n"), "{content}");

    let gated = run(ws.regrade(), &["run", arg(&input), "-o", arg(&out), "--dynamics"]);
    assert!(gated.status.success());
    let content = fs::read_to_string(&out).unwrap();
    assert!(content.ends_with(",1,,\n"), "{content}");
    assert!(stderr(&gated).contains("1 vetoed"), "{}", stderr(&gated));
}

#[test]
fn no_dynamics_overrides_settings() {
    let ws = Workspace::new();
    ws.write("settings.json", "{ \"recon.useDynamics\": true }");
    let input = ws.write(
        "drop.csv",
        &format!("{HEADER}\nСидоров,Экзамен,6,5,9,5,5\n"),
    );
    let out = ws.path("out.csv");

    let gated = run(ws.regrade(), &["run", arg(&input), "-o", arg(&out)]);
    assert!(gated.status.success(), "stderr: {}", stderr(&gated));
    let content = fs::read_to_string(&out).unwrap();
    assert!(content.ends_with(",1,,\n"), "{content}");

    let plain = run(ws.regrade(), &["run", arg(&input), "-o", arg(&out), "--no-dynamics"]);
    assert!(plain.status.success(), "stderr: {}", stderr(&plain));
    let content = fs::read_to_string(&out).unwrap();
    assert!(content.ends_with(",1,9,9\n"), "{content}");
}

#[test]
fn missing_column_exits_3() {
    let ws = Workspace::new();
    let input = ws.write("bad.csv", "Наименование НЭ,Оценка НЭ\nЭкзамен,5\n");
    let out = ws.path("out.csv");

    let output = run(ws.regrade(), &["run", arg(&input), "-o", arg(&out)]);
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("missing required column"), "{err}");
    assert!(err.contains("hint:"), "{err}");
    assert!(!out.exists());
}

#[test]
fn unsupported_input_exits_2() {
    let ws = Workspace::new();
    let input = ws.write("grades.pdf", "x");
    let output = run(ws.regrade(), &["run", arg(&input)]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unreadable_input_exits_5() {
    let ws = Workspace::new();
    let output = run(ws.regrade(), &["run", arg(&ws.path("absent.csv"))]);
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn profile_maps_columns() {
    let ws = Workspace::new();
    let profile = ws.write(
        "en.regrade.toml",
        r#"name = "english"

[columns]
subject_name = "Subject"
exam_grade = "Exam"
prerequisite_grade = "Prereq"
checkpoint_input = "C1"
checkpoint_interim = "C2"
checkpoint_final = "C3"

[stages]
final = ["data analysis"]
interim = ["programming"]

[output]
stage = "Stage"
prerequisite_credit = "PrereqCredit"
exam_credit = "ExamCredit"
"#,
    );
    let input = ws.write(
        "en.csv",
        "Subject;Exam;Prereq;C1;C2;C3\nData Analysis exam;5;5;1;2;7\n",
    );
    let out = ws.path("out.csv");

    let output = run(
        ws.regrade(),
        &["run", arg(&input), "--config", arg(&profile), "-o", arg(&out)],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let content = fs::read_to_string(&out).unwrap();
    assert_eq!(
        content,
        "Subject,Exam,Prereq,C1,C2,C3,Stage,PrereqCredit,ExamCredit\n\
         Data Analysis exam,5,5,1,2,7,3,7,7\n"
    );
}

#[test]
fn validate_rejects_bad_profile() {
    let ws = Workspace::new();
    let good = ws.write("good.toml", "name = \"ok\"\n");
    let bad = ws.write("bad.toml", "[output]\nstage = \"Оценка НЭ\"\n");

    let output = run(ws.regrade(), &["validate", arg(&good)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("valid: profile 'ok'"));

    let output = run(ws.regrade(), &["validate", arg(&bad)]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn explain_prints_deciding_rules() {
    let ws = Workspace::new();
    let output = run(
        ws.regrade(),
        &[
            "explain",
            "--subject",
            "Экзамен по анализу данных",
            "--exam",
            "5",
            "--prerequisite",
            "5",
            "--final",
            "7",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("final (3)"), "{stdout}");
    assert!(stdout.contains("7  [external_dominant]"), "{stdout}");
}

#[test]
fn explain_json() {
    let ws = Workspace::new();
    let output = run(
        ws.regrade(),
        &["explain", "--subject", "Экзамен", "--exam", "3", "--input", "9", "--json"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(val["stage"], "input");
    assert_eq!(val["prerequisite_credit"]["rule"], "exam_failed");
    assert!(val["exam_credit"]["credit"].is_null());
}

#[test]
fn columns_lists_default_headers() {
    let ws = Workspace::new();
    let output = run(ws.regrade(), &["columns"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 6);
    assert!(stdout.contains("Оценка дисциплины-пререквизита"));
    assert!(stdout.contains("Внешнее измерение цифровых компетенций. Итоговый контроль"));
}
