use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be monotonic")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("branchtalk-it-{}-{}", name, nanos));
    fs::create_dir_all(&dir).expect("temp dir should be created");
    dir
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bt-cli"))
        .args(args)
        .output()
        .expect("cli should execute")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

const MAIN: &str = "\
# Greeting

* [[Ann]]: Hello `choice`
  * `option` Hi! `next b2`
  * `skip` `set x=1`
    * Bye. `id b2`
";

#[test]
fn agent_start_and_choose_walk_the_dialogue() {
    let dir = temp_dir("agent");
    let file = dir.join("main.md");
    fs::write(&file, MAIN).expect("source should be written");
    let state_0 = dir.join("state0.json");
    let state_1 = dir.join("state1.json");
    let state_2 = dir.join("state2.json");

    let output = run(&[
        "agent",
        "start",
        "--file",
        &path_str(&file),
        "--state-out",
        &path_str(&state_0),
    ]);
    assert!(output.status.success(), "start failed: {}", stdout_of(&output));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("RESULT:OK"));
    assert!(stdout.contains("EVENT:CHOICES"));
    assert!(stdout.contains("CHOICE:0|\"Ann: Hello\""));

    let output = run(&[
        "agent",
        "choose",
        "--state-in",
        &path_str(&state_0),
        "--choice",
        "0",
        "--state-out",
        &path_str(&state_1),
    ]);
    let stdout = stdout_of(&output);
    assert!(output.status.success(), "choose failed: {}", stdout);
    assert!(stdout.contains("LINE_JSON:"));
    assert!(stdout.contains("CHOICE:0|\"Hi!\""));
    assert!(stdout.contains("CHOICE:1|\"Bye.\""));

    let output = run(&[
        "agent",
        "choose",
        "--state-in",
        &path_str(&state_1),
        "--choice",
        "1",
        "--state-out",
        &path_str(&state_2),
    ]);
    let stdout = stdout_of(&output);
    assert!(output.status.success(), "choose failed: {}", stdout);
    assert!(stdout.contains("EVENT:END"));

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&state_2).expect("state should exist"))
            .expect("state should be json");
    assert_eq!(saved["schemaVersion"], "player-state.v1");
    assert_eq!(saved["snapshot"]["state"]["x"], 1.0);
    assert_eq!(saved["snapshot"]["state"]["line.b2"], true);
}

#[test]
fn agent_choose_rejects_out_of_range_choice() {
    let dir = temp_dir("range");
    let file = dir.join("main.md");
    fs::write(&file, "* Only line\n").expect("source should be written");
    let state = dir.join("state.json");

    let output = run(&[
        "agent",
        "start",
        "--file",
        &path_str(&file),
        "--state-out",
        &path_str(&state),
    ]);
    assert!(output.status.success());

    let output = run(&[
        "agent",
        "choose",
        "--state-in",
        &path_str(&state),
        "--choice",
        "5",
        "--state-out",
        &path_str(&state),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("RESULT:ERROR"));
    assert!(stdout.contains("ERROR_CODE:CLI_CHOICE_INDEX"));
}

#[test]
fn agent_follows_calls_into_sibling_files() {
    let dir = temp_dir("call");
    fs::write(
        dir.join("main.md"),
        "* Door `call`[[rooms/hall.md]]\n* Outside again\n",
    )
    .expect("main should be written");
    fs::create_dir_all(dir.join("rooms")).expect("rooms dir");
    fs::write(dir.join("rooms/hall.md"), "* In the hall `end`\n").expect("hall should be written");
    let state_0 = dir.join("s0.json");
    let state_1 = dir.join("s1.json");
    let state_2 = dir.join("s2.json");

    let output = run(&[
        "agent",
        "start",
        "--file",
        &path_str(&dir.join("main.md")),
        "--state-out",
        &path_str(&state_0),
    ]);
    assert!(output.status.success());

    let output = run(&[
        "agent",
        "choose",
        "--state-in",
        &path_str(&state_0),
        "--choice",
        "0",
        "--state-out",
        &path_str(&state_1),
    ]);
    let stdout = stdout_of(&output);
    assert!(output.status.success(), "choose failed: {}", stdout);
    assert!(stdout.contains("CALL_JSON:\"rooms/hall.md\""));
    assert!(stdout.contains("CHOICE:0|\"In the hall\""));

    let output = run(&[
        "agent",
        "choose",
        "--state-in",
        &path_str(&state_1),
        "--choice",
        "0",
        "--state-out",
        &path_str(&state_2),
    ]);
    let stdout = stdout_of(&output);
    assert!(output.status.success(), "choose failed: {}", stdout);
    assert!(stdout.contains("CHOICE:0|\"Outside again\""));
}

#[test]
fn lint_reports_and_fails_on_broken_files() {
    let dir = temp_dir("lint");
    fs::write(dir.join("good.md"), "* Fine `set a = 1`\n").expect("good");
    fs::write(dir.join("bad.txt"), "* Broken `if a >`\n").expect("bad");

    let output = run(&["lint", "--dir", &path_str(&dir)]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("OK good.md"));
    assert!(stdout.contains("ERROR bad.txt: line 1: EVAL_PARSE"));
}

#[test]
fn ids_lists_every_id() {
    let dir = temp_dir("ids");
    let file = dir.join("main.md");
    fs::write(&file, MAIN).expect("source should be written");

    let output = run(&["ids", "--file", &path_str(&file)]);
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "b2\t* Bye. `id b2`\n");
}
