use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;

use vtyang_datastore::CONFIG_FILE;
use vtyang_repl::io::{ExitReason, TestHost};
use vtyang_repl::{ReplCore, Session, SessionConfig};

fn schema_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/schema")
}

struct Shell {
    dir: TempDir,
    core: ReplCore,
}

impl Shell {
    fn open() -> Self {
        Self::open_in(tempfile::tempdir().unwrap())
    }

    fn open_in(dir: TempDir) -> Self {
        let config = SessionConfig::new(vec![schema_dir()], dir.path().to_path_buf());
        let session = Session::open(&config).unwrap();
        Self {
            dir,
            core: ReplCore::new(session),
        }
    }

    fn run(&mut self, lines: &[&str]) -> TestHost {
        let mut host = TestHost::new();
        let reason = self.core.run_commands(lines, &mut host).unwrap();
        assert_eq!(reason, ExitReason::Eof, "output: {}", host.output_text());
        host
    }

    /// Output of a single command that must succeed.
    fn show(&mut self, line: &str) -> String {
        let host = self.run(&[line]);
        assert!(host.errors().is_empty(), "{}: {:?}", line, host.errors());
        host.output_text()
    }

    fn show_json(&mut self, line: &str) -> serde_json::Value {
        serde_json::from_str(&self.show(line)).unwrap()
    }

    fn on_disk(&self) -> serde_json::Value {
        let text = std::fs::read_to_string(self.dir.path().join(CONFIG_FILE)).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}

#[test]
fn test_set_and_commit_user() {
    let mut shell = Shell::open();
    let host = shell.run(&["configure", "set users user hiroki", "commit", "quit"]);
    assert!(host.errors().is_empty(), "{:?}", host.errors());

    let expected = json!({"users": {"user": [{"name": "hiroki"}]}});
    assert_eq!(shell.show_json("show running-config"), expected);
    assert_eq!(shell.on_disk(), expected);
}

#[test]
fn test_commit_merges_into_existing_running() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE),
        r#"{"users": {"user": [{"name": "hiroki", "age": 22}]}}"#,
    )
    .unwrap();
    let mut shell = Shell::open_in(dir);

    shell.run(&["configure", "set users user shirokura age 28", "commit", "quit"]);

    assert_eq!(
        shell.show_json("show running-config users"),
        json!({"user": [
            {"name": "hiroki", "age": 22},
            {"name": "shirokura", "age": 28}
        ]})
    );
    assert_eq!(shell.show("show running-config users user shirokura age"), "28");
}

#[test]
fn test_two_key_list() {
    let mut shell = Shell::open();
    let host = shell.run(&[
        "configure",
        "set isis instance 1 default description hello",
        "commit",
        "quit",
    ]);
    assert!(host.errors().is_empty(), "{:?}", host.errors());

    assert_eq!(
        shell.show_json("show running-config isis"),
        json!({"instance": [{"area-tag": "1", "vrf": "default", "description": "hello"}]})
    );
    assert_eq!(
        shell.show("show-xpath isis instance 1 default description"),
        "/frr-isisd:isis/frr-isisd:instance[area-tag='1'][vrf='default']/frr-isisd:description"
    );
}

#[test]
fn test_missing_node_is_not_found() {
    let mut shell = Shell::open();
    let host = shell.run(&["show running-config users user nobody"]);
    assert_eq!(host.errors(), vec!["Not Found"]);
    assert_eq!(shell.core.failures(), 1);
}

#[test]
fn test_invalid_value_leaves_candidate_unchanged() {
    let mut shell = Shell::open();
    let host = shell.run(&["configure", "set values u08 200", "show configuration diff"]);
    assert_eq!(host.errors().len(), 1);
    assert!(host.displayed().is_empty());
}

#[test]
fn test_rollback_restores_earlier_commit() {
    let mut shell = Shell::open();
    shell.run(&[
        "configure",
        "set values u08 7",
        "commit comment first change",
        "set values u08 9",
        "commit",
    ]);

    let list = shell.show("show configuration commit list");
    let lines: Vec<&str> = list.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Idx"));
    assert!(lines[2].contains("first change"));
    assert!(lines[1].contains("cli"));

    let host = shell.run(&["rollback configuration 1", "show configuration diff"]);
    let diff = host.output_text();
    assert!(diff.contains("- /values/u08: 9"), "{}", diff);
    assert!(diff.contains("+ /values/u08: 7"), "{}", diff);

    shell.run(&["commit", "quit"]);
    assert_eq!(shell.show("show running-config values u08"), "7");
}

#[test]
fn test_history_diff_and_changes() {
    let mut shell = Shell::open();
    shell.run(&["configure", "set values u08 7", "commit", "set values enabled true", "commit"]);

    // Running is the result of the newest commit.
    let host = shell.run(&["show configuration commit diff 0"]);
    assert!(host.transcript().is_empty());

    let older = shell.show("show configuration commit diff 1");
    assert_eq!(older, "- /values/enabled: true");

    let changes = shell.show("show configuration commit list 0");
    assert_eq!(changes, "+ /values/enabled: true");

    let host = shell.run(&["show configuration commit list 5"]);
    assert_eq!(host.errors().len(), 1);
}

#[test]
fn test_enum_and_identity_completion() {
    let mut shell = Shell::open();
    shell.run(&["configure"]);

    let listing = shell.show("set values crypto ?");
    let words: Vec<&str> = listing
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert!(listing.starts_with("Possible Completions:"));
    assert_eq!(words, vec!["aes", "des3"]);

    let listing = shell.show("set values cipher ?");
    assert!(listing.contains("main:aes"), "{}", listing);
    assert!(listing.contains("main:des3"), "{}", listing);
}

#[test]
fn test_completion_follows_mode() {
    let mut shell = Shell::open();
    let view = shell.core.session().complete("conf", 4);
    assert_eq!(view.start, 0);
    assert_eq!(view.items[0].word, "configure");

    shell.run(&["configure"]);
    let configure = shell.core.session().complete("se", 2);
    assert_eq!(configure.items[0].word, "set");
}

#[test]
fn test_show_path_reads_running() {
    let mut shell = Shell::open();
    shell.run(&["configure", "set users user hiroki age 34", "commit", "quit"]);
    assert_eq!(shell.show("show users user hiroki age"), "34");

    let host = shell.run(&["show state uptime"]);
    assert_eq!(host.errors(), vec!["Not Found"]);
}

#[test]
fn test_do_keeps_configure_mode() {
    let mut shell = Shell::open();
    let host = shell.run(&["configure", "do quit", "do configure"]);
    assert_eq!(
        host.errors(),
        vec![
            "% 'quit' changes mode and cannot be run with 'do'",
            "% 'configure' changes mode and cannot be run with 'do'"
        ]
    );
    assert!(shell.core.session().prompt().configure);

    let modules = shell.show("do show yang modules");
    assert!(modules.starts_with("Module"));
}

#[test]
fn test_augmenting_module_survives_restart() {
    let mut shell = Shell::open();
    shell.run(&["configure"]);
    let listing = shell.show("set isis ?");
    assert!(listing.contains("debug"), "{}", listing);
    assert!(listing.contains("instance"), "{}", listing);

    let host = shell.run(&[
        "set isis debug true",
        "set isis instance 1 default description hello",
        "commit",
        "quit",
    ]);
    assert!(host.errors().is_empty(), "{:?}", host.errors());
    assert_eq!(
        shell.on_disk(),
        json!({"isis": {
            "debug": true,
            "instance": [{"area-tag": "1", "vrf": "default", "description": "hello"}]
        }})
    );

    let Shell { dir, core } = shell;
    drop(core);
    let mut shell = Shell::open_in(dir);
    assert_eq!(shell.show("show running-config isis debug"), "true");
    assert_eq!(
        shell.show("show-xpath isis debug"),
        "/frr-isisd-ext:isis/frr-isisd-ext:debug"
    );
}

#[test]
fn test_decimal_survives_restart() {
    let mut shell = Shell::open();
    let host = shell.run(&["configure", "set values ratio 12345678901234567.89", "commit", "quit"]);
    assert!(host.errors().is_empty(), "{:?}", host.errors());
    assert_eq!(
        shell.on_disk(),
        json!({"values": {"ratio": "12345678901234567.89"}})
    );

    let Shell { dir, core } = shell;
    drop(core);
    let mut shell = Shell::open_in(dir);
    assert_eq!(
        shell.show("show running-config values ratio"),
        "\"12345678901234567.89\""
    );
    let host = shell.run(&["configure", "rollback configuration 0", "show configuration diff"]);
    assert!(host.transcript().is_empty(), "{:?}", host.transcript());
}

#[test]
fn test_list_key_cannot_be_rewritten() {
    let mut shell = Shell::open();
    let host = shell.run(&[
        "configure",
        "set users user a",
        "set users user b",
        "set users user a name b",
    ]);
    assert_eq!(host.errors().len(), 1);
    assert!(host.errors()[0].contains("list keys"), "{:?}", host.errors());
    assert_eq!(
        shell.show_json("show configuration"),
        json!({"users": {"user": [{"name": "a"}, {"name": "b"}]}})
    );
}

#[test]
fn test_eval_xpath_reads_active_tree() {
    let mut shell = Shell::open();
    shell.run(&["configure", "set users user hiroki age 34"]);

    // The candidate is the active tree while configuring.
    let host = shell.run(&["do eval-xpath /users/user[name='hiroki']/age"]);
    assert_eq!(host.output_text(), "34");

    shell.run(&["quit"]);
    let host = shell.run(&["eval-xpath /users/user[name='hiroki']/age"]);
    assert_eq!(host.errors(), vec!["Not Found"]);
}

#[test]
fn test_rpc_inputs_are_checked() {
    let mut shell = Shell::open();
    let host = shell.run(&["rpc reset-user name bob force true"]);
    assert_eq!(
        host.errors(),
        vec!["rpc reset-user: rpc execution is not supported by this agent"]
    );

    let host = shell.run(&["rpc reset-user color blue"]);
    assert_eq!(host.errors(), vec!["rpc reset-user: unknown input 'color'"]);

    let host = shell.run(&["rpc reboot"]);
    assert_eq!(host.errors(), vec!["unknown rpc 'reboot'"]);
}

#[test]
fn test_running_config_frr_qualifies_top_level() {
    let mut shell = Shell::open();
    shell.run(&[
        "configure",
        "set users user hiroki",
        "set isis instance 1 red",
        "commit",
        "quit",
    ]);

    let frr = shell.show_json("show running-config-frr");
    let mut keys: Vec<&String> = frr.as_object().unwrap().keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["frr-isisd:isis", "main:users"]);

    let raw = shell.show("show running-config-raw");
    assert!(!raw.contains('\n'));
}

#[test]
fn test_abbreviated_commands() {
    let mut shell = Shell::open();
    let host = shell.run(&["conf", "set users user hiroki", "comm", "q"]);
    assert!(host.errors().is_empty(), "{:?}", host.errors());
    assert!(!shell.core.session().prompt().configure);

    let modules = shell.show("show yang mod");
    assert!(modules.starts_with("Module"));
    assert!(modules.contains("frr-isisd"));

    // `show` and `show-xpath` share every prefix of `show`.
    let host = shell.run(&["sh yang modules"]);
    assert_eq!(host.errors(), vec!["% Ambiguous command: sh"]);
    let host = shell.run(&["show run"]);
    assert_eq!(host.errors(), vec!["% Ambiguous command: run"]);
}

#[test]
fn test_write_memory_persists_running() {
    let mut shell = Shell::open();
    shell.run(&["configure", "set values enabled false", "commit", "quit"]);
    std::fs::remove_file(shell.dir.path().join(CONFIG_FILE)).unwrap();

    shell.run(&["write memory"]);
    assert_eq!(shell.on_disk(), json!({"values": {"enabled": false}}));
}

#[test]
fn test_history_survives_restart() {
    let mut shell = Shell::open();
    shell.run(&["configure", "set values u08 7", "commit comment persisted"]);
    let Shell { dir, core } = shell;
    drop(core);

    let mut shell = Shell::open_in(dir);
    assert!(shell
        .show("show configuration commit list")
        .contains("persisted"));
    assert_eq!(shell.show("show running-config values u08"), "7");
}

#[test]
fn test_rollback_newest_against_edited_running() {
    let mut shell = Shell::open();
    shell.run(&["configure", "set values u08 7", "commit", "quit"]);
    let Shell { dir, core } = shell;
    drop(core);
    std::fs::write(dir.path().join(CONFIG_FILE), r#"{"values": {"u08": 9}}"#).unwrap();

    let mut shell = Shell::open_in(dir);
    let host = shell.run(&["configure", "rollback configuration 0", "show configuration diff"]);
    assert!(host.errors().is_empty(), "{:?}", host.errors());
    assert_eq!(host.output_text(), "- /values/u08: 9\n+ /values/u08: 7");
}
