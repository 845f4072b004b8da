//! Integration tests for the optgate binary.
//!
//! Each test runs with an empty home and config directory so no settings
//! file from the machine leaks in.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Get a command for running optgate in this environment.
    fn optgate(&self) -> Command {
        let mut cmd = Command::cargo_bin("optgate").unwrap();
        cmd.env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path())
            .env_remove("OPTGATE_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }

    fn write_settings(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join("settings.toml");
        fs::write(&path, contents).unwrap();
        path
    }
}

#[test]
fn version_flag_works() {
    Env::new()
        .optgate()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("optgate"));
}

mod render {
    use super::*;

    #[test]
    fn structural_by_default() {
        Env::new()
            .optgate()
            .args(["render", "functional_alltypes"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("Table: functional_alltypes\n"))
            .stdout(predicate::str::contains("-- executed queries: 0"));
    }

    #[test]
    fn interactive_applies_default_limit() {
        Env::new()
            .optgate()
            .args(["render", "functional_alltypes", "--set", "interactive=true"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "SELECT *\nFROM functional_alltypes\nLIMIT 10000;",
            ))
            .stdout(predicate::str::contains("(0 rows)"));
    }

    #[test]
    fn explicit_limit_wins() {
        Env::new()
            .optgate()
            .args([
                "render",
                "functional_alltypes",
                "--limit",
                "10",
                "--set",
                "interactive=true",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("LIMIT 10;"));
    }

    #[test]
    fn unlimited_scalar() {
        Env::new()
            .optgate()
            .args([
                "render",
                "functional_alltypes",
                "--sum",
                "bigint_col",
                "--set",
                "interactive=true",
                "--set",
                "sql.default_limit=none",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "SELECT sum(`bigint_col`) AS `sum`\nFROM functional_alltypes;",
            ));
    }

    #[test]
    fn unsupported_falls_back() {
        Env::new()
            .optgate()
            .args([
                "render",
                "functional_alltypes",
                "--topk",
                "string_col",
                "3",
                "--set",
                "interactive=true",
            ])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("TopK[string_col, k=3]"))
            .stdout(predicate::str::contains("-- executed queries: 0"))
            .stderr(predicate::str::contains("warning:"));
    }

    #[test]
    fn filtered_value_counts() {
        Env::new()
            .optgate()
            .args([
                "render",
                "functional_alltypes",
                "--not-in",
                "string_col=1,4,7",
                "--value-counts",
                "string_col",
                "--set",
                "interactive=true",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "WHERE `string_col` NOT IN ('1', '4', '7')",
            ));
    }

    #[test]
    fn invalid_override_rejected() {
        Env::new()
            .optgate()
            .args(["render", "functional_alltypes", "--set", "sql.default_limit=0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid --set override"));
    }

    #[test]
    fn unknown_override_rejected() {
        Env::new()
            .optgate()
            .args(["render", "functional_alltypes", "--set", "nope=1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown option"));
    }

    #[test]
    fn backend_option_override() {
        Env::new()
            .optgate()
            .args([
                "render",
                "functional_alltypes",
                "--set",
                "interactive=true",
                "--set",
                "mock.row_count=2",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("(2 rows)"));
    }

    #[test]
    fn png_writes_graph() {
        Env::new()
            .optgate()
            .args([
                "render",
                "functional_alltypes",
                "--set",
                "graphviz_repr=true",
                "--png",
            ])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("digraph"));
    }

    #[test]
    fn png_suppressed_when_interactive() {
        Env::new()
            .optgate()
            .args([
                "render",
                "functional_alltypes",
                "--set",
                "graphviz_repr=true",
                "--set",
                "interactive=true",
                "--png",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("digraph").not())
            .stderr(predicate::str::contains("No graph"));
    }

    #[test]
    fn quiet_prints_result_only() {
        Env::new()
            .optgate()
            .args(["-q", "render", "functional_alltypes"])
            .assert()
            .success()
            .stdout("Table: functional_alltypes\n");
    }
}

mod compile {
    use super::*;

    #[test]
    fn prints_query() {
        Env::new()
            .optgate()
            .args(["compile", "functional_alltypes", "--limit", "10"])
            .assert()
            .success()
            .stdout("SELECT *\nFROM functional_alltypes\nLIMIT 10\n");
    }

    #[test]
    fn unsupported_fails() {
        Env::new()
            .optgate()
            .args(["compile", "functional_alltypes", "--histogram", "double_col", "10"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unsupported expression"));
    }

    #[test]
    fn unknown_table_fails() {
        Env::new()
            .optgate()
            .args(["compile", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("table not found: nope"));
    }
}

mod options {
    use super::*;

    #[test]
    fn list_shows_core_and_backend_options() {
        Env::new()
            .optgate()
            .args(["options", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("sql.default_limit = 10000"))
            .stdout(predicate::str::contains("mock.row_count"))
            .stdout(predicate::str::contains("interactive"));
    }

    #[test]
    fn list_prefix_json() {
        let output = Env::new()
            .optgate()
            .args(["options", "list", "sql", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let infos: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(infos.as_array().unwrap().len(), 1);
        assert_eq!(infos[0]["path"], "sql.default_limit");
        assert_eq!(infos[0]["value"], 10_000);
    }

    #[test]
    fn list_unknown_prefix_fails() {
        Env::new()
            .optgate()
            .args(["options", "list", "nope"])
            .assert()
            .failure();
    }

    #[test]
    fn get_value() {
        Env::new()
            .optgate()
            .args(["options", "get", "interactive"])
            .assert()
            .success()
            .stdout("false\n");
    }

    #[test]
    fn get_unknown_fails() {
        Env::new()
            .optgate()
            .args(["options", "get", "sql"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read option 'sql'"));
    }

    #[test]
    fn describe_shows_default() {
        Env::new()
            .optgate()
            .args(["options", "describe", "sql.default_limit"])
            .assert()
            .success()
            .stdout(predicate::str::contains("default: 10000"));
    }
}

mod settings {
    use super::*;

    #[test]
    fn explicit_settings_file() {
        let env = Env::new();
        let path = env.write_settings("interactive = true\n\n[sql]\ndefault_limit = 5\n");
        env.optgate()
            .arg("--config")
            .arg(&path)
            .args(["render", "functional_alltypes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("LIMIT 5;"));
    }

    #[test]
    fn discovered_from_env() {
        let env = Env::new();
        let path = env.write_settings("[sql]\ndefault_limit = \"none\"\n");
        env.optgate()
            .env("OPTGATE_CONFIG", &path)
            .args(["options", "get", "sql.default_limit"])
            .assert()
            .success()
            .stdout("none\n");
    }

    #[test]
    fn discovered_from_xdg() {
        let env = Env::new();
        let dir = env.dir.path().join("optgate");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), "graphviz_repr = true\n").unwrap();
        env.optgate()
            .args(["options", "get", "graphviz_repr"])
            .assert()
            .success()
            .stdout("true\n");
    }

    #[test]
    fn backend_options_settable_from_file() {
        let env = Env::new();
        let path = env.write_settings("interactive = true\n\n[mock]\nrow_count = 2\n");
        env.optgate()
            .arg("--config")
            .arg(&path)
            .args(["render", "functional_alltypes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("(2 rows)"));
    }

    #[test]
    fn invalid_settings_rejected() {
        let env = Env::new();
        let path = env.write_settings("interactive = \"yes\"\n");
        env.optgate()
            .arg("--config")
            .arg(&path)
            .args(["options", "list"])
            .assert()
            .failure();
    }

    #[test]
    fn overrides_do_not_persist() {
        let env = Env::new();
        env.optgate()
            .args(["render", "functional_alltypes", "--set", "interactive=true"])
            .assert()
            .success();
        env.optgate()
            .args(["options", "get", "interactive"])
            .assert()
            .success()
            .stdout("false\n");
    }
}

#[test]
fn completion_bash() {
    Env::new()
        .optgate()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("optgate"));
}
