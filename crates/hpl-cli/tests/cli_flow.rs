use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const PASSPHRASE: &str = "test-passphrase-secure-123";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_hpl"))
}

/// Scratch XDG homes plus a document path, removed on drop.
struct Sandbox {
    base: PathBuf,
    config_home: PathBuf,
    data_home: PathBuf,
}

impl Sandbox {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        let base = std::env::temp_dir().join(format!("{}_{}_{}", prefix, std::process::id(), nanos));
        let config_home = base.join("c");
        let data_home = base.join("d");
        std::fs::create_dir_all(config_home.join("hpl")).expect("create config dir");
        std::fs::create_dir_all(&data_home).expect("create data dir");

        // Keep key derivation at the minimum so the tests stay fast.
        std::fs::write(
            config_home.join("hpl").join("config.toml"),
            "[security]\nkdf_iterations = 100000\n",
        )
        .expect("write config");

        Self {
            base,
            config_home,
            data_home,
        }
    }

    fn document(&self) -> PathBuf {
        self.base.join("accounts.hpl.xml")
    }

    fn keyfile(&self) -> PathBuf {
        self.base.join("accounts.hpl.xml.keys.json")
    }

    fn staged_keyfile(&self) -> PathBuf {
        self.base.join("accounts.hpl.xml.keys.json.new")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(bin());
        cmd.env("XDG_CONFIG_HOME", &self.config_home)
            .env("XDG_DATA_HOME", &self.data_home)
            .env_remove("HPL_FILE")
            .env_remove("HPL_CONFIG")
            .env_remove("HPL_PASSPHRASE")
            .env_remove("HPL_NEW_PASSPHRASE")
            .env_remove("HPL_LOG")
            .arg("--no-input");
        cmd
    }

    /// Run against the sandbox document.
    fn run(&self, args: &[&str], passphrase: Option<&str>) -> Output {
        let mut cmd = self.command();
        cmd.arg("--file").arg(self.document()).args(args);
        if let Some(passphrase) = passphrase {
            cmd.env("HPL_PASSPHRASE", passphrase);
        }
        cmd.output().expect("run hpl")
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.base);
    }
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{} failed: stdout={}, stderr={}",
        what,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("valid JSON output")
}

fn init_plain(sandbox: &Sandbox) {
    let init = sandbox.run(&["init", "--title", "Household"], None);
    assert_success(&init, "init");
}

fn add_table(sandbox: &Sandbox, name: &str, passphrase: Option<&str>) -> String {
    let output = sandbox.run(&["--quiet", "table", "add", name], passphrase);
    assert_success(&output, "table add");
    stdout(&output)
}

fn add_bank(sandbox: &Sandbox, table: &str, passphrase: Option<&str>) -> String {
    let output = sandbox.run(
        &[
            "--quiet",
            "account",
            "add",
            table,
            "--name",
            "Bank",
            "--initial",
            "B",
            "--category",
            "finance",
            "--summary",
            "desc",
            "--status",
            "active",
            "--field",
            "password=hunter2",
        ],
        passphrase,
    );
    assert_success(&output, "account add");
    stdout(&output)
}

#[test]
fn test_cli_plain_document_flow() {
    let sandbox = Sandbox::new("hpl_cli_plain");
    init_plain(&sandbox);
    assert!(sandbox.document().exists());
    assert!(!sandbox.keyfile().exists());

    let table = add_table(&sandbox, "Banking", None);
    assert!(table.starts_with("TBL-"), "unexpected table id: {}", table);
    assert_eq!(add_bank(&sandbox, &table, None), "1");
    assert_eq!(add_bank(&sandbox, &table, None), "2");

    let list = sandbox.run(&["account", "list", &table, "--json"], None);
    assert_success(&list, "account list");
    let accounts = json(&list);
    let accounts = accounts.as_array().expect("array");
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0]["sn"], 1);
    assert_eq!(accounts[0]["nm"], "Bank");
    assert_eq!(accounts[1]["password"], "hunter2");

    let update = sandbox.run(
        &["account", "update", &table, "2", "--status", "closed", "--remove-field", "password"],
        None,
    );
    assert_success(&update, "account update");
    let show = sandbox.run(&["account", "show", &table, "2", "--json"], None);
    assert_success(&show, "account show");
    let account = json(&show);
    assert_eq!(account["st"], "closed");
    assert!(account.get("password").is_none());

    let remove = sandbox.run(&["account", "remove", &table, "2"], None);
    assert_success(&remove, "account remove");
    // Serial numbers are never reused.
    assert_eq!(add_bank(&sandbox, &table, None), "3");

    let info = sandbox.run(&["info", "--json"], None);
    assert_success(&info, "info");
    let info = json(&info);
    assert_eq!(info["title"], "Household");
    assert_eq!(info["is_encrypted"], false);
    assert_eq!(info["tables"], 1);
    // init, table add, 2x account add, update, remove, account add
    assert_eq!(info["file_version"], "1.7");
}

#[test]
fn test_cli_table_rename_and_remove() {
    let sandbox = Sandbox::new("hpl_cli_tables");
    init_plain(&sandbox);
    let table = add_table(&sandbox, "Mail", None);

    let rename = sandbox.run(&["table", "rename", &table, "--name", "Email", "--summary", "personal"], None);
    assert_success(&rename, "table rename");

    let list = sandbox.run(&["table", "list", "--json"], None);
    assert_success(&list, "table list");
    let tables = json(&list);
    assert_eq!(tables[0]["id"], table.as_str());
    assert_eq!(tables[0]["name"], "Email");
    assert_eq!(tables[0]["summary"], "personal");
    assert_eq!(tables[0]["counter"], 0);

    let remove = sandbox.run(&["table", "remove", &table], None);
    assert_success(&remove, "table remove");
    let missing = sandbox.run(&["account", "list", &table], None);
    assert_eq!(missing.status.code(), Some(4));
}

#[test]
fn test_cli_encrypted_document_flow() {
    let sandbox = Sandbox::new("hpl_cli_encrypted");
    let init = sandbox.run(&["init", "--encrypt"], Some(PASSPHRASE));
    assert_success(&init, "init --encrypt");
    assert!(sandbox.keyfile().exists());

    let table = add_table(&sandbox, "Banking", Some(PASSPHRASE));
    add_bank(&sandbox, &table, Some(PASSPHRASE));

    let on_disk = std::fs::read_to_string(sandbox.document()).expect("read document");
    assert!(!on_disk.contains("hunter2"));
    assert!(!on_disk.contains("<tables"));

    // The head stays readable without the passphrase.
    let info = sandbox.run(&["info", "--json"], None);
    assert_success(&info, "info");
    let info = json(&info);
    assert_eq!(info["is_encrypted"], true);
    assert_eq!(info["kdf_iterations"], 100_000);
    assert!(info["tables"].is_null());

    let wrong = sandbox.run(&["table", "list"], Some("wrong-passphrase-456"));
    assert_eq!(wrong.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&wrong.stderr).contains("wrong passphrase or corrupted file"));

    let no_passphrase = sandbox.run(&["table", "list"], None);
    assert!(!no_passphrase.status.success());
    assert!(String::from_utf8_lossy(&no_passphrase.stderr).contains("HPL_PASSPHRASE"));

    let list = sandbox.run(&["account", "list", &table, "--json"], Some(PASSPHRASE));
    assert_success(&list, "account list");
    assert_eq!(json(&list)[0]["password"], "hunter2");
}

fn table_names(sandbox: &Sandbox) -> Vec<String> {
    let list = sandbox.run(&["table", "list", "--json"], Some(PASSPHRASE));
    assert_success(&list, "table list");
    json(&list)
        .as_array()
        .expect("array")
        .iter()
        .map(|table| table["name"].as_str().expect("name").to_string())
        .collect()
}

#[test]
fn test_cli_failed_key_file_write_keeps_document_readable() {
    let sandbox = Sandbox::new("hpl_cli_keyfile_fail");
    assert_success(&sandbox.run(&["init", "--encrypt"], Some(PASSPHRASE)), "init --encrypt");
    add_table(&sandbox, "Banking", Some(PASSPHRASE));
    let document_before = std::fs::read(sandbox.document()).expect("read document");

    // A directory in the way makes the key file write fail.
    std::fs::create_dir(sandbox.staged_keyfile()).expect("create blocker");
    std::fs::write(sandbox.staged_keyfile().join("blocker"), b"x").expect("fill blocker");

    let failed = sandbox.run(&["table", "add", "Mail"], Some(PASSPHRASE));
    assert!(!failed.status.success());
    assert_eq!(std::fs::read(sandbox.document()).expect("read document"), document_before);
    assert_eq!(table_names(&sandbox), vec!["Banking"]);

    std::fs::remove_dir_all(sandbox.staged_keyfile()).expect("remove blocker");
    add_table(&sandbox, "Mail", Some(PASSPHRASE));
    assert_eq!(table_names(&sandbox), vec!["Banking", "Mail"]);
}

#[test]
fn test_cli_recovers_key_file_from_interrupted_save() {
    let sandbox = Sandbox::new("hpl_cli_keyfile_recover");
    assert_success(&sandbox.run(&["init", "--encrypt"], Some(PASSPHRASE)), "init --encrypt");
    add_table(&sandbox, "Banking", Some(PASSPHRASE));
    let stale = std::fs::read(sandbox.keyfile()).expect("read key file");

    add_table(&sandbox, "Mail", Some(PASSPHRASE));
    // State after a save that wrote the document but not the key file.
    std::fs::rename(sandbox.keyfile(), sandbox.staged_keyfile()).expect("stage key file");
    std::fs::write(sandbox.keyfile(), &stale).expect("restore stale key file");

    assert_eq!(table_names(&sandbox), vec!["Banking", "Mail"]);
    assert!(!sandbox.staged_keyfile().exists());
    assert_ne!(std::fs::read(sandbox.keyfile()).expect("read key file"), stale);

    let wrong = sandbox.run(&["table", "list"], Some("wrong-passphrase-456"));
    assert_eq!(wrong.status.code(), Some(3));
}

#[test]
fn test_cli_passphrase_set_and_clear() {
    let sandbox = Sandbox::new("hpl_cli_passphrase");
    init_plain(&sandbox);
    let table = add_table(&sandbox, "Banking", None);
    add_bank(&sandbox, &table, None);

    let short = sandbox
        .command()
        .arg("--file")
        .arg(sandbox.document())
        .args(["passphrase", "set"])
        .env("HPL_NEW_PASSPHRASE", "short")
        .output()
        .expect("run hpl");
    assert!(!short.status.success());
    assert!(!sandbox.keyfile().exists());

    let set = sandbox
        .command()
        .arg("--file")
        .arg(sandbox.document())
        .args(["passphrase", "set"])
        .env("HPL_NEW_PASSPHRASE", PASSPHRASE)
        .output()
        .expect("run hpl");
    assert_success(&set, "passphrase set");
    assert!(sandbox.keyfile().exists());
    let keys: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(sandbox.keyfile()).expect("read keys"))
            .expect("keys JSON");
    assert!(keys["iv"].is_string());
    assert!(keys["salt"].is_string());

    let clear = sandbox.run(&["passphrase", "clear"], Some(PASSPHRASE));
    assert_success(&clear, "passphrase clear");
    assert!(!sandbox.keyfile().exists());

    let list = sandbox.run(&["account", "list", &table, "--json"], None);
    assert_success(&list, "account list");
    assert_eq!(json(&list)[0]["nm"], "Bank");
}

#[test]
fn test_cli_columns_shape_account_list() {
    let sandbox = Sandbox::new("hpl_cli_columns");
    init_plain(&sandbox);
    let table = add_table(&sandbox, "Banking", None);
    let add = sandbox.run(
        &[
            "account", "add", &table, "--name", "Bank", "--initial", "INITIAL-XYZ", "--category",
            "finance", "--summary", "desc", "--status", "active",
        ],
        None,
    );
    assert_success(&add, "account add");

    assert_success(&sandbox.run(&["column", "alias", "nm", "Service"], None), "column alias");
    assert_success(&sandbox.run(&["column", "hide", "it"], None), "column hide");
    assert!(!sandbox.run(&["column", "hide", "it"], None).status.success());
    assert!(!sandbox.run(&["column", "alias", "bad key!", "x"], None).status.success());

    let list = sandbox.run(&["account", "list", &table], None);
    assert_success(&list, "account list");
    let text = stdout(&list);
    assert!(text.contains("Service"));
    assert!(text.contains("Bank"));
    assert!(!text.contains("INITIAL-XYZ"));

    assert_success(&sandbox.run(&["column", "show", "it"], None), "column show");
    let list = sandbox.run(&["account", "list", &table], None);
    assert!(stdout(&list).contains("INITIAL-XYZ"));
}

#[test]
fn test_cli_remembers_last_document() {
    let sandbox = Sandbox::new("hpl_cli_session");
    init_plain(&sandbox);
    add_table(&sandbox, "Banking", None);

    // No --file: the session points at the last used document.
    let list = sandbox
        .command()
        .args(["table", "list", "--json"])
        .output()
        .expect("run hpl");
    assert_success(&list, "table list from session");
    assert_eq!(json(&list)[0]["name"], "Banking");

    let session_path = sandbox.data_home.join("hpl").join("session.json");
    let session = std::fs::read_to_string(session_path).expect("read session");
    assert!(session.contains(&*sandbox.document().to_string_lossy()));
    assert!(!session.contains(PASSPHRASE));
}

#[test]
fn test_cli_init_refuses_existing_document() {
    let sandbox = Sandbox::new("hpl_cli_reinit");
    init_plain(&sandbox);
    let again = sandbox.run(&["init"], None);
    assert!(!again.status.success());
    assert!(Path::new(&sandbox.document()).exists());
}
