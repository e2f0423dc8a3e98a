//! Integration tests for the `netstate` CLI binary.
//!
//! Argument parsing, help output, completions and error handling run
//! without any network. The poll tests stand up a wiremock gateway.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `netstate` binary with env isolation.
///
/// Clears all `NETSTATE_*` and credential env vars and points config
/// directories at a nonexistent path so tests never touch the user's
/// real configuration.
fn netstate_cmd() -> assert_cmd::Command {
    netstate_cmd_in(Path::new("/tmp/netstate-cli-test-nonexistent"))
}

fn netstate_cmd_in(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("netstate");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("NETSTATE_PROFILE")
        .env_remove("NETSTATE_OUTPUT")
        .env_remove("NETSTATE_TIMEOUT")
        .env_remove("NETSTATE_DEFAULT_PROFILE")
        .env_remove("GRPC_USERNAME")
        .env_remove("GRPC_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = netstate_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    netstate_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("gNMI")
            .and(predicate::str::contains("poll"))
            .and(predicate::str::contains("fields"))
            .and(predicate::str::contains("resolve")),
    );
}

#[test]
fn test_version_flag() {
    netstate_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netstate"));
}

#[test]
fn test_invalid_subcommand() {
    netstate_cmd()
        .arg("frobnicate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_plaintext_conflicts_with_insecure() {
    netstate_cmd()
        .args(["--plaintext", "--insecure", "poll", "leaf1:8080"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    netstate_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    netstate_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Fields & resolve ────────────────────────────────────────────────

#[test]
fn test_fields_lists_builtins() {
    netstate_cmd().arg("fields").assert().success().stdout(
        predicate::str::contains("bgp-session-state")
            .and(predicate::str::contains("bgp-prefixes-received"))
            .and(predicate::str::contains("lldp-system-name")),
    );
}

#[test]
fn test_fields_json() {
    let output = netstate_cmd()
        .args(["fields", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let fields: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let fields = fields.as_array().unwrap();
    assert_eq!(fields.len(), 4);
    assert_eq!(fields[0]["name"], "bgp-session-state");
    assert_eq!(fields[0]["bindings"][0]["field"], "vrf_name");
}

#[test]
fn test_resolve_shows_request() {
    let output = netstate_cmd()
        .args([
            "resolve",
            "/network-instances/network-instance[name={vrf_name}]/state/type",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let resolved: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(resolved["request"]["type"], "STATE");
    assert_eq!(resolved["request"]["encoding"], "JSON_IETF");
    assert_eq!(resolved["bindings"][0]["segment"], 1);
    assert!(resolved["query"].as_str().unwrap().contains("network-instance"));
}

#[test]
fn test_resolve_rejects_malformed_spec() {
    netstate_cmd()
        .args(["resolve", "/interfaces/interface[name=eth0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid field specification"));
}

// ── Poll argument handling ──────────────────────────────────────────

#[test]
fn test_poll_without_targets() {
    netstate_cmd()
        .arg("poll")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No targets"));
}

#[test]
fn test_unknown_profile() {
    netstate_cmd()
        .args(["--profile", "nope", "poll"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_zero_concurrency_rejected() {
    netstate_cmd()
        .args(["--concurrency", "0", "poll", "leaf1:8080"])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path() {
    netstate_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_redacts_password() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join("netstate");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.toml"),
        r#"
default_profile = "lab"

[profiles.lab]
targets = ["leaf1:8080", "leaf2:8080"]
username = "admin"
password = "hunter2"
plaintext = true
"#,
    )
    .unwrap();

    let output = netstate_cmd_in(home.path())
        .args(["config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("leaf2:8080"), "{stdout}");
    assert!(stdout.contains("admin"), "{stdout}");
    assert!(!stdout.contains("hunter2"), "{stdout}");
}

#[test]
fn test_config_init_needs_terminal() {
    netstate_cmd()
        .args(["config", "init"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("netstate::validation"));
}

// ── Polling a gateway ───────────────────────────────────────────────

fn elem(name: &str) -> serde_json::Value {
    json!({ "name": name })
}

fn keyed(name: &str, key: &str, value: &str) -> serde_json::Value {
    let mut keys = serde_json::Map::new();
    keys.insert(key.to_owned(), json!(value));
    json!({ "name": name, "key": keys })
}

fn neighbor(nbr: &str) -> Vec<serde_json::Value> {
    vec![
        elem("network-instances"),
        keyed("network-instance", "name", "default"),
        elem("protocols"),
        keyed("protocol", "identifier", "BGP"),
        elem("bgp"),
        elem("neighbors"),
        keyed("neighbor", "neighbor-address", nbr),
    ]
}

fn full_path(mut prefix: Vec<serde_json::Value>, rest: &[serde_json::Value]) -> serde_json::Value {
    prefix.extend_from_slice(rest);
    json!({ "elem": prefix })
}

/// Matches a Get whose single path ends in the given element.
struct GetLeaf(&'static str);

impl wiremock::Match for GetLeaf {
    fn matches(&self, request: &wiremock::Request) -> bool {
        let Ok(body) = serde_json::from_slice::<serde_json::Value>(&request.body) else {
            return false;
        };
        body["path"][0]["elem"]
            .as_array()
            .and_then(|elems| elems.last())
            .and_then(|e| e["name"].as_str())
            == Some(self.0)
    }
}

async fn mount_get(server: &MockServer, leaf: &'static str, updates: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/gnmi/v1/get"))
        .and(GetLeaf(leaf))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notification": [{ "update": updates }]
        })))
        .mount(server)
        .await;
}

async fn gateway() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gnmi/v1/capabilities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "supportedEncodings": ["JSON", "JSON_IETF"],
            "gNMIVersion": "0.8.0"
        })))
        .mount(&server)
        .await;

    let afi = keyed("afi-safi", "afi-safi-name", "ipv4-unicast");
    mount_get(
        &server,
        "session-state",
        json!([{
            "path": full_path(neighbor("10.0.0.1"), &[elem("state"), elem("session-state")]),
            "val": { "stringVal": "ESTABLISHED" }
        }]),
    )
    .await;
    mount_get(
        &server,
        "enabled",
        json!([{
            "path": full_path(
                neighbor("10.0.0.1"),
                &[elem("afi-safis"), afi.clone(), elem("config"), elem("enabled")]
            ),
            "val": { "boolVal": true }
        }]),
    )
    .await;
    mount_get(
        &server,
        "received",
        json!([{
            "path": full_path(
                neighbor("10.0.0.1"),
                &[elem("afi-safis"), afi, elem("state"), elem("prefixes"), elem("received")]
            ),
            "val": { "uintVal": "42" }
        }]),
    )
    .await;
    mount_get(
        &server,
        "system-name",
        json!([{
            "path": full_path(
                vec![elem("lldp"), elem("interfaces"), keyed("interface", "name", "Ethernet1")],
                &[elem("neighbors"), keyed("neighbor", "id", "1"), elem("state"), elem("system-name")]
            ),
            "val": { "stringVal": "spine1" }
        }]),
    )
    .await;

    server
}

#[tokio::test(flavor = "multi_thread")]
async fn test_poll_text_with_one_unreachable_target() {
    let server = gateway().await;
    let uri = server.uri();

    let output = tokio::task::spawn_blocking(move || {
        netstate_cmd()
            .args(["--plaintext", "--timeout", "5", "poll", &uri, "127.0.0.1:1"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(1), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Hostname: 127.0.0.1"), "{stdout}");
    assert!(
        stdout.contains(
            "bgp_neighbors: vrf_name=default neighbor_addr=10.0.0.1 session_state=ESTABLISHED"
        ),
        "{stdout}"
    );
    assert!(
        stdout.contains("lldp_neighbors: local_interface=Ethernet1 neighbor_name=spine1"),
        "{stdout}"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("127.0.0.1:1"), "{stderr}");
    assert!(stderr.contains("1 of 2 targets failed"), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_poll_json_joins_received_routes() {
    let server = gateway().await;
    let uri = server.uri();
    let target = uri.clone();

    let output = tokio::task::spawn_blocking(move || {
        netstate_cmd()
            .args(["--plaintext", "-o", "json", "poll", &target])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let routes = &json[uri.as_str()]["bgp_received_routes"];
    assert_eq!(routes[0]["safi"], "ipv4-unicast");
    assert_eq!(routes[0]["enabled"], true);
    assert_eq!(routes[0]["prefixes_received"], 42);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_poll_all_unreachable_uses_connection_exit_code() {
    let output = tokio::task::spawn_blocking(|| {
        netstate_cmd()
            .args(["--plaintext", "--timeout", "5", "poll", "127.0.0.1:1"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}
