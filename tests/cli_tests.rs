use assert_cmd::prelude::*;
use chrono::{Duration, Utc};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn gstbill_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("gstbill"))
}

fn init_config(config_path: &Path) {
    gstbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
}

fn send_invoice(config_path: &Path) {
    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "send",
            "--client",
            "example-client",
            "--item",
            "Website Design:1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sent INV-001"));
}

#[test]
fn test_help() {
    gstbill_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "CLI GST invoicing and payment follow-up assistant",
        ));
}

#[test]
fn test_version() {
    gstbill_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gstbill"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    gstbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized gstbill config"));

    assert!(config_path.join("config.toml").exists());
    assert!(config_path.join("clients.toml").exists());
    assert!(config_path.join("products.toml").exists());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);

    gstbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_status_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    gstbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_clients_list() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);

    gstbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "clients"])
        .assert()
        .success()
        .stdout(predicate::str::contains("example-client"))
        .stdout(predicate::str::contains("Example Client Pvt Ltd"))
        .stdout(predicate::str::contains("Karnataka (29)"));
}

#[test]
fn test_products_list() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);

    gstbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "products"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Website Design"))
        .stdout(predicate::str::contains("998314"))
        .stdout(predicate::str::contains("18%"));
}

#[test]
fn test_status_shows_next_invoice_number() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);

    gstbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gstbill status"))
        .stdout(predicate::str::contains("Next invoice:     INV-001"))
        .stdout(predicate::str::contains("file outbox"));
}

#[test]
fn test_states_list() {
    gstbill_cmd()
        .arg("states")
        .assert()
        .success()
        .stdout(predicate::str::contains("Delhi (07)"))
        .stdout(predicate::str::contains("Karnataka (29)"));
}

#[test]
fn test_send_missing_client() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);

    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "send",
            "--client",
            "nonexistent",
            "--item",
            "Consulting:8",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Client 'nonexistent' not found"));
}

#[test]
fn test_send_no_items() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);

    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "send",
            "--client",
            "example-client",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No line items"));
}

#[test]
fn test_send_invalid_quantity() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);

    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "send",
            "--client",
            "example-client",
            "--item",
            "Consulting:abc",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid quantity"));
}

#[test]
fn test_send_writes_outbox_document_and_tracker() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);
    send_invoice(&config_path);

    // Message landed in the outbox with the notification subject.
    let meta = fs::read_to_string(config_path.join("outbox/msg-0001.json")).unwrap();
    assert!(meta.contains("Invoice #INV-001 from Your Company Name"));
    assert!(meta.contains("accounts@example.com"));

    // The rendered document exists and is inter-state (template company
    // is in Delhi, the example client in Karnataka).
    let doc = fs::read_to_string(
        config_path.join("output/Invoice_INV-001_Example_Client_Pvt_Ltd.html"),
    )
    .unwrap();
    assert!(doc.contains("TAX INVOICE"));
    assert!(doc.contains("IGST"));
    assert!(!doc.contains("CGST"));
    assert!(doc.contains("Rupees Only"));

    // Tracker row persisted as Sent with the reminder clock running.
    let tracker = fs::read_to_string(config_path.join("tracker.toml")).unwrap();
    assert!(tracker.contains("INV-001"));
    assert!(tracker.contains("status = \"Sent\""));
    assert!(tracker.contains("notes = \"Initial Invoice Sent\""));
    assert!(tracker.contains("next_due_at"));

    // Items archived for later reconstruction.
    let archive = fs::read_to_string(config_path.join("archive.toml")).unwrap();
    assert!(archive.contains("INV-001"));
    assert!(archive.contains("Website Design"));
}

#[test]
fn test_invoice_numbers_are_monotonic() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);
    send_invoice(&config_path);

    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "send",
            "--client",
            "example-client",
            "--item",
            "Consulting:2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sent INV-002"));
}

#[test]
fn test_draft_then_ready_sends() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);

    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "draft",
            "--client",
            "example-client",
            "--item",
            "Consulting:8:500",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved draft INV-001"));

    // Draft rows have no reminder clock and nothing was dispatched.
    let tracker = fs::read_to_string(config_path.join("tracker.toml")).unwrap();
    assert!(tracker.contains("status = \"Draft\""));
    assert!(!tracker.contains("next_due_at"));
    assert!(!config_path.join("outbox/msg-0001.json").exists());

    // Editing the status cell to Ready reconstructs from the archive
    // and sends.
    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "set-status",
            "1",
            "Ready",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sent INV-001"));

    let tracker = fs::read_to_string(config_path.join("tracker.toml")).unwrap();
    assert!(tracker.contains("status = \"Sent\""));
    assert!(tracker.contains("notes = \"Manually Sent\""));
    assert!(config_path.join("outbox/msg-0001.json").exists());
}

#[test]
fn test_set_status_rejects_bad_values_and_transitions() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);
    send_invoice(&config_path);

    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "set-status",
            "1",
            "Overdue",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid status 'Overdue'"));

    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "set-status",
            "1",
            "Sent",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot change status"));
}

#[test]
fn test_paid_invoice_is_never_swept() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);
    send_invoice(&config_path);

    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "set-status",
            "INV-001",
            "Paid",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked INV-001 as Paid"));

    // The reminder clock is cleared, and even a far-future sweep finds
    // no candidates.
    let tracker = fs::read_to_string(config_path.join("tracker.toml")).unwrap();
    assert!(tracker.contains("status = \"Paid\""));
    assert!(!tracker.contains("next_due_at"));

    let far_future = (Utc::now() + Duration::days(365)).to_rfc3339();
    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "sweep",
            "--now",
            &far_future,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No due invoices found."));
}

#[test]
fn test_sweep_sends_reminder_once_per_due_cycle() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);
    send_invoice(&config_path);

    // Not yet due: default cadence is 3 days.
    gstbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "sweep"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No due invoices found."));

    // Four days later the reminder fires.
    let later = (Utc::now() + Duration::days(4)).to_rfc3339();
    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "sweep",
            "--now",
            &later,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sent 1 of 1 due follow-up reminder(s)."));

    let tracker = fs::read_to_string(config_path.join("tracker.toml")).unwrap();
    assert!(tracker.contains("notes = \"Auto-Reminder Sent\""));

    let reminder = fs::read_to_string(config_path.join("outbox/msg-0002.json")).unwrap();
    assert!(reminder.contains("Reminder: Invoice #INV-001"));

    // Same instant again: the clock has advanced, nothing re-fires.
    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "sweep",
            "--now",
            &later,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No due invoices found."));
    assert!(!config_path.join("outbox/msg-0003.json").exists());
}

#[test]
fn test_set_follow_up_validation_and_cadence() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);
    send_invoice(&config_path);

    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "set-follow-up",
            "INV-001",
            "0",
            "Days",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Follow-up value must be at least 1"));

    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "set-follow-up",
            "INV-001",
            "2",
            "Weeks",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid follow-up unit 'Weeks'"));

    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "set-follow-up",
            "INV-001",
            "2",
            "Hours",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Follow-up for INV-001 set to every 2 Hours",
        ));

    // After a reminder, the next one is due 2 hours later, not 3 days.
    let later = (Utc::now() + Duration::days(4)).to_rfc3339();
    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "sweep",
            "--now",
            &later,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sent 1 of 1"));

    let three_hours_on = (Utc::now() + Duration::days(4) + Duration::hours(3)).to_rfc3339();
    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "sweep",
            "--now",
            &three_hours_on,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sent 1 of 1"));
}

#[test]
fn test_regenerate_from_archive() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);
    send_invoice(&config_path);

    // Remove the rendered document, then rebuild it from the archive.
    let doc_path = config_path.join("output/Invoice_INV-001_Example_Client_Pvt_Ltd.html");
    fs::remove_file(&doc_path).unwrap();

    gstbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "regenerate", "INV-001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Regenerated INV-001"));

    assert!(doc_path.exists());
}

#[test]
fn test_list_shows_dashboard_totals() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gstbill-config");

    init_config(&config_path);
    send_invoice(&config_path);

    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "send",
            "--client",
            "example-client",
            "--item",
            "Consulting:2",
        ])
        .assert()
        .success();

    gstbill_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "set-status",
            "INV-002",
            "Paid",
        ])
        .assert()
        .success();

    // Website Design 25000 + 18% IGST = 29,500; Consulting 2x1500 + 18% = 3,540.
    gstbill_cmd()
        .args(["-C", config_path.to_str().unwrap(), "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NUMBER"))
        .stdout(predicate::str::contains("STATUS"))
        .stdout(predicate::str::contains("Total invoiced:"))
        .stdout(predicate::str::contains("33,040.00"))
        .stdout(predicate::str::contains("Collected:"))
        .stdout(predicate::str::contains("3,540.00"))
        .stdout(predicate::str::contains("Outstanding:"))
        .stdout(predicate::str::contains("29,500.00"));
}
