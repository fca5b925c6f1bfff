//! End-to-end runs against scripted stand-ins for hdiutil, diskutil, rsync
//! and the application. Every stand-in appends its argv to a shared call log.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ramstage_core::{Outcome, OutcomeKind, Phase, Settings, ToolPaths};
use ramstage_session::{recover, resolve_plan, run, Presenter, RunEvent};
use ramstage_sync::ProgressSink;
use serial_test::serial;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

const RSYNC_OK: &str = r#"for last; do :; done
case " $* " in
  *" --progress "*)
    mkdir -p "$last"
    printf 'prefs.js\n\r           0   0%%    0.00kB/s    0:00:00'
    printf '\r        4096 100%%    1.00MB/s    0:00:00 (xfr#1, to-chk=0/1)\n' ;;
esac
exit 0"#;

struct Rig {
    dir: TempDir,
    settings: Settings,
}

impl Rig {
    fn new(rsync_body: &str) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();
        let calls = root.join("calls.log");
        let mount_root = root.join("Volumes");
        fs::create_dir_all(&mount_root).expect("mount root");

        let profile = root.join("Profiles/abcd.default");
        fs::create_dir_all(&profile).expect("profile");
        fs::write(profile.join("prefs.js"), vec![b'p'; 4096]).expect("prefs");

        let bin = root.join("bin");
        fs::create_dir_all(&bin).expect("bin");
        let log = format!("echo \"$(basename \"$0\") $*\" >> '{}'", calls.display());
        let tools = ToolPaths {
            hdiutil: write_script(&bin, "hdiutil", &format!("{log}\necho '/dev/disk9   '")),
            diskutil: write_script(
                &bin,
                "diskutil",
                &format!("{log}\nmkdir -p '{}'/\"$3\"", mount_root.display()),
            ),
            rsync: write_script(&bin, "rsync", &format!("{log}\n{rsync_body}")),
        };
        let app = write_script(&bin, "firefox", &format!("{log}\nexit 0"));

        let settings = Settings {
            profile_path: Some(profile),
            app_path: app,
            mount_root,
            tools,
            log_to_file: false,
            ..Settings::default()
        };
        Self { dir, settings }
    }

    fn home(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    fn bin(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn calls_to(&self, tool: &str) -> Vec<String> {
        let prefix = format!("{tool} ");
        self.calls()
            .into_iter()
            .filter(|line| line.starts_with(&prefix))
            .collect()
    }

    fn staged(&self) -> PathBuf {
        self.settings.mount_root.join("FirefoxRAM/abcd.default")
    }

    async fn run(&self) -> (Outcome, Vec<RunEvent>) {
        let recording = Arc::new(Recording::default());
        let outcome = run(self.settings.clone(), self.home(), recording.clone()).await;
        let events = recording.0.lock().expect("lock").clone();
        (outcome, events)
    }
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
    path
}

#[derive(Default)]
struct Recording(Mutex<Vec<RunEvent>>);

impl ProgressSink for Recording {
    fn on_progress(&self, percent: u8) {
        self.0.lock().expect("lock").push(RunEvent::Progress(percent));
    }
}

impl Presenter for Recording {
    fn on_phase(&self, phase: Phase) {
        self.0.lock().expect("lock").push(RunEvent::Phase(phase));
    }
    fn on_outcome(&self, outcome: &Outcome) {
        self.0.lock().expect("lock").push(RunEvent::Outcome(outcome.clone()));
    }
}

fn phases(events: &[RunEvent]) -> Vec<Phase> {
    events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Phase(p) => Some(*p),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
#[serial]
async fn full_run_walks_every_phase_and_syncs_back_once() {
    let rig = Rig::new(RSYNC_OK);
    let (outcome, events) = rig.run().await;

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(
        phases(&events),
        vec![
            Phase::Resolving,
            Phase::Provisioning,
            Phase::CopyingIn,
            Phase::SessionActive,
            Phase::SyncingBack,
            Phase::Completed,
        ]
    );
    let progress: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![0, 100, 100]);
    assert_eq!(events.last(), Some(&RunEvent::Outcome(outcome.clone())));

    let calls = rig.calls();
    let tools: Vec<&str> = calls
        .iter()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(tools, vec!["hdiutil", "diskutil", "rsync", "firefox", "rsync"]);

    assert_eq!(calls[0], "hdiutil attach -nomount ram://1048576");
    assert_eq!(calls[1], "diskutil erasevolume HFS+ FirefoxRAM /dev/disk9");
    assert_eq!(
        calls[3],
        format!("firefox -profile {}", rig.staged().display())
    );

    let sync_backs: Vec<&String> = calls.iter().filter(|l| l.contains("--delete")).collect();
    assert_eq!(sync_backs.len(), 1, "{calls:?}");
    assert!(
        sync_backs[0].contains("--exclude user.js --exclude saved-telemetry-pings"),
        "{}",
        sync_backs[0]
    );
}

#[tokio::test]
#[serial]
async fn mounted_volume_is_reused_without_tools() {
    let rig = Rig::new(RSYNC_OK);
    fs::create_dir_all(rig.settings.mount_root.join("FirefoxRAM")).expect("pre-mount");

    let (outcome, _) = rig.run().await;
    assert!(outcome.is_success(), "{outcome:?}");
    assert!(rig.calls_to("hdiutil").is_empty());
    assert!(rig.calls_to("diskutil").is_empty());
}

#[tokio::test]
#[serial]
async fn abnormal_exit_still_syncs_back() {
    let rig = Rig::new(RSYNC_OK);
    write_script(&rig.bin(), "firefox", "kill -9 $$");

    let (outcome, events) = rig.run().await;
    assert!(outcome.is_success(), "{outcome:?}");
    assert!(phases(&events).contains(&Phase::SyncingBack));
    assert_eq!(rig.calls_to("rsync").len(), 2);
}

// ---------------------------------------------------------------------------
// 2. Failures are fixed at the phase that detects them
// ---------------------------------------------------------------------------

#[tokio::test]
#[serial]
async fn missing_profile_is_source_missing() {
    let mut rig = Rig::new(RSYNC_OK);
    rig.settings.profile_path = Some(rig.home().join("Profiles/gone.default"));

    let (outcome, events) = rig.run().await;
    assert_eq!(outcome.kind, OutcomeKind::SourceMissing);
    assert_eq!(phases(&events), vec![Phase::Resolving, Phase::Failed]);
    assert!(rig.calls().is_empty());
}

#[tokio::test]
#[serial]
async fn empty_device_identifier_is_provisioning_failure() {
    let rig = Rig::new(RSYNC_OK);
    write_script(&rig.bin(), "hdiutil", "exit 0");

    let (outcome, _) = rig.run().await;
    assert_eq!(outcome.kind, OutcomeKind::ProvisioningFailed);
    assert!(outcome.detail.contains("no device identifier"), "{}", outcome.detail);
    assert!(rig.calls_to("diskutil").is_empty());
    assert!(rig.calls_to("rsync").is_empty());
}

#[tokio::test]
#[serial]
async fn copy_failure_never_starts_a_session() {
    let rig = Rig::new(
        r#"echo "rsync: write failed: No space left on device (28)" >&2
exit 11"#,
    );

    let (outcome, events) = rig.run().await;
    assert_eq!(outcome.kind, OutcomeKind::CopyFailed);
    assert!(outcome.detail.contains("too small"), "{}", outcome.detail);
    assert!(outcome.detail.contains("No space left"), "{}", outcome.detail);

    let seen = phases(&events);
    assert!(!seen.contains(&Phase::SessionActive), "{seen:?}");
    assert_eq!(seen.last(), Some(&Phase::Failed));
    assert!(rig.calls_to("firefox").is_empty(), "app launched");
    assert!(!rig.calls().iter().any(|l| l.contains("--delete")));
}

#[tokio::test]
#[serial]
async fn launch_failure_skips_session_and_sync_back() {
    let mut rig = Rig::new(RSYNC_OK);
    rig.settings.app_path = rig.bin().join("no-such-app");

    let (outcome, events) = rig.run().await;
    assert_eq!(outcome.kind, OutcomeKind::LaunchFailed);
    assert!(!phases(&events).contains(&Phase::SessionActive));
    assert_eq!(rig.calls_to("rsync").len(), 1, "only copy-in");
}

#[tokio::test]
#[serial]
async fn sync_back_failure_surfaces_rsync_output() {
    let rig = Rig::new(
        r#"for last; do :; done
case " $* " in
  *" --delete "*) echo "rsync: delete_file: unlink failed: Permission denied (13)" >&2; exit 23 ;;
  *) mkdir -p "$last"; exit 0 ;;
esac"#,
    );

    let (outcome, events) = rig.run().await;
    assert_eq!(outcome.kind, OutcomeKind::SyncBackFailed);
    assert!(outcome.detail.contains("Permission denied"), "{}", outcome.detail);
    assert_eq!(phases(&events).last(), Some(&Phase::Failed));
    assert_eq!(
        rig.calls().iter().filter(|l| l.contains("--delete")).count(),
        1,
        "sync-back must not be retried"
    );
}

// ---------------------------------------------------------------------------
// 3. Manual recovery
// ---------------------------------------------------------------------------

#[tokio::test]
#[serial]
async fn recover_reconciles_a_leftover_stage() {
    let rig = Rig::new(RSYNC_OK);
    fs::create_dir_all(rig.staged()).expect("leftover stage");

    let plan = resolve_plan(&rig.settings, &rig.home()).await.expect("plan");
    let result = recover(&rig.settings, &plan).await.expect("recover");
    assert!(result.success);
    assert_eq!(result.destination, rig.home().join("Profiles/abcd.default"));
    let calls = rig.calls_to("rsync");
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("--delete"));
}

#[tokio::test]
#[serial]
async fn recover_without_stage_touches_nothing() {
    let rig = Rig::new(RSYNC_OK);
    let plan = resolve_plan(&rig.settings, &rig.home()).await.expect("plan");
    assert!(recover(&rig.settings, &plan).await.is_err());
    assert!(rig.calls().is_empty());
}
