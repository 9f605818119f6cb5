//! End-to-end runs of `HipsgenCli` against stand-in scripts.
//!
//! The scripts take the place of the `java` launcher and see exactly the
//! argument vector the real tool would.

#![cfg(unix)]

use hips_common::{ErrorKind, HipsgenSettings, MemoryLogger, LogLevel};
use hipsgen::{HipsgenCli, TileGenerator};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const WORKING_TOOL: &str = r#"#!/bin/sh
out=""
cut=""
for arg in "$@"; do
  case "$arg" in
    out=*) out="${arg#out=}" ;;
    pixelCut=*) cut="${arg#pixelCut=}" ;;
  esac
done
echo "args: $*"
if [ -z "$cut" ]; then
  mkdir -p "$out"
  echo "Pixel dynamic range=[3.20..97.40] cut=[3.2..97.4]"
  exit 0
fi
mkdir -p "$out/Norder3/Dir0"
printf 'x' > "$out/Norder3/Allsky.fits"
printf 'x' > "$out/Norder3/Dir0/Npix1.fits"
printf 'x' > "$out/Norder3/Dir0/Npix0.fits"
echo "cut used: $cut" >&2
"#;

const SILENT_TOOL: &str = "#!/bin/sh\necho 'no range here'\nexit 3\n";

const HANGING_TOOL: &str = "#!/bin/sh\nexec sleep 30\n";

fn write_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn cli(java: PathBuf, timeout_secs: u64, logger: Arc<MemoryLogger>) -> HipsgenCli {
    let settings = HipsgenSettings {
        java,
        timeout_secs,
        ..HipsgenSettings::default()
    };
    HipsgenCli::new(settings, logger)
}

#[tokio::test]
async fn test_two_pass_generation() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_tool(dir.path(), "fake-java", WORKING_TOOL);
    let source = dir.path().join("map.fits");
    std::fs::write(&source, b"map").unwrap();
    let out_dir = dir.path().join("map.fitsHiPS");

    let logger = Arc::new(MemoryLogger::new());
    let manifest = cli(tool, 60, logger.clone())
        .generate_tiles(&source, &out_dir)
        .await
        .unwrap();

    assert_eq!(manifest.overview, out_dir.join("Norder3/Allsky.fits"));
    assert_eq!(
        manifest.details,
        vec![
            out_dir.join("Norder3/Dir0/Npix0.fits"),
            out_dir.join("Norder3/Dir0/Npix1.fits"),
        ]
    );

    let report = std::fs::read_to_string(HipsgenCli::report_path(&out_dir)).unwrap();
    assert!(report.contains("Pixel dynamic range=[3.20..97.40]"));
    assert!(report.contains("cut used: 3.20000 97.40000"));
    assert!(report.contains("-hipsgen"));

    assert!(logger
        .messages_at(LogLevel::Info)
        .iter()
        .any(|m| m.contains("[3.2..97.4]")));
}

#[tokio::test]
async fn test_unparseable_report_is_external_tool_error() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_tool(dir.path(), "fake-java", SILENT_TOOL);
    let logger = Arc::new(MemoryLogger::new());

    let err = cli(tool, 60, logger.clone())
        .probe(&dir.path().join("map.fits"), &dir.path().join("mapHiPS"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExternalTool);
    assert!(err.to_string().contains("Pixel dynamic range="));
    // The non-zero exit is reported too.
    assert!(!logger.messages_at(LogLevel::Warn).is_empty());
}

#[tokio::test]
async fn test_hanging_tool_is_killed() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_tool(dir.path(), "fake-java", HANGING_TOOL);

    let started = std::time::Instant::now();
    let err = cli(tool, 1, Arc::new(MemoryLogger::new()))
        .probe(&dir.path().join("map.fits"), &dir.path().join("mapHiPS"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExternalTool);
    assert!(err.to_string().contains("did not finish within 1s"));
    assert!(started.elapsed() < std::time::Duration::from_secs(20));
}

#[tokio::test]
async fn test_missing_launcher() {
    let dir = tempfile::tempdir().unwrap();
    let err = cli(dir.path().join("no-such-java"), 60, Arc::new(MemoryLogger::new()))
        .probe(&dir.path().join("map.fits"), &dir.path().join("mapHiPS"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalTool);
    assert!(err.to_string().contains("failed to start"));
}
