//! Menu and tdl wrapper against a stand-in tdl script.

#![cfg(unix)]

use std::fs;
use std::io::Cursor;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::tempdir;
use telegram_relay::{
    commands::menu::Menu,
    error::Error,
    tdl::{DownloadRequest, Tdl},
};

// Writing an executable while another test forks can fail with ETXTBSY.
static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

/// Records its argv to `calls.log`; `chat export` writes a two message export.
const FAKE_TDL: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls.log"
case "$1" in
  version)
    echo "Version: 0.17.0"
    ;;
  chat)
    out=""
    while [ $# -gt 0 ]; do
      if [ "$1" = "-o" ]; then out="$2"; fi
      shift
    done
    printf '{"id":1234567890,"messages":[{"id":100},{"id":101}]}' > "$out"
    ;;
esac
exit 0
"#;

fn install_fake_tdl(dir: &Path) -> PathBuf {
    let path = dir.join("tdl");
    fs::write(&path, FAKE_TDL).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn calls(dir: &Path) -> String {
    fs::read_to_string(dir.join("calls.log")).unwrap_or_default()
}

#[tokio::test]
async fn test_tdl_version_and_download_args() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let tdl = Tdl::new(install_fake_tdl(dir.path()));

    assert!(tdl.version().await.unwrap().contains("0.17.0"));

    let request = DownloadRequest {
        links: vec![
            "https://t.me/c/3399205162/31/62".into(),
            "https://t.me/c/3399205162/10/80".into(),
        ],
        out_dir: dir.path().join("mixed"),
        takeout: true,
        ..Default::default()
    };
    tdl.download(&request).await.unwrap();

    let log = calls(dir.path());
    assert!(log.contains(
        "download -u https://t.me/c/3399205162/31/62 -u https://t.me/c/3399205162/10/80 -d"
    ));
    assert!(log.trim_end().ends_with("--takeout"));
}

#[tokio::test]
async fn test_menu_range_download_cleans_up_export() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let tdl = Tdl::new(install_fake_tdl(dir.path()));

    let input = "2\nhttps://t.me/c/1234567890/5\n100\nhttps://t.me/c/1234567890/101\n1\nlectures\n\n3\n";
    let mut menu = Menu::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), dir.path());
    menu.run(&tdl).await.unwrap();

    let output = String::from_utf8(menu.into_output()).unwrap();
    assert!(output.contains("Messages found: 2"));
    assert!(dir.path().join("lectures").is_dir());
    assert!(!dir.path().join("export_1234567890_100_101.json").exists());

    let log = calls(dir.path());
    assert!(log.contains("chat export -c 1234567890 -T id -i 100,101 -o"));
    assert!(log.contains("dl -f"));
}

#[tokio::test]
async fn test_non_zero_exit_is_downloader_error() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let tdl = Tdl::new(install_fake_tdl(dir.path()));

    let failing = dir.path().join("failing-tdl");
    fs::write(&failing, "#!/bin/sh\nexit 3\n").unwrap();
    fs::set_permissions(&failing, fs::Permissions::from_mode(0o755)).unwrap();

    let err = Tdl::new(&failing).login().await.unwrap_err();
    assert!(matches!(err, Error::Downloader(ref msg) if msg.contains("exit code: 3")));

    assert!(tdl.login().await.is_ok());
}
