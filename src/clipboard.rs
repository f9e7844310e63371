//! System clipboard access and the file bundle copied by `mcpset clipboard`.

use crate::target::{expand_home, Target};
use crate::McpsetError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Label used for extra paths given with `-p`.
pub const CUSTOM_LABEL: &str = "custom";

/// Read the clipboard as text.
///
/// # Errors
///
/// Returns an error if no clipboard tool for this platform is available or it fails.
pub fn get_clipboard() -> Result<String, McpsetError> {
    let mut last_error = String::from("unsupported platform");

    for &(program, args) in PASTE_COMMANDS {
        match Command::new(program).args(args).stderr(Stdio::null()).output() {
            Ok(output) if output.status.success() => {
                debug!("Read clipboard with {program}");
                return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
            },
            Ok(output) => last_error = format!("{program} exited with {}", output.status),
            Err(e) => last_error = format!("{program}: {e}"),
        }
    }

    Err(McpsetError::Clipboard(format!("failed to read clipboard ({last_error})")))
}

/// Replace the clipboard contents with `text`.
///
/// # Errors
///
/// Returns an error if no clipboard tool for this platform is available or it fails.
pub fn set_clipboard(text: &str) -> Result<(), McpsetError> {
    let mut last_error = String::from("unsupported platform");

    for &(program, args) in COPY_COMMANDS {
        match pipe_into(program, args, text) {
            Ok(()) => {
                debug!("Wrote clipboard with {program}");
                return Ok(());
            },
            Err(e) => last_error = format!("{program}: {e}"),
        }
    }

    Err(McpsetError::Clipboard(format!("failed to write clipboard ({last_error})")))
}

fn pipe_into(program: &str, args: &[&str], text: &str) -> std::io::Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("exited with {status}")))
    }
}

/// Program and arguments of a clipboard tool, tried in order.
type ClipboardCommand = (&'static str, &'static [&'static str]);

#[cfg(target_os = "macos")]
const PASTE_COMMANDS: &[ClipboardCommand] = &[("pbpaste", &[])];
#[cfg(target_os = "macos")]
const COPY_COMMANDS: &[ClipboardCommand] = &[("pbcopy", &[])];

#[cfg(windows)]
const PASTE_COMMANDS: &[ClipboardCommand] = &[("powershell", &["-command", "Get-Clipboard"])];
#[cfg(windows)]
const COPY_COMMANDS: &[ClipboardCommand] = &[("powershell", &["-command", "Set-Clipboard"])];

#[cfg(not(any(target_os = "macos", windows)))]
const PASTE_COMMANDS: &[ClipboardCommand] =
    &[("xclip", &["-selection", "clipboard", "-o"]), ("xsel", &["--clipboard", "--output"])];
#[cfg(not(any(target_os = "macos", windows)))]
const COPY_COMMANDS: &[ClipboardCommand] =
    &[("xclip", &["-selection", "clipboard"]), ("xsel", &["--clipboard", "--input"])];

/// One file copied into the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub label: String,
    pub path: PathBuf,
    pub content: String,
}

impl Block {
    fn render(&self) -> String {
        format!("##### {}: {}\n{}", self.label, self.path.display(), self.content)
    }
}

/// Gather the files of `targets` and the `extra` paths into blocks, skipping missing files.
///
/// Non-UTF-8 content is decoded lossily.
pub fn collect_blocks(targets: &[Target], extra: &[String]) -> Vec<Block> {
    let named = targets.iter().map(|target| (target.name().to_string(), target.path().to_path_buf()));
    let custom = extra.iter().map(|raw| (CUSTOM_LABEL.to_string(), expand_home(raw)));

    named
        .chain(custom)
        .filter_map(|(label, path)| match read_lossy(&path) {
            Some(content) => Some(Block { label, path, content }),
            None => {
                warn!("File not found: {}", path.display());
                None
            },
        })
        .collect()
}

/// Join blocks as `##### label: path` sections separated by blank lines.
///
/// # Errors
///
/// Returns an error if there is nothing to bundle.
pub fn render_bundle(blocks: &[Block]) -> Result<String, McpsetError> {
    if blocks.is_empty() {
        return Err(McpsetError::Clipboard("no files to copy".to_string()));
    }
    Ok(blocks.iter().map(Block::render).collect::<Vec<_>>().join("\n\n"))
}

fn read_lossy(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!("Cannot read {}: {e}", path.display());
            None
        },
    }
}
