// ANSI SGR and box-drawing constants for diagnostic output on stderr.
//
// Kept deliberately dumb: no terminal detection, no width handling.  The
// leak report and the fatal out-of-memory banner are the only consumers.
#![allow(dead_code)]

pub(crate) const RESET: &str = "\x1b[0m";
pub(crate) const BOLD: &str = "\x1b[1m";
pub(crate) const FAINT: &str = "\x1b[2m";

pub(crate) const BOLD_RED: &str = "\x1b[1;31m";
pub(crate) const BOLD_YELLOW: &str = "\x1b[1;33m";

pub(crate) const TREE_BRANCH: &str = "├─ ";
pub(crate) const TREE_LAST_BRANCH: &str = "└─ ";
pub(crate) const TREE_VERTICAL: &str = "│  ";

/// Print a boxed single-line banner to stderr, in the given SGR style.
pub(crate) fn banner(style: &str, text: &str) {
    let inner = 38usize.max(text.len() + 2);
    let pad = inner - text.len();
    let left = pad / 2;
    let right = pad - left;
    eprintln!("{style}┌{}┐{RESET}", "─".repeat(inner));
    eprintln!("{style}│{}{text}{}│{RESET}", " ".repeat(left), " ".repeat(right));
    eprintln!("{style}└{}┘{RESET}", "─".repeat(inner));
}
