//! Text rendering of the process tree.
//!
//! Two strategies are available:
//! - **Fancy**: box-drawing connectors, descendants aligned under the joint
//!   glyph of their parent's name
//! - **Boring**: plain indentation for pipes and log files
//!
//! Both emit one line per process, depth-first in pre-order, and sort each
//! node's children right before descending into them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::error::{TreeError, TreeResult};
use crate::process::{Process, ProcessStore, SortOrder};

const BRANCH: &str = "├";
const LAST_BRANCH: &str = "└";
const BAR: &str = "│";
const JOIN: &str = "─╴";
const JOINT: &str = " ╤";

/// Rendering strategy as requested by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Fancy,
    Boring,
    /// Fancy on an interactive terminal, boring otherwise.
    #[default]
    Auto,
}

impl Style {
    /// Picks the concrete strategy; only `Auto` looks at `is_terminal`.
    pub fn resolve(self, is_terminal: bool) -> Style {
        match self {
            Style::Auto if is_terminal => Style::Fancy,
            Style::Auto => Style::Boring,
            other => other,
        }
    }
}

impl FromStr for Style {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fancy" => Ok(Style::Fancy),
            "boring" => Ok(Style::Boring),
            "auto" => Ok(Style::Auto),
            _ => Err(TreeError::InvalidOption {
                option: "style",
                value: s.to_string(),
                expected: "fancy, boring, auto",
            }),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::Fancy => write!(f, "fancy"),
            Style::Boring => write!(f, "boring"),
            Style::Auto => write!(f, "auto"),
        }
    }
}

/// What to render and how.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub show_rss: bool,
    pub show_cpu: bool,
    pub order: SortOrder,
    pub root_pid: u32,
    pub style: Style,
    /// Whether output goes to an interactive terminal; consulted by `Style::Auto`.
    pub is_terminal: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_rss: true,
            show_cpu: true,
            order: SortOrder::default(),
            root_pid: 1,
            style: Style::Auto,
            is_terminal: false,
        }
    }
}

/// Formats a KiB count as KiB, MiB or GiB.
pub fn pretty_size(kib: u64) -> String {
    if kib < 1024 {
        format!("{kib}KiB")
    } else if kib < 1024 * 1024 {
        format!("{:.2}MiB", kib as f64 / 1024.0)
    } else {
        format!("{:.2}GiB", kib as f64 / (1024.0 * 1024.0))
    }
}

fn pretty_cpu(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Printed width of a name, used for column alignment.
fn display_width(s: &str) -> usize {
    s.chars().count()
}

fn write_line<W: Write>(out: &mut W, line: &str) -> TreeResult<()> {
    writeln!(out, "{line}").map_err(|e| TreeError::Io {
        context: "failed to write tree output".to_string(),
        source: e,
    })
}

pub struct TreeRenderer {
    options: RenderOptions,
}

impl TreeRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Renders the tree rooted at `options.root_pid` and returns the number of
    /// lines written. Fails with `RootNotFound` before writing anything if the
    /// root is not in the store.
    pub fn render<W: Write>(&self, store: &mut ProcessStore, out: &mut W) -> TreeResult<usize> {
        let root = self.options.root_pid;
        store.root(root)?;

        match self.options.style.resolve(self.options.is_terminal) {
            Style::Boring => self.render_boring(store, root, "", out),
            _ => self.render_fancy(store, root, "", None, out),
        }
    }

    /// Summary suffix for one process. Each combination of `show_rss` and
    /// `show_cpu` has its own layout.
    pub fn summary(&self, store: &ProcessStore, process: &Process) -> String {
        let pid = process.pid;
        match (self.options.show_rss, self.options.show_cpu) {
            (true, true) => format!(
                "(#{pid}; {} {}) -- {} {}",
                pretty_size(process.rss_kb),
                pretty_cpu(process.cpu_fraction),
                pretty_size(store.accumulated_rss(process)),
                pretty_cpu(store.accumulated_cpu(process)),
            ),
            (true, false) => format!(
                "(#{pid}; {}) -- {}",
                pretty_size(process.rss_kb),
                pretty_size(store.accumulated_rss(process)),
            ),
            (false, true) => format!(
                "(#{pid}; {}) -- {}",
                pretty_cpu(process.cpu_fraction),
                pretty_cpu(store.accumulated_cpu(process)),
            ),
            (false, false) => format!("(#{pid})"),
        }
    }

    /// Sorts the children of `pid` and returns them in their new order.
    fn sorted_children(&self, store: &mut ProcessStore, pid: u32) -> Vec<u32> {
        store.sort_children(pid, self.options.order);
        store
            .get(pid)
            .map(|p| p.children().to_vec())
            .unwrap_or_default()
    }

    /// `last` is `None` for the root, otherwise whether this node is the last
    /// of its siblings.
    fn render_fancy<W: Write>(
        &self,
        store: &mut ProcessStore,
        pid: u32,
        prefix: &str,
        last: Option<bool>,
        out: &mut W,
    ) -> TreeResult<usize> {
        let (line, name_width) = match store.get(pid) {
            Some(process) => {
                let joint = if process.has_children() { JOINT } else { "" };
                let connector = match last {
                    None => String::new(),
                    Some(true) => format!("{LAST_BRANCH}{JOIN}"),
                    Some(false) => format!("{BRANCH}{JOIN}"),
                };
                let line = format!(
                    "{prefix}{connector}{}{joint} {}",
                    process.name,
                    self.summary(store, process)
                );
                (line, display_width(&process.name))
            }
            None => return Ok(0),
        };
        write_line(out, &line)?;

        // Children align their connector under this node's joint glyph.
        let sub_prefix = match last {
            None => " ".repeat(name_width + 1),
            Some(is_last) => {
                let bar = if is_last { " " } else { BAR };
                format!("{prefix}{bar}{}", " ".repeat(name_width + 3))
            }
        };

        let children = self.sorted_children(store, pid);
        let mut written = 1;
        for (i, child) in children.iter().enumerate() {
            let is_last = i + 1 == children.len();
            written += self.render_fancy(store, *child, &sub_prefix, Some(is_last), out)?;
        }
        Ok(written)
    }

    fn render_boring<W: Write>(
        &self,
        store: &mut ProcessStore,
        pid: u32,
        prefix: &str,
        out: &mut W,
    ) -> TreeResult<usize> {
        let (line, name_width) = match store.get(pid) {
            Some(process) => (
                format!("{prefix}{} {}", process.name, self.summary(store, process)),
                display_width(&process.name),
            ),
            None => return Ok(0),
        };
        write_line(out, &line)?;

        let sub_prefix = format!("{prefix}{}", " ".repeat(name_width + 1));
        let children = self.sorted_children(store, pid);
        let mut written = 1;
        for child in children {
            written += self.render_boring(store, child, &sub_prefix, out)?;
        }
        Ok(written)
    }
}
