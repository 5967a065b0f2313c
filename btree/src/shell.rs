//! Interactive menu over a B-tree.
//!
//! The shell reads commands from any `BufRead` and writes prompts and results
//! to any `Write`, so the binary drives it with stdin/stdout and tests drive
//! it with in-memory buffers. Each menu entry maps onto one tree operation:
//!
//! 1. Insert keys  -> `BTree::insert_multiple`
//! 2. Search       -> `BTree::contains`
//! 3. Traverse     -> `BTree::traverse`
//! 4. Exit

use std::io::{self, BufRead, Write};

use crate::btree::{BTree, BTreeError, Key};
use crate::config::ShellConfig;

const MENU: &str = "\n1. Insert keys\n2. Search\n3. Traverse\n4. Exit\nEnter your choice: ";

/// A menu command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    InsertKeys,
    Search,
    Traverse,
    Exit,
}

impl Command {
    /// Parse a menu choice. Surrounding whitespace is ignored.
    #[must_use]
    pub fn parse(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Self::InsertKeys),
            "2" => Some(Self::Search),
            "3" => Some(Self::Traverse),
            "4" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// The interactive shell.
pub struct Shell<R, W> {
    tree: BTree,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    #[must_use]
    pub const fn new(tree: BTree, input: R, output: W) -> Self {
        Self {
            tree,
            input,
            output,
        }
    }

    /// Build the tree described by `config` and wrap it in a shell.
    pub fn from_config(config: &ShellConfig, input: R, output: W) -> Result<Self, BTreeError> {
        let tree = match config.max_nodes {
            Some(limit) => BTree::with_node_limit(config.min_degree, limit)?,
            None => BTree::new(config.min_degree)?,
        };
        Ok(Self::new(tree, input, output))
    }

    #[must_use]
    pub const fn tree(&self) -> &BTree {
        &self.tree
    }

    #[must_use]
    pub fn into_tree(self) -> BTree {
        self.tree
    }

    /// Run the menu until the user exits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        tracing::info!(min_degree = %self.tree.min_degree(), "shell started");

        loop {
            self.output.write_all(MENU.as_bytes())?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                break;
            };
            let Some(command) = Command::parse(&line) else {
                writeln!(self.output, "Invalid choice!")?;
                continue;
            };
            tracing::debug!(?command, "menu command");

            match command {
                Command::InsertKeys => self.insert_keys()?,
                Command::Search => self.search()?,
                Command::Traverse => self.traverse()?,
                Command::Exit => break,
            }
        }

        tracing::info!(
            keys = self.tree.len(),
            height = self.tree.height(),
            "shell exiting"
        );
        Ok(())
    }

    fn insert_keys(&mut self) -> io::Result<()> {
        write!(self.output, "Enter keys to insert (space-separated): ")?;
        self.output.flush()?;
        let line = self.read_line()?.unwrap_or_default();

        match self.tree.insert_multiple(&line) {
            Ok(report) => {
                if let Some(token) = &report.halted_at {
                    writeln!(
                        self.output,
                        "Stopped at '{token}': not an integer ({} keys inserted)",
                        report.inserted
                    )?;
                }
            }
            Err(e) => {
                tracing::error!("insert failed: {e}");
                writeln!(self.output, "Insert failed: {e}")?;
            }
        }
        Ok(())
    }

    fn search(&mut self) -> io::Result<()> {
        write!(self.output, "Enter key to search: ")?;
        self.output.flush()?;
        let line = self.read_line()?.unwrap_or_default();

        let Ok(key) = line.trim().parse::<Key>() else {
            writeln!(self.output, "Invalid key!")?;
            return Ok(());
        };

        if self.tree.contains(key) {
            writeln!(self.output, "Key found")
        } else {
            writeln!(self.output, "Key not found")
        }
    }

    fn traverse(&mut self) -> io::Result<()> {
        let keys: Vec<String> = self.tree.traverse().iter().map(Key::to_string).collect();
        writeln!(self.output, "Tree traversal: {}", keys.join(" "))
    }

    /// Read one line without its line terminator. `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}
