//! Hosts-table parsing and appending.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// One mapping line: an address followed by one or more names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostsEntry {
    pub address: IpAddr,
    pub names: Vec<String>,
}

impl HostsEntry {
    fn parse(line: &str) -> Option<Self> {
        let line = line.split('#').next().unwrap_or_default();
        let mut fields = line.split_whitespace();
        let address = fields.next()?.parse().ok()?;
        let names: Vec<String> = fields.map(str::to_string).collect();
        if names.is_empty() {
            return None;
        }
        Some(Self { address, names })
    }

    fn maps(&self, domain: &str) -> bool {
        self.names.iter().any(|name| name.eq_ignore_ascii_case(domain))
    }
}

/// Snapshot of the OS hosts file.
#[derive(Debug)]
pub struct HostsTable {
    path: PathBuf,
    contents: String,
    entries: Vec<HostsEntry>,
}

impl HostsTable {
    /// Read and parse the hosts file at `path`.
    pub fn open(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let entries = contents.lines().filter_map(HostsEntry::parse).collect();
        Ok(Self {
            path: path.to_path_buf(),
            contents,
            entries,
        })
    }

    /// Whether `domain` is already mapped to `address`.
    pub fn has(&self, address: IpAddr, domain: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.address == address && entry.maps(domain))
    }

    /// Every address `domain` is currently mapped to.
    pub fn addresses_for(&self, domain: &str) -> Vec<IpAddr> {
        self.entries
            .iter()
            .filter(|entry| entry.maps(domain))
            .map(|entry| entry.address)
            .collect()
    }

    /// Append `address domain` as a single write.
    pub fn append(&mut self, address: IpAddr, domain: &str) -> io::Result<()> {
        let mut line = String::new();
        if !self.contents.is_empty() && !self.contents.ends_with('\n') {
            line.push_str(line_ending());
        }
        line.push_str(&format!("{} {}{}", address, domain, line_ending()));

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        self.contents.push_str(&line);
        self.entries.push(HostsEntry {
            address,
            names: vec![domain.to_string()],
        });
        Ok(())
    }

    /// Location of the parsed file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn line_ending() -> &'static str {
    if cfg!(windows) {
        "\r\n"
    } else {
        "\n"
    }
}
