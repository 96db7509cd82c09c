//! Administrative surface over the visibility store.
//!
//! Works against a live [`ChannelFilter`] (session counts and upstream
//! channel state available) or offline against a bare store.

use crate::error::{AdminError, check_identifier};
use crate::filter::ChannelFilter;
use crate::state::VisibilityStore;
use crate::telemetry::spans;
use chanfilter_proto::irc_to_lower;
use std::collections::BTreeMap;

/// Longest hidden-channel list shown in a table cell.
const MAX_CELL_WIDTH: usize = 128;

/// One row of `ListClients`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSummary {
    pub identifier: String,
    pub active_sessions: usize,
    pub hidden: Vec<String>,
}

/// One row of `ListChannels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelVisibility {
    pub channel: String,
    pub visible: bool,
    /// The upstream connection is on the channel.
    pub joined: bool,
}

pub struct Admin<'a> {
    store: &'a VisibilityStore,
    filter: Option<&'a ChannelFilter>,
}

impl<'a> Admin<'a> {
    /// Admin over a running filter.
    pub fn live(filter: &'a ChannelFilter) -> Self {
        Self {
            store: filter.store(),
            filter: Some(filter),
        }
    }

    /// Admin over a store with no sessions or upstream attached.
    pub fn offline(store: &'a VisibilityStore) -> Self {
        Self {
            store,
            filter: None,
        }
    }

    /// Register an identifier. Returns `true` if it is new.
    pub fn add_client(&self, identifier: &str) -> Result<bool, AdminError> {
        check_identifier(identifier)?;
        let added = self.store.add_identifier(identifier)?;
        crate::metrics::set_known_identifiers(self.store.identifiers().len());
        Ok(added)
    }

    /// Forget an identifier and its hidden channels. Returns whether it existed.
    pub fn remove_client(&self, identifier: &str) -> Result<bool, AdminError> {
        check_identifier(identifier)?;
        let removed = self.store.remove_identifier(identifier)?;
        crate::metrics::set_known_identifiers(self.store.identifiers().len());
        Ok(removed)
    }

    pub fn list_clients(&self) -> Vec<ClientSummary> {
        self.store
            .identifiers()
            .into_iter()
            .map(|identifier| ClientSummary {
                active_sessions: self
                    .filter
                    .map_or(0, |f| f.active_sessions(&identifier)),
                hidden: self
                    .store
                    .list_hidden(&identifier)
                    .iter()
                    .map(str::to_string)
                    .collect(),
                identifier,
            })
            .collect()
    }

    /// Visibility of every channel the upstream is on or the identifier hides.
    pub fn channel_status(&self, identifier: &str) -> Result<Vec<ChannelVisibility>, AdminError> {
        check_identifier(identifier)?;

        let mut channels: BTreeMap<String, ChannelVisibility> = BTreeMap::new();
        if let Some(filter) = self.filter {
            for name in filter.network().joined_channels() {
                let folded = irc_to_lower(&name);
                channels.insert(
                    folded.clone(),
                    ChannelVisibility {
                        visible: self.store.is_visible(identifier, &folded),
                        channel: folded,
                        joined: true,
                    },
                );
            }
        }
        for name in self.store.list_hidden(identifier).iter() {
            channels
                .entry(name.to_string())
                .or_insert_with(|| ChannelVisibility {
                    channel: name.to_string(),
                    visible: false,
                    joined: false,
                });
        }
        Ok(channels.into_values().collect())
    }

    /// Run one text command and return the reply lines.
    pub fn execute(&self, line: &str) -> Vec<String> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return help();
        };
        let argument = words.next();
        let _span = spans::admin(command).entered();

        match command.to_ascii_lowercase().as_str() {
            "help" => help(),
            "addclient" => match argument {
                None => vec!["Usage: AddClient <identifier>".to_string()],
                Some(id) => match self.add_client(id) {
                    Ok(_) => self.clients_table(),
                    Err(e) => reply_error("AddClient", &e),
                },
            },
            "delclient" => match argument {
                None => vec!["Usage: DelClient <identifier>".to_string()],
                Some(id) => match self.remove_client(id) {
                    Ok(_) => self.clients_table(),
                    Err(e) => reply_error("DelClient", &e),
                },
            },
            "listclients" => self.clients_table(),
            "listchannels" => match argument {
                None => vec!["Usage: ListChannels <identifier>".to_string()],
                Some(id) => match self.channel_status(id) {
                    Ok(rows) if rows.is_empty() => vec![format!("No channels for {id}")],
                    Ok(rows) => render_table(
                        &["Channel", "Status", "Upstream"],
                        rows.into_iter()
                            .map(|r| {
                                vec![
                                    r.channel,
                                    if r.visible { "Visible" } else { "Hidden" }.to_string(),
                                    if r.joined { "Joined" } else { "-" }.to_string(),
                                ]
                            })
                            .collect(),
                    ),
                    Err(e) => reply_error("ListChannels", &e),
                },
            },
            _ => vec![format!("Unknown command: {command}. Try Help")],
        }
    }

    fn clients_table(&self) -> Vec<String> {
        let clients = self.list_clients();
        if clients.is_empty() {
            return vec!["No identified clients".to_string()];
        }
        render_table(
            &["Client", "Active", "Hidden"],
            clients
                .into_iter()
                .map(|c| {
                    vec![
                        c.identifier,
                        c.active_sessions.to_string(),
                        ellipsize(&c.hidden.join(","), MAX_CELL_WIDTH),
                    ]
                })
                .collect(),
        )
    }
}

fn help() -> Vec<String> {
    render_table(
        &["Command", "Arguments", "Description"],
        [
            ["AddClient", "<identifier>", "Add a client."],
            ["DelClient", "<identifier>", "Delete a client."],
            ["ListClients", "", "List clients."],
            ["ListChannels", "<identifier>", "List a client's channels."],
            ["Help", "", "Show this help."],
        ]
        .into_iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect(),
    )
}

fn reply_error(command: &str, error: &AdminError) -> Vec<String> {
    if error.is_usage() {
        vec![format!("Usage: {command} <identifier> ({error})")]
    } else {
        vec![format!("Error: {error}")]
    }
}

/// Cut `s` to at most `max` characters, marking the cut with `...`.
fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Render a bordered text table.
fn render_table(headers: &[&str], rows: Vec<Vec<String>>) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = {
        let mut line = String::from("+");
        for width in &widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    };
    let mut out = vec![border.clone()];
    out.push(format_row(headers.iter().copied(), &widths));
    out.push(border.clone());
    for row in &rows {
        out.push(format_row(row.iter().map(String::as_str), &widths));
    }
    out.push(border);
    out
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.zip(widths) {
        let pad = width.saturating_sub(cell.chars().count());
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(pad + 1));
        line.push('|');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryKv;
    use std::sync::Arc;

    fn store() -> VisibilityStore {
        VisibilityStore::load(Arc::new(MemoryKv::new())).unwrap()
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("#a,#b", 128), "#a,#b");
        let long = "#".repeat(200);
        let cut = ellipsize(&long, 128);
        assert_eq!(cut.chars().count(), 128);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&["A", "Bee"], vec![vec!["xyz".into(), "1".into()]]);
        assert_eq!(
            table,
            vec![
                "+-----+-----+",
                "| A   | Bee |",
                "+-----+-----+",
                "| xyz | 1   |",
                "+-----+-----+",
            ]
        );
    }

    #[test]
    fn test_empty_listing() {
        let store = store();
        let admin = Admin::offline(&store);
        assert_eq!(admin.execute("ListClients"), vec!["No identified clients"]);
    }

    #[test]
    fn test_add_and_delete_commands() {
        let store = store();
        let admin = Admin::offline(&store);

        let reply = admin.execute("AddClient phone");
        assert!(reply.iter().any(|l| l.contains("| phone  | 0      |")));
        assert!(store.has_identifier("phone"));

        let reply = admin.execute("delclient phone");
        assert_eq!(reply, vec!["No identified clients"]);
        assert!(!store.has_identifier("phone"));
    }

    #[test]
    fn test_usage_replies() {
        let store = store();
        let admin = Admin::offline(&store);
        assert_eq!(admin.execute("AddClient"), vec!["Usage: AddClient <identifier>"]);
        assert_eq!(admin.execute("DelClient"), vec!["Usage: DelClient <identifier>"]);
        assert_eq!(admin.execute("ListChannels"), vec!["Usage: ListChannels <identifier>"]);
        assert!(admin.execute("Frobnicate")[0].starts_with("Unknown command"));
    }

    #[test]
    fn test_list_channels_offline() {
        let store = store();
        store.set_visible("phone", "#Secret", false).unwrap();
        let admin = Admin::offline(&store);

        let status = admin.channel_status("phone").unwrap();
        assert_eq!(
            status,
            vec![ChannelVisibility {
                channel: "#secret".into(),
                visible: false,
                joined: false,
            }]
        );
        assert_eq!(admin.execute("ListChannels laptop"), vec!["No channels for laptop"]);
    }

    #[test]
    fn test_list_clients_shows_hidden() {
        let store = store();
        store.set_visible("phone", "#b", false).unwrap();
        store.set_visible("phone", "#a", false).unwrap();
        let admin = Admin::offline(&store);

        let clients = admin.list_clients();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].hidden, vec!["#a", "#b"]);
        assert_eq!(clients[0].active_sessions, 0);
    }

    #[test]
    fn test_help_lists_commands() {
        let store = store();
        let reply = Admin::offline(&store).execute("help");
        assert!(reply.iter().any(|l| l.contains("ListChannels")));
    }
}
