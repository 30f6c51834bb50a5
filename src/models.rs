use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recorded set of observed network messages. Immutable once created;
/// deletion happens server-side only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Capture {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

/// One observed unit of communication, belonging to exactly one capture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    /// Owning capture id.
    pub cid: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub data: String,
}

/// Fields supplied by the caller when recording a new message.
/// The server assigns the id and asserts the capture exists.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct NewMessage {
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

/// A named grouping of messages believed to share a wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Symbol {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Aligned per-field decomposition of a symbol's messages: one row per
/// member message, one column per inferred field. Server-computed; the
/// client only ever fetches it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CellGrid(pub Vec<Vec<String>>);

impl CellGrid {
    pub fn row_count(&self) -> usize {
        self.0.len()
    }

    /// Widest row; rows may be ragged before alignment has run.
    pub fn column_count(&self) -> usize {
        self.0.iter().map(|row| row.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// limit/offset window accepted by every list operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
        }
    }
}

impl Page {
    pub fn first(limit: usize) -> Self {
        Self { limit, offset: 0 }
    }

    pub(crate) fn query(&self) -> Vec<(String, String)> {
        vec![
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ]
    }
}

/// Import layer for packet-capture parsing: how deep the importer strips
/// protocol headers before storing message payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcapLayer {
    Raw = 1,
    Link = 2,
    Network = 3,
    Transport = 4,
    Application = 5,
}

impl PcapLayer {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl std::str::FromStr for PcapLayer {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "1" | "raw" => Ok(PcapLayer::Raw),
            "2" | "link" => Ok(PcapLayer::Link),
            "3" | "network" => Ok(PcapLayer::Network),
            "4" | "transport" => Ok(PcapLayer::Transport),
            "5" | "application" => Ok(PcapLayer::Application),
            _ => Err(anyhow::anyhow!(
                "Invalid layer '{s}'. Valid options: raw, link, network, transport, application"
            )),
        }
    }
}

impl fmt::Display for PcapLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PcapLayer::Raw => write!(f, "raw"),
            PcapLayer::Link => write!(f, "link"),
            PcapLayer::Network => write!(f, "network"),
            PcapLayer::Transport => write!(f, "transport"),
            PcapLayer::Application => write!(f, "application"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_description_defaults_to_empty() {
        let s: Symbol = serde_json::from_str(r#"{"id":"s1","name":"login"}"#).unwrap();
        assert_eq!(s.description, "");
    }

    #[test]
    fn message_optional_fields_default() {
        let m: Message = serde_json::from_str(r#"{"id":"m1","cid":"c1","data":"ff00"}"#).unwrap();
        assert_eq!(m.source, None);
        assert_eq!(m.destination, None);
        assert_eq!(m.date, None);
    }

    #[test]
    fn new_message_skips_absent_fields() {
        let body = serde_json::to_value(NewMessage {
            data: "aa".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"data": "aa"}));
    }

    #[test]
    fn cell_grid_counts_ragged_rows() {
        let grid = CellGrid(vec![
            vec!["00".into(), "ff".into(), "01".into()],
            vec!["00".into()],
        ]);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 3);
        assert!(!grid.is_empty());
        assert_eq!(CellGrid::default().column_count(), 0);
    }

    #[test]
    fn page_query_parameters() {
        let q = Page {
            limit: 25,
            offset: 50,
        }
        .query();
        assert_eq!(
            q,
            vec![
                ("limit".to_string(), "25".to_string()),
                ("offset".to_string(), "50".to_string())
            ]
        );
    }

    #[test]
    fn pcap_layer_parses_names_and_numbers() {
        assert_eq!(
            "transport".parse::<PcapLayer>().unwrap(),
            PcapLayer::Transport
        );
        assert_eq!("2".parse::<PcapLayer>().unwrap(), PcapLayer::Link);
        assert!("frame".parse::<PcapLayer>().is_err());
        assert_eq!(PcapLayer::Application.as_u8(), 5);
    }
}
