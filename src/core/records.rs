//! Purpose: Name the positional status and listing tuples returned by the board.
//! Exports: `BoardStatus`, `BoardListing`, `BulletinListing` and their raw tuple aliases.
//! Role: Single source of truth for record field labels and order.
//! Invariants: Values are carried verbatim; no coercion, no reordering.
//! Invariants: Serialized labels and order match the `FIELDS` constants exactly.

use serde::{Deserialize, Serialize};

/// `(datasize, memory_used, memory_used_percent, bulletins, files, archived)`.
pub type RawStatus = (u64, u64, f64, u64, u64, u64);
/// `(title, tag, revision_count)`.
pub type RawBoardEntry = (String, String, u64);
/// `(revision, datasize, timestamp, backend)`.
pub type RawBulletinEntry = (u64, u64, String, String);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardStatus {
    pub datasize: u64,
    pub memory_used: u64,
    #[serde(rename = "memory_used(%)")]
    pub memory_used_percent: f64,
    pub bulletins: u64,
    pub files: u64,
    pub archived: u64,
}

impl BoardStatus {
    pub const FIELDS: [&'static str; 6] = [
        "datasize",
        "memory_used",
        "memory_used(%)",
        "bulletins",
        "files",
        "archived",
    ];

    pub fn from_raw(raw: RawStatus) -> Self {
        let (datasize, memory_used, memory_used_percent, bulletins, files, archived) = raw;
        Self {
            datasize,
            memory_used,
            memory_used_percent,
            bulletins,
            files,
            archived,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BoardListing {
    pub title: String,
    pub tag: String,
    pub revisions: u64,
}

impl BoardListing {
    pub const FIELDS: [&'static str; 3] = ["title", "tag", "revisions"];

    pub fn from_raw(raw: RawBoardEntry) -> Self {
        let (title, tag, revisions) = raw;
        Self {
            title,
            tag,
            revisions,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BulletinListing {
    pub revision: u64,
    pub datasize: u64,
    pub timestamp: String,
    pub backend: String,
}

impl BulletinListing {
    pub const FIELDS: [&'static str; 4] = ["revision", "datasize", "timestamp", "backend"];

    pub fn from_raw(raw: RawBulletinEntry) -> Self {
        let (revision, datasize, timestamp, backend) = raw;
        Self {
            revision,
            datasize,
            timestamp,
            backend,
        }
    }
}

pub fn board_listings(raw: Vec<RawBoardEntry>) -> Vec<BoardListing> {
    raw.into_iter().map(BoardListing::from_raw).collect()
}

pub fn bulletin_listings(raw: Vec<RawBulletinEntry>) -> Vec<BulletinListing> {
    raw.into_iter().map(BulletinListing::from_raw).collect()
}

#[cfg(test)]
mod tests {
    use super::{BoardListing, BoardStatus, BulletinListing, board_listings, bulletin_listings};

    fn object_keys(json: &str) -> Vec<String> {
        // Keys in emission order; a BTreeMap-backed `Value` would sort them.
        json.trim_matches(|c| c == '{' || c == '}')
            .split(',')
            .map(|pair| pair.split("\":").next().unwrap_or("").trim_matches('"').to_string())
            .collect()
    }

    #[test]
    fn status_maps_positions_to_labels() {
        let status = BoardStatus::from_raw((100, 50, 50.0, 3, 2, 1));
        assert_eq!(
            status,
            BoardStatus {
                datasize: 100,
                memory_used: 50,
                memory_used_percent: 50.0,
                bulletins: 3,
                files: 2,
                archived: 1,
            }
        );
        let json = serde_json::to_string(&status).expect("json");
        assert_eq!(
            json,
            r#"{"datasize":100,"memory_used":50,"memory_used(%)":50.0,"bulletins":3,"files":2,"archived":1}"#
        );
        assert_eq!(object_keys(&json), BoardStatus::FIELDS);
    }

    #[test]
    fn board_listing_preserves_order() {
        let listings = board_listings(vec![
            ("b".into(), "t2".into(), 4),
            ("a".into(), "t1".into(), 1),
        ]);
        assert_eq!(listings[0].title, "b");
        assert_eq!(listings[1].revisions, 1);
        let json = serde_json::to_string(&listings[0]).expect("json");
        assert_eq!(object_keys(&json), BoardListing::FIELDS);
    }

    #[test]
    fn bulletin_listing_carries_fields_verbatim() {
        let listings = bulletin_listings(vec![(
            0,
            24,
            "2026-01-01T00:00:00Z".into(),
            "memory".into(),
        )]);
        assert_eq!(
            listings,
            vec![BulletinListing {
                revision: 0,
                datasize: 24,
                timestamp: "2026-01-01T00:00:00Z".into(),
                backend: "memory".into(),
            }]
        );
        let json = serde_json::to_string(&listings[0]).expect("json");
        assert_eq!(object_keys(&json), BulletinListing::FIELDS);
    }
}
