//! CSV-backed news headline feed.
//!
//! Rows are immutable facts keyed by date:
//!
//! ```text
//! date,headline,topic,link,outlet
//! ```
//!
//! The older Spanish headers (`fecha,titular,termino,enlace,medio`) are also
//! accepted.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::error::IndexError;
use crate::index::{check_schema, ColumnSpec};
use crate::models::{parse_stored_date, NewsItem};

const REQUIRED_COLUMNS: &[ColumnSpec] = &[
    ("date", &["fecha"]),
    ("headline", &["titular"]),
    ("topic", &["termino"]),
    ("link", &["enlace"]),
    ("outlet", &["medio"]),
];

#[derive(Debug, Deserialize)]
struct NewsRow {
    #[serde(default, alias = "fecha")]
    date: Option<String>,
    #[serde(default, alias = "titular")]
    headline: Option<String>,
    #[serde(default, alias = "termino")]
    topic: Option<String>,
    #[serde(default, alias = "enlace")]
    link: Option<String>,
    #[serde(default, alias = "medio")]
    outlet: Option<String>,
}

impl From<NewsRow> for NewsItem {
    fn from(row: NewsRow) -> Self {
        NewsItem {
            date: parse_stored_date(row.date.as_deref().unwrap_or("")),
            headline: row.headline.unwrap_or_default().trim().to_string(),
            topic: row.topic.unwrap_or_default().trim().to_string(),
            outlet: row.outlet.unwrap_or_default().trim().to_string(),
            link: row.link.unwrap_or_default().trim().to_string(),
        }
    }
}

/// In-memory snapshot of the news CSV.
#[derive(Debug, Clone)]
pub struct NewsFeed {
    path: PathBuf,
    items: Vec<NewsItem>,
}

impl NewsFeed {
    /// Read the news file. Same error contract as
    /// [`DocumentIndex::load`](crate::index::DocumentIndex::load).
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        if !path.exists() {
            return Err(IndexError::StoreNotFound(path.to_path_buf()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_path(path)?;
        let headers = reader.headers()?.clone();
        check_schema(path, &headers, REQUIRED_COLUMNS)?;

        let items = reader
            .deserialize::<NewsRow>()
            .map(|row| row.map(NewsItem::from))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(path = %path.display(), items = items.len(), "news feed loaded");
        Ok(Self {
            path: path.to_path_buf(),
            items,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    /// Headlines published on `date`, in file order.
    pub fn for_date(&self, date: NaiveDate) -> Vec<&NewsItem> {
        self.items.iter().filter(|i| i.date == Some(date)).collect()
    }

    /// Distinct dates with at least one headline, most recent first.
    pub fn available_dates(&self) -> Vec<NaiveDate> {
        let dates: BTreeSet<NaiveDate> = self.items.iter().filter_map(|i| i.date).collect();
        dates.into_iter().rev().collect()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.items.iter().filter_map(|i| i.date).max()
    }
}
