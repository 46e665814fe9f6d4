//! SQLite-backed catalog store.
//!
//! A connection is opened and closed per call; the database file is the only
//! shared state between the crawler and the web server.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, types::Value, Connection, Row};

use crate::models::{ScrapedToy, SortOrder, Toy, ToyFilter};

/// Columns the filter selects can be populated from. Keeping this an enum
/// means no caller-supplied string ever reaches the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Category,
    AgeRange,
    Brand,
}

impl Facet {
    fn column(&self) -> &'static str {
        match self {
            Facet::Category => "category",
            Facet::AgeRange => "age_range",
            Facet::Brand => "brand",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogDb {
    path: PathBuf,
}

impl CatalogDb {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.path)
            .with_context(|| format!("Failed to open catalog database {}", self.path.display()))
    }

    /// Create the toys table if it doesn't exist yet.
    pub fn init(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS toys (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                price       REAL NOT NULL,
                category    TEXT,
                age_range   TEXT,
                brand       TEXT,
                url         TEXT,
                image_url   TEXT
            )",
            [],
        )
        .context("Failed to create toys table")?;
        Ok(())
    }

    /// Insert a toy unless one with the same name and price already exists.
    /// Returns whether a row was actually inserted.
    pub fn insert_toy(&self, toy: &ScrapedToy) -> Result<bool> {
        if self.toy_exists(&toy.name, toy.price)? {
            return Ok(false);
        }

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO toys (name, price, category, age_range, brand, url, image_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                toy.name,
                toy.price,
                toy.category,
                toy.age_range,
                toy.brand,
                toy.url,
                toy.image_url,
            ],
        )
        .context("Failed to insert toy")?;
        Ok(true)
    }

    /// Simple duplicate check on (name, price).
    pub fn toy_exists(&self, name: &str, price: f64) -> Result<bool> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT 1 FROM toys WHERE name = ?1 AND price = ?2 LIMIT 1")?;
        let found = stmt.exists(params![name, price])?;
        Ok(found)
    }

    /// Distinct non-empty values of a facet column, for the filter selects.
    pub fn distinct_values(&self, facet: Facet) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let column = facet.column();
        let sql = format!(
            "SELECT DISTINCT {column} FROM toys
             WHERE {column} IS NOT NULL AND {column} <> ''
             ORDER BY {column}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read distinct facet values")?;
        Ok(values)
    }

    /// Filtered, ordered catalog search.
    pub fn search(&self, filter: &ToyFilter, order: SortOrder) -> Result<Vec<Toy>> {
        let mut sql = String::from(
            "SELECT id, name, price, category, age_range, brand, url, image_url
             FROM toys WHERE 1=1",
        );
        let mut bindings: Vec<Value> = Vec::new();

        if let Some(category) = &filter.category {
            sql.push_str(" AND category = ?");
            bindings.push(Value::from(category.clone()));
        }
        if let Some(age_range) = &filter.age_range {
            sql.push_str(" AND age_range = ?");
            bindings.push(Value::from(age_range.clone()));
        }
        if let Some(brand) = &filter.brand {
            sql.push_str(" AND brand = ?");
            bindings.push(Value::from(brand.clone()));
        }
        if let Some(min_price) = filter.min_price {
            sql.push_str(" AND price >= ?");
            bindings.push(Value::from(min_price));
        }
        if let Some(max_price) = filter.max_price {
            sql.push_str(" AND price <= ?");
            bindings.push(Value::from(max_price));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(order.sql());

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let toys = stmt
            .query_map(params_from_iter(bindings), row_to_toy)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read search results")?;
        Ok(toys)
    }

    /// The whole catalog, used to build the recommender prompt.
    pub fn all_toys(&self) -> Result<Vec<Toy>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, price, category, age_range, brand, url, image_url FROM toys",
        )?;
        let toys = stmt
            .query_map([], row_to_toy)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read catalog")?;
        Ok(toys)
    }
}

fn row_to_toy(row: &Row<'_>) -> rusqlite::Result<Toy> {
    Ok(Toy {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        category: row.get(3)?,
        age_range: row.get(4)?,
        brand: row.get(5)?,
        url: row.get(6)?,
        image_url: row.get(7)?,
    })
}
