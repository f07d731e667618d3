//! Title catalog (CSV with `id` and `titulo` or `title` columns)

use shared::models::TitleOption;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use super::{CatalogError, CatalogResult};

#[derive(Debug, Clone, Default)]
pub struct TitleCatalog {
    titles: Vec<TitleOption>,
    by_id: HashMap<i64, usize>,
}

impl TitleCatalog {
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader(reader: impl Read) -> CatalogResult<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let column = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(n)))
        };
        let id_col = column(&["id"]).ok_or(CatalogError::MissingColumn("id"))?;
        let title_col = column(&["titulo", "title"]).ok_or(CatalogError::MissingColumn("titulo"))?;

        let mut catalog = Self::default();
        for record in csv.records() {
            let record = record?;
            let raw_id = record.get(id_col).unwrap_or_default();
            let title = record.get(title_col).unwrap_or_default();
            if raw_id.is_empty() && title.is_empty() {
                continue;
            }
            let id: i64 = raw_id.parse().map_err(|_| CatalogError::InvalidId {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                value: raw_id.to_string(),
            })?;
            catalog.by_id.insert(id, catalog.titles.len());
            catalog.titles.push(TitleOption {
                id,
                title: title.to_string(),
            });
        }
        Ok(catalog)
    }

    pub fn all(&self) -> &[TitleOption] {
        &self.titles
    }

    pub fn get(&self, id: i64) -> Option<&str> {
        self.by_id.get(&id).map(|&idx| self.titles[idx].title.as_str())
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_titulo_column() {
        let csv = "id,titulo\n1, Camiseta Básica \n2,\"Sudadera, con capucha\"\n\n";
        let catalog = TitleCatalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(1), Some("Camiseta Básica"));
        assert_eq!(catalog.get(2), Some("Sudadera, con capucha"));
        assert_eq!(catalog.get(3), None);
    }

    #[test]
    fn test_title_header_and_column_order() {
        let csv = "\u{feff}Title,ID\nGorra,7\n";
        let catalog = TitleCatalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.all()[0], TitleOption { id: 7, title: "Gorra".into() });
    }

    #[test]
    fn test_bad_rows_are_errors() {
        assert!(matches!(
            TitleCatalog::from_reader("name,titulo\nx,y\n".as_bytes()),
            Err(CatalogError::MissingColumn("id"))
        ));
        assert!(matches!(
            TitleCatalog::from_reader("id,titulo\nabc,y\n".as_bytes()),
            Err(CatalogError::InvalidId { line: 2, .. })
        ));
    }
}
