use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// UV exposure category, ordered from least to most sunlight
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(from = "String")]
pub enum UvLevel {
    ExtremelyLow,
    VeryLow,
    Low,
    Moderate,
    High,
    /// Label outside the known scale, kept verbatim for display
    Unrecognized(String),
}

impl UvLevel {
    pub fn label(&self) -> &str {
        match self {
            UvLevel::ExtremelyLow => "Extremely Low",
            UvLevel::VeryLow => "Very Low",
            UvLevel::Low => "Low",
            UvLevel::Moderate => "Moderate",
            UvLevel::High => "High",
            UvLevel::Unrecognized(label) => label,
        }
    }

    /// Short marker code for the map
    pub fn code(&self) -> &'static str {
        match self {
            UvLevel::ExtremelyLow => "EL",
            UvLevel::VeryLow => "VL",
            UvLevel::Low => "L",
            UvLevel::Moderate => "M",
            UvLevel::High => "H",
            UvLevel::Unrecognized(_) => "?",
        }
    }
}

impl From<String> for UvLevel {
    fn from(label: String) -> Self {
        match label.trim() {
            "Extremely Low" => UvLevel::ExtremelyLow,
            "Very Low" => UvLevel::VeryLow,
            "Low" => UvLevel::Low,
            "Moderate" => UvLevel::Moderate,
            "High" => UvLevel::High,
            _ => UvLevel::Unrecognized(label),
        }
    }
}

impl fmt::Display for UvLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Dietary Omega-3 intake category
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(from = "String")]
pub enum Omega3Level {
    Low,
    Moderate,
    High,
    VeryHigh,
    Unrecognized(String),
}

impl Omega3Level {
    pub fn label(&self) -> &str {
        match self {
            Omega3Level::Low => "Low",
            Omega3Level::Moderate => "Moderate",
            Omega3Level::High => "High",
            Omega3Level::VeryHigh => "Very High",
            Omega3Level::Unrecognized(label) => label,
        }
    }
}

impl From<String> for Omega3Level {
    fn from(label: String) -> Self {
        match label.trim() {
            "Low" => Omega3Level::Low,
            "Moderate" => Omega3Level::Moderate,
            "High" => Omega3Level::High,
            "Very High" => Omega3Level::VeryHigh,
            _ => Omega3Level::Unrecognized(label),
        }
    }
}

impl fmt::Display for Omega3Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }

    /// Marker fill color as RGB
    pub fn color(self) -> (u8, u8, u8) {
        match self {
            RiskLevel::High => (0xef, 0x44, 0x44),
            RiskLevel::Moderate => (0xf5, 0x9e, 0x0b),
            RiskLevel::Low => (0x10, 0xb9, 0x81),
        }
    }
}

/// Recommended supplement for a country
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(rename = "match")]
    pub match_label: String,
}

/// A country with its geographic position and pre-computed risk attributes
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryRecord {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub uv_index: UvLevel,
    pub omega3: Omega3Level,
    pub risk_level: RiskLevel,
    pub risk_score: u8,
    pub product: Product,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] simd_json::Error),
    #[error("catalog has no countries")]
    Empty,
    #[error("duplicate country id `{0}`")]
    DuplicateId(String),
    #[error("risk score {score} for `{id}` is outside 0-100")]
    ScoreOutOfRange { id: String, score: u8 },
}

/// Immutable, ordered set of countries driving the map
#[derive(Clone, Debug)]
pub struct Catalog {
    countries: Vec<CountryRecord>,
}

impl Catalog {
    /// Build a catalog, enforcing unique ids and scores within 0-100
    pub fn new(countries: Vec<CountryRecord>) -> Result<Self, CatalogError> {
        if countries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(countries.len());
        for country in &countries {
            if !seen.insert(country.id.as_str()) {
                return Err(CatalogError::DuplicateId(country.id.clone()));
            }
            if country.risk_score > 100 {
                return Err(CatalogError::ScoreOutOfRange {
                    id: country.id.clone(),
                    score: country.risk_score,
                });
            }
        }

        Ok(Self { countries })
    }

    /// Parse a JSON array of country records
    pub fn from_json(bytes: &mut [u8]) -> Result<Self, CatalogError> {
        let countries: Vec<CountryRecord> = simd_json::serde::from_slice(bytes)?;
        Self::new(countries)
    }

    /// Load an override catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let mut bytes = fs::read(path)?;
        Self::from_json(&mut bytes)
    }

    /// Use `countries.json` from the data directory if present, else the built-in set
    pub fn load_or_builtin(data_dir: &Path) -> Self {
        let path = data_dir.join("countries.json");
        if !path.exists() {
            return Self::europe();
        }

        match Self::load(&path) {
            Ok(catalog) => {
                tracing::info!(path = %path.display(), countries = catalog.len(), "loaded catalog override");
                catalog
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "catalog override rejected, using built-in");
                Self::europe()
            }
        }
    }

    pub fn countries(&self) -> &[CountryRecord] {
        &self.countries
    }

    /// First record, the initial selection
    pub fn first(&self) -> &CountryRecord {
        // Non-empty is checked in `new`
        &self.countries[0]
    }

    pub fn get(&self, id: &str) -> Option<&CountryRecord> {
        self.countries.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    /// Built-in European fixture
    pub fn europe() -> Self {
        let country = |id: &str,
                       name: &str,
                       lat: f64,
                       lng: f64,
                       uv: &str,
                       omega3: &str,
                       risk_level: RiskLevel,
                       risk_score: u8,
                       product: &str,
                       match_label: &str| CountryRecord {
            id: id.to_string(),
            name: name.to_string(),
            lat,
            lng,
            uv_index: UvLevel::from(uv.to_string()),
            omega3: Omega3Level::from(omega3.to_string()),
            risk_level,
            risk_score,
            product: Product {
                name: product.to_string(),
                match_label: match_label.to_string(),
            },
        };

        Self {
            countries: vec![
                country("sweden", "Sweden", 59.3293, 18.0686, "Very Low", "Moderate", RiskLevel::High, 85, "Arctic D3+", "98% Match"),
                country("germany", "Germany", 52.5200, 13.4050, "Low", "High", RiskLevel::Moderate, 45, "Euro-D Essentials", "92% Match"),
                country("france", "France", 48.8566, 2.3522, "Moderate", "Moderate", RiskLevel::Moderate, 55, "Solaris D Balance", "85% Match"),
                country("spain", "Spain", 40.4168, -3.7038, "High", "Moderate", RiskLevel::Low, 15, "Mediterranean D+", "78% Match"),
                country("uk", "United Kingdom", 51.5074, -0.1278, "Very Low", "Low", RiskLevel::High, 92, "Thames Fortify D", "99% Match"),
                country("italy", "Italy", 41.9028, 12.4964, "Moderate", "High", RiskLevel::Low, 22, "Lumina D Support", "81% Match"),
                country("norway", "Norway", 59.9139, 10.7522, "Extremely Low", "Very High", RiskLevel::High, 78, "Fjord Omega-D", "95% Match"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_unique() {
        let catalog = Catalog::europe();
        assert!(Catalog::new(catalog.countries().to_vec()).is_ok());
        assert_eq!(catalog.first().name, "Sweden");
        assert_eq!(catalog.len(), 7);
    }

    #[test]
    fn test_uv_codes() {
        assert_eq!(UvLevel::from("Extremely Low".to_string()).code(), "EL");
        assert_eq!(UvLevel::from("Very Low".to_string()).code(), "VL");
        assert_eq!(UvLevel::from("Low".to_string()).code(), "L");
        assert_eq!(UvLevel::from("Moderate".to_string()).code(), "M");
        assert_eq!(UvLevel::from("High".to_string()).code(), "H");
        assert_eq!(UvLevel::from("Scorching".to_string()).code(), "?");
    }

    #[test]
    fn test_uv_ordering() {
        assert!(UvLevel::ExtremelyLow < UvLevel::VeryLow);
        assert!(UvLevel::VeryLow < UvLevel::Low);
        assert!(UvLevel::Moderate < UvLevel::High);
    }

    #[test]
    fn test_from_json() {
        let mut json = br#"[{
            "id": "iceland", "name": "Iceland", "lat": 64.1466, "lng": -21.9426,
            "uvIndex": "Extremely Low", "omega3": "Very High",
            "riskLevel": "High", "riskScore": 70,
            "product": { "name": "Geyser D", "match": "90% Match" }
        }]"#
        .to_vec();
        let catalog = Catalog::from_json(&mut json).unwrap();
        let iceland = catalog.get("iceland").unwrap();
        assert_eq!(iceland.uv_index, UvLevel::ExtremelyLow);
        assert_eq!(iceland.omega3, Omega3Level::VeryHigh);
        assert_eq!(iceland.product.match_label, "90% Match");
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut countries = Catalog::europe().countries().to_vec();
        countries.push(countries[0].clone());
        assert!(matches!(Catalog::new(countries), Err(CatalogError::DuplicateId(id)) if id == "sweden"));
    }

    #[test]
    fn test_rejects_empty_and_bad_score() {
        assert!(matches!(Catalog::new(Vec::new()), Err(CatalogError::Empty)));

        let mut countries = Catalog::europe().countries().to_vec();
        countries[1].risk_score = 101;
        assert!(matches!(Catalog::new(countries), Err(CatalogError::ScoreOutOfRange { .. })));
    }

    #[test]
    fn test_missing_override_uses_builtin() {
        let catalog = Catalog::load_or_builtin(Path::new("/nonexistent/vitamap"));
        assert_eq!(catalog.len(), 7);
    }
}
