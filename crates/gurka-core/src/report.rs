//! Report file model.
//!
//! A report (`*.gurka`) is a JSON document describing one test run. Every
//! member is optional on disk; missing values deserialize to their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Testrun {
    pub name: String,
    pub date_and_time: String,
    pub run_date: String,
    pub branch_name: String,
    pub commit_id: String,
    pub commit_message: String,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Product {
    pub name: String,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Feature {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: String,
    pub tags: Vec<String>,
    pub scenarios: Vec<Scenario>,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Rule {
    pub name: String,
    pub description: String,
    pub status: String,
    pub tags: Vec<String>,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Scenario {
    pub name: String,
    pub status: String,
    pub test_duration: String,
    pub tags: Vec<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Step {
    pub kind: String,
    pub text: String,
    pub status: String,
}

impl Testrun {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Report { path: path.to_path_buf(), message: e.to_string() })
    }

    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

impl Step {
    /// Step line as written in the feature file, e.g. `Given a cart`.
    pub fn line(&self) -> String {
        if self.kind.is_empty() {
            self.text.clone()
        } else {
            format!("{} {}", self.kind, self.text)
        }
    }
}
