//! Driver catalogue: YAML/JSON Thiele–Small records in datasheet units,
//! converted to SI exactly once, here.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use spk_core::driver::{DriverParams, ThieleSmall};
use spk_core::error::AcousticError;
use spk_core::medium::Medium;

/// Catalogue and record errors; core validation errors pass through
/// unchanged.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalogue I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalogue YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("catalogue JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown driver id: {0}")]
    UnknownDriver(String),
    #[error("unsupported catalogue extension: {0}")]
    UnsupportedFormat(String),
    #[error("record {id}: needs either vas_l or cms_mm_per_n")]
    MissingCompliance { id: String },
    #[error(transparent)]
    Invalid(#[from] AcousticError),
}

/// One catalogue entry in datasheet units: litres, cm², grams, mm,
/// millihenries. Either `vas_l` or `cms_mm_per_n` must be present; `bl_tm`
/// is optional and derived from Q_es when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverRecord {
    pub id: String,
    pub fs_hz: f64,
    pub q_es: f64,
    pub q_ms: f64,
    #[serde(default)]
    pub vas_l: Option<f64>,
    #[serde(default)]
    pub cms_mm_per_n: Option<f64>,
    pub sd_cm2: f64,
    pub re_ohm: f64,
    #[serde(default)]
    pub bl_tm: Option<f64>,
    #[serde(default)]
    pub mmd_g: Option<f64>,
    #[serde(default)]
    pub le_mh: Option<f64>,
    #[serde(default)]
    pub re2_ohm: Option<f64>,
    #[serde(default)]
    pub xmax_mm: Option<f64>,
}

impl DriverRecord {
    /// Convert to a validated SI record against a medium.
    pub fn to_thiele_small(&self, medium: &Medium) -> Result<ThieleSmall, CatalogError> {
        let s_d = self.sd_cm2 * 1e-4;
        let v_as = match (self.vas_l, self.cms_mm_per_n) {
            (Some(v), _) => v * 1e-3,
            (None, Some(cms_mm)) => {
                // V_as = C_ms·ρc²·S_d², with the datasheet compliance in mm/N.
                cms_mm * 1e-3 * medium.rho * medium.c * medium.c * s_d * s_d
            }
            (None, None) => {
                return Err(CatalogError::MissingCompliance {
                    id: self.id.clone(),
                })
            }
        };

        let driver = match self.bl_tm {
            Some(bl) => ThieleSmall::new(
                DriverParams {
                    id: self.id.clone(),
                    f_s: self.fs_hz,
                    q_es: self.q_es,
                    q_ms: self.q_ms,
                    v_as,
                    s_d,
                    r_e: self.re_ohm,
                    bl,
                    m_md: self.mmd_g.map(|g| g * 1e-3),
                    l_e: self.le_mh.map(|mh| mh * 1e-3),
                    r_e2: self.re2_ohm,
                    x_max: self.xmax_mm.map(|mm| mm * 1e-3),
                },
                medium,
            )?,
            None => {
                let mut d = ThieleSmall::from_alignment(
                    &self.id,
                    self.fs_hz,
                    self.q_es,
                    self.q_ms,
                    v_as,
                    s_d,
                    self.re_ohm,
                    medium,
                )?;
                d.l_e = self.le_mh.map(|mh| mh * 1e-3);
                d.r_e2 = self.re2_ohm;
                d.x_max = self.xmax_mm.map(|mm| mm * 1e-3);
                d
            }
        };
        Ok(driver)
    }
}

/// A supplier of Thiele–Small records by identifier.
pub trait DriverSource {
    fn driver(&self, id: &str) -> Result<ThieleSmall, CatalogError>;

    fn ids(&self) -> Vec<String>;
}

/// In-memory catalogue backed by a YAML or JSON file (list of records).
#[derive(Debug, Clone)]
pub struct FileCatalog {
    records: HashMap<String, DriverRecord>,
    medium: Medium,
}

impl FileCatalog {
    pub fn from_path(path: &Path, medium: Medium) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&text, medium),
            Some("json") => Self::from_json(&text, medium),
            other => Err(CatalogError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn from_yaml(text: &str, medium: Medium) -> Result<Self, CatalogError> {
        let records: Vec<DriverRecord> = serde_yaml::from_str(text)?;
        Ok(Self::from_records(records, medium))
    }

    pub fn from_json(text: &str, medium: Medium) -> Result<Self, CatalogError> {
        let records: Vec<DriverRecord> = serde_json::from_str(text)?;
        Ok(Self::from_records(records, medium))
    }

    pub fn from_records(records: Vec<DriverRecord>, medium: Medium) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
            medium,
        }
    }
}

impl DriverSource for FileCatalog {
    fn driver(&self, id: &str) -> Result<ThieleSmall, CatalogError> {
        self.records
            .get(id)
            .ok_or_else(|| CatalogError::UnknownDriver(id.to_string()))?
            .to_thiele_small(&self.medium)
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.records.keys().cloned().collect();
        ids.sort();
        ids
    }
}
