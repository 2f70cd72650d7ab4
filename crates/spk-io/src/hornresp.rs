//! Hornresp text-format boundary: a record emitter for cross-validation, a
//! record reader (to verify emitted files re-parse without loss), and a
//! reader for Hornresp simulation result tables.
//!
//! This is the one place the engine speaks non-SI units: areas in cm²,
//! lengths in cm, masses in grams, inductances in millihenries, volumes in
//! litres. Compliance stays in m/N, formatted in scientific notation with
//! exactly two fractional digits. Lines end CRLF; section headers are
//! prefixed with `|`; parameters are `Name = Value` lines.

use std::f64::consts::PI;

use spk_core::driver::ThieleSmall;
use spk_core::medium::Medium;
use spk_core::radiation;
use spk_core::response::DRIVE_VOLTAGE;
use spk_core::Enclosure;

/// Hornresp supports at most four horn segments (S1–S5 boundaries).
pub const MAX_SEGMENTS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum HornrespError {
    #[error("hornresp supports at most {MAX_SEGMENTS} segments, got {0}")]
    TooManySegments(usize),
    #[error(
        "radiation space {ang_pi} x Pi needs a rear chamber: Vrc = 0 is only \
         legal with half-space (2 x Pi)"
    )]
    RadiationSpaceNeedsRearChamber { ang_pi: f64 },
    #[error("line {line}: expected `Name = Value`, got {content:?}")]
    ParseLine { line: usize, content: String },
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("field {field}: cannot parse {value:?} as a number")]
    ParseNumber { field: String, value: String },
    #[error("result table contains no data rows")]
    EmptyResults,
}

/// Emit a Hornresp-format record for a driver/enclosure pair.
pub fn emit(
    driver: &ThieleSmall,
    enclosure: &Enclosure,
    medium: &Medium,
    comment: Option<&str>,
) -> Result<String, HornrespError> {
    let ang_pi = medium.radiation_space.solid_angle() / PI;

    // Segment boundary areas (cm²), lengths (cm), and flare cutoffs (Hz).
    let mut areas_cm2 = [0.0f64; MAX_SEGMENTS + 1];
    let mut lengths_cm = [0.0f64; MAX_SEGMENTS];
    let mut cutoffs_hz = [0.0f64; MAX_SEGMENTS];
    let mut v_rc_l = 0.0f64;
    let mut v_tc_l = 0.0f64;
    let mut a_tc_cm2 = 0.0f64;
    let mut port_area_cm2 = 0.0f64;
    let mut port_length_cm = 0.0f64;

    match enclosure {
        Enclosure::Sealed(g) => {
            v_rc_l = g.v_b * 1e3;
        }
        Enclosure::Ported(g) => {
            v_rc_l = g.v_b * 1e3;
            port_area_cm2 = g.s_p * 1e4;
            port_length_cm = g.l_p * 1e2;
        }
        Enclosure::Horn(g) => {
            if g.segments.len() > MAX_SEGMENTS {
                return Err(HornrespError::TooManySegments(g.segments.len()));
            }
            for (i, seg) in g.segments.iter().enumerate() {
                areas_cm2[i] = seg.s_in * 1e4;
                areas_cm2[i + 1] = seg.s_out * 1e4;
                lengths_cm[i] = seg.length * 1e2;
                cutoffs_hz[i] = seg.cutoff_frequency(medium).unwrap_or(0.0);
            }
            v_rc_l = g.rear_chamber.map_or(0.0, |r| r.volume * 1e3);
            if let Some(tc) = g.throat_chamber {
                v_tc_l = tc.volume * 1e3;
                a_tc_cm2 = tc.area.unwrap_or(0.0) * 1e4;
            }
        }
    }

    if v_rc_l <= 0.0 && (ang_pi - 2.0).abs() > 1e-12 {
        return Err(HornrespError::RadiationSpaceNeedsRearChamber { ang_pi });
    }

    let m_md_g = match driver.m_md {
        Some(m) => m * 1e3,
        // Strip the two-sided resonance air load back off the total mass.
        None => {
            let m_rad = radiation::radiation_mass(driver.f_s, driver.s_d, medium)
                .unwrap_or(0.0);
            (driver.m_ms - 2.0 * m_rad) * 1e3
        }
    };

    let mut lines: Vec<String> = Vec::new();
    lines.push("|Hornresp Export".to_string());
    lines.push(format!("|{}", comment.unwrap_or("")));
    lines.push("|".to_string());
    lines.push(format!("ID = {}", driver.id));
    lines.push(format!("Ang = {ang_pi:.1} x Pi"));
    lines.push(format!("Eg = {DRIVE_VOLTAGE:.2}"));
    lines.push("Rg = 0.00".to_string());

    lines.push("|Horn".to_string());
    for (i, a) in areas_cm2.iter().enumerate() {
        lines.push(format!("S{} = {a:.2}", i + 1));
    }
    // The Hornresp overload of `Exp`: one length-per-segment line each.
    for l in &lengths_cm {
        lines.push(format!("Exp = {l:.2}"));
    }
    for (i, fc) in cutoffs_hz.iter().enumerate() {
        lines.push(format!("F{}{} = {fc:.2}", i + 1, i + 2));
    }

    lines.push("|Driver".to_string());
    lines.push(format!("Sd = {:.2}", driver.s_d * 1e4));
    lines.push(format!("Bl = {:.2}", driver.bl));
    lines.push(format!("Cms = {:.2E}", driver.c_ms));
    lines.push(format!("Rms = {:.2}", driver.r_ms));
    lines.push(format!("Mmd = {m_md_g:.2}"));
    lines.push(format!("Le = {:.2}", driver.l_e.unwrap_or(0.0) * 1e3));
    lines.push(format!("Re = {:.2}", driver.r_e));

    lines.push("|Chambers".to_string());
    lines.push(format!("Vrc = {v_rc_l:.2}"));
    lines.push(format!("Vtc = {v_tc_l:.2}"));
    lines.push(format!("Atc = {a_tc_cm2:.2}"));

    lines.push("|Port".to_string());
    lines.push(format!("Ap = {port_area_cm2:.2}"));
    lines.push(format!("Lpt = {port_length_cm:.2}"));

    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    Ok(out)
}

/// A parsed Hornresp record: header/comment lines plus ordered
/// `Name = Value` parameters (names may repeat, e.g. `Exp`).
#[derive(Debug, Clone, Default)]
pub struct HornrespRecord {
    pub comments: Vec<String>,
    pub params: Vec<(String, String)>,
}

impl HornrespRecord {
    pub fn parse(text: &str) -> Result<Self, HornrespError> {
        let mut record = HornrespRecord::default();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('|') {
                record.comments.push(comment.to_string());
                continue;
            }
            match line.split_once('=') {
                Some((name, value)) => record
                    .params
                    .push((name.trim().to_string(), value.trim().to_string())),
                None => {
                    return Err(HornrespError::ParseLine {
                        line: idx + 1,
                        content: line.to_string(),
                    })
                }
            }
        }
        Ok(record)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_f64(&self, name: &'static str) -> Result<f64, HornrespError> {
        let value = self.get(name).ok_or(HornrespError::MissingField(name))?;
        parse_number(name, value)
    }

    /// All values of a repeated key, in order.
    pub fn get_all_f64(&self, name: &str) -> Result<Vec<f64>, HornrespError> {
        self.params
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(n, v)| parse_number(n, v))
            .collect()
    }

    /// Radiation space as a multiple of π (`Ang = 2.0 x Pi` → 2.0).
    pub fn ang_pi(&self) -> Result<f64, HornrespError> {
        let value = self.get("Ang").ok_or(HornrespError::MissingField("Ang"))?;
        let first = value.split_whitespace().next().unwrap_or(value);
        parse_number("Ang", first)
    }
}

fn parse_number(field: &str, value: &str) -> Result<f64, HornrespError> {
    value.parse::<f64>().map_err(|_| HornrespError::ParseNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Parallel arrays from a Hornresp simulation result table: frequency, the
/// real and imaginary impedance parts, |Ze|, and SPL. Used only for
/// validation comparisons.
#[derive(Debug, Clone)]
pub struct HornrespResults {
    pub frequency: Vec<f64>,
    pub re: Vec<f64>,
    pub xe: Vec<f64>,
    pub ze: Vec<f64>,
    pub spl: Vec<f64>,
}

/// Parse a whitespace-separated result table. Lines starting with `|` and
/// lines whose first token is not a number are skipped as headers.
pub fn parse_results(text: &str) -> Result<HornrespResults, HornrespError> {
    let mut out = HornrespResults {
        frequency: Vec::new(),
        re: Vec::new(),
        xe: Vec::new(),
        ze: Vec::new(),
        spl: Vec::new(),
    };
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('|') {
            continue;
        }
        let cols: Vec<f64> = line
            .split_whitespace()
            .map_while(|t| t.parse::<f64>().ok())
            .collect();
        if cols.len() < 5 {
            continue;
        }
        out.frequency.push(cols[0]);
        out.re.push(cols[1]);
        out.xe.push(cols[2]);
        out.ze.push(cols[3]);
        out.spl.push(cols[4]);
    }
    if out.frequency.is_empty() {
        return Err(HornrespError::EmptyResults);
    }
    Ok(out)
}
