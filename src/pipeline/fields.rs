//! Scalar field extraction: an ordered table of anchored patterns.
//!
//! Every field of the pauta header is described by one [`FieldRule`]: a name,
//! a regex whose first capture group holds the value, the kind of value, and
//! whether a miss is expected. Rules are data, so callers can replace or
//! extend the table through [`crate::config::ParseConfigBuilder::field_rules`]
//! without touching the extractor.
//!
//! The first match of each pattern wins and the capture is trimmed. A miss
//! yields `None`; optional fields behave the same but are not reported as
//! missing.

use crate::error::PautaError;
use chrono::NaiveDate;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field whose text decides the specialty id.
pub const SPECIALTY_FIELD: &str = "Especialidad";

/// Field whose text decides the order priority.
pub const SERVICE_TYPE_FIELD: &str = "Tipo de Servicio";

/// How a captured string is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    /// Digits only; anything else becomes `None`.
    Integer,
    /// `dd/mm/yyyy` or `dd/mm/yy`; unparsable text is kept verbatim.
    Date,
}

/// One row of the field table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    /// Regex with at least one capture group; group 1 is the value.
    pub pattern: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub optional: bool,
}

impl FieldRule {
    fn new(name: impl Into<String>, pattern: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            kind,
            optional: false,
        }
    }

    pub fn text(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(name, pattern, FieldKind::Text)
    }

    pub fn integer(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(name, pattern, FieldKind::Integer)
    }

    pub fn date(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(name, pattern, FieldKind::Date)
    }

    /// Mark the field as one that is often absent.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// The pauta header fields, in extraction order.
pub fn default_field_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::text("Numero orden", r"Número orden (\d+)"),
        FieldRule::text("Tipo de Orden", r"([A-Z0-9])\nClase"),
        FieldRule::text("Clase", r"Clase (.+?) Asignado a"),
        FieldRule::text("Asignado a", r"Asignado a (.+?)\n"),
        FieldRule::text("Descripcion", r"Descripción (.+?) Tipo"),
        FieldRule::text("Tipo", r"Tipo (.+?) Estado"),
        FieldRule::text("Estado", r"Estado (.+?) Frec"),
        FieldRule::integer("Frec. Dias", r"Frec\. D[ií]as ([0-9]+)"),
        FieldRule::text("N Unidad", r"Nº Unidad (.+?) Parte"),
        FieldRule::text("Parte", r"Parte (.+?) F inicial"),
        FieldRule::date("F inicial", r"F inicial ([0-9/]+)"),
        FieldRule::text("Frec. Comb.", r"Frec\. Comb\. (.+?)").optional(),
        FieldRule::text("Especialidad", r"Especialidad (.+?) Elemento"),
        FieldRule::text("Elemento", r"Elemento (.+?) FF\.\.RReeaall"),
        FieldRule::text(
            "F. Real de Ejecucion",
            r"FF\.\.RReeaall EEjjeeccuucciioonn (.+?) Frec\. Km",
        )
        .optional(),
        FieldRule::text("Frec. Km", r"Frec\. Km ([^ ]*)"),
        FieldRule::text("Modo", r"Modo ([^ ]*?)(?:\s+(?:Fecha Fin|Frec\. Horas))"),
        FieldRule::date("Fecha Fin", r"Fecha Fin ([0-9/]+)").optional(),
        FieldRule::text("Frec. Horas", r"Frec\. Horas ([^ ]*)").optional(),
        FieldRule::text(
            "Originador",
            r"Originador ([A-Z]+ [A-ZÁÉÍÓÚÑa-z\s]+)\nIncidencia",
        ),
        FieldRule::text("Incidencia", r"Incidencia (.+?) Fecha Venc\.").optional(),
        FieldRule::date("Fecha Venc.", r"Fecha Venc\. ([0-9/]+)"),
        FieldRule::date("Ultima Realiz.", r"Ultima Realiz\. ([0-9/]+)"),
        FieldRule::text("Linea", r"Linea (.+?) Kit de Tareas"),
        FieldRule::text("Kit de Tareas", r"Kit de Tareas ([0-9]+)"),
        FieldRule::date("Proximo Venc.", r"Proximo Venc\. ([0-9/]+)"),
        FieldRule::date("Fecha Prox Emision", r"Fecha Prox Emisión ([0-9/]+)"),
        FieldRule::text("N de Serie", r"Nº de Serie (.+?) Planta"),
        FieldRule::text("Planta", r"Planta (.+?) Tipo servici"),
        FieldRule::text("Tipo servici", r"Tipo servici ([A-Z0-9]+ [A-ZÁÉÍÓÚÑa-z\.]+)"),
        FieldRule::text("Prioridad", r"Prioridad: ([A-Z\-a-z]+)"),
        FieldRule::text("Seg. y Medio Ambiente", r"Seg\. y Medio Ambiente ([A-Z0-9]+)"),
        FieldRule::text("Calidad", r"Calidad ([A-Z0-9]+)"),
        FieldRule::text("Operacion", r"Operación ([A-Z0-9]+)"),
        FieldRule::text("Mantenimiento", r"Mantenimiento ([A-Z0-9]+)"),
        FieldRule::text("Categorizacion", r"Categorización ([A-Z0-9]+)"),
        FieldRule::text("Tipo de Servicio", r"Tipo de Servicio (.+?)\n"),
    ]
}

/// A coerced field value. Serialises as a bare JSON string, number, or
/// ISO-8601 date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// Parse `dd/mm/yyyy` or `dd/mm/yy`.
///
/// The year's digit count picks the format: chrono's `%Y` would happily read
/// `"24"` as the year 24. Two-digit years pivot at 69 (00–68 → 20xx,
/// 69–99 → 19xx); chrono's own `%y` pivots at 70, so the century is
/// resolved here.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let (day_month, year) = raw.rsplit_once('/')?;
    match year.len() {
        4 => NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok(),
        2 if year.bytes().all(|b| b.is_ascii_digit()) => {
            let yy: i32 = year.parse().ok()?;
            let full = if yy < 69 { 2000 + yy } else { 1900 + yy };
            NaiveDate::parse_from_str(&format!("{day_month}/{full}"), "%d/%m/%Y").ok()
        }
        _ => None,
    }
}

fn coerce(kind: FieldKind, raw: &str) -> Option<FieldValue> {
    match kind {
        FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
        FieldKind::Integer => {
            if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            raw.parse().ok().map(FieldValue::Integer)
        }
        FieldKind::Date => {
            if raw.is_empty() {
                return None;
            }
            Some(
                parse_date(raw)
                    .map(FieldValue::Date)
                    .unwrap_or_else(|| FieldValue::Text(raw.to_string())),
            )
        }
    }
}

/// Values of one order, keyed by field name in table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub values: IndexMap<String, Option<FieldValue>>,
    /// Required fields that did not match.
    pub missing: Vec<String>,
}

impl ExtractedFields {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }
}

#[derive(Debug, Clone)]
struct CompiledField {
    rule: FieldRule,
    regex: Regex,
}

/// The field table with every pattern compiled.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    fields: Vec<CompiledField>,
}

impl FieldExtractor {
    pub fn new(rules: &[FieldRule]) -> Result<Self, PautaError> {
        let fields = rules
            .iter()
            .map(|rule| {
                let regex =
                    Regex::new(&rule.pattern).map_err(|source| PautaError::InvalidPattern {
                        field: rule.name.clone(),
                        source,
                    })?;
                if regex.captures_len() < 2 {
                    return Err(PautaError::InvalidConfig(format!(
                        "Pattern for field '{}' has no capture group",
                        rule.name
                    )));
                }
                Ok(CompiledField {
                    rule: rule.clone(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>, PautaError>>()?;
        Ok(Self { fields })
    }

    /// Apply every rule to an order's text.
    pub fn extract(&self, text: &str) -> ExtractedFields {
        let mut out = ExtractedFields::default();
        for field in &self.fields {
            let raw = field
                .regex
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim());
            let value = raw.and_then(|r| coerce(field.rule.kind, r));
            if raw.is_none() && !field.rule.optional {
                out.missing.push(field.rule.name.clone());
            }
            out.values.insert(field.rule.name.clone(), value);
        }
        out
    }
}

/// 1 = electrical plant, 2 = mechanical plant, 0 = anything else.
pub fn specialty_id(specialty: Option<&str>) -> u8 {
    let upper = specialty.unwrap_or_default().to_uppercase();
    if upper.contains("ELP ELECTRICO DE PLANTA") {
        1
    } else if upper.contains("MEP MECANICO DE PLANTA") {
        2
    } else {
        0
    }
}

/// 1 for systematic (`SYS`), 2 for `CCL`, 3 otherwise or when missing.
pub fn priority(service_type: Option<&str>) -> u8 {
    match service_type {
        Some(s) if s.contains("SYS") => 1,
        Some(s) if s.contains("CCL") => 2,
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FieldExtractor {
        FieldExtractor::new(&default_field_rules()).unwrap()
    }

    #[test]
    fn two_and_four_digit_years_agree() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5);
        assert_eq!(parse_date("05/03/24"), expected);
        assert_eq!(parse_date("05/03/2024"), expected);
    }

    #[test]
    fn two_digit_year_pivot() {
        assert_eq!(parse_date("01/01/00"), NaiveDate::from_ymd_opt(2000, 1, 1));
        assert_eq!(parse_date("01/01/68"), NaiveDate::from_ymd_opt(2068, 1, 1));
        assert_eq!(parse_date("01/01/69"), NaiveDate::from_ymd_opt(1969, 1, 1));
        assert_eq!(parse_date("31/12/99"), NaiveDate::from_ymd_opt(1999, 12, 31));
    }

    #[test]
    fn two_digit_year_must_be_digits() {
        assert_eq!(parse_date("01/01/6x"), None);
        assert_eq!(parse_date("29/02/69"), None);
        assert_eq!(parse_date("29/02/68"), NaiveDate::from_ymd_opt(2068, 2, 29));
    }

    #[test]
    fn bad_dates_are_kept_raw() {
        assert_eq!(parse_date("31/02/2024"), None);
        assert_eq!(parse_date("05/03/202"), None);
        assert_eq!(
            coerce(FieldKind::Date, "2024/"),
            Some(FieldValue::Text("2024/".into()))
        );
    }

    #[test]
    fn integer_coercion_rejects_non_digits() {
        assert_eq!(coerce(FieldKind::Integer, "30"), Some(FieldValue::Integer(30)));
        assert_eq!(coerce(FieldKind::Integer, "3O"), None);
        assert_eq!(coerce(FieldKind::Integer, ""), None);
    }

    #[test]
    fn first_match_wins_and_is_trimmed() {
        let e = FieldExtractor::new(&[FieldRule::text("Clase", r"Clase (.+?) Asignado a")]).unwrap();
        let out = e.extract("Clase  PREV  Asignado a X\nClase OTRA Asignado a Y");
        assert_eq!(out.text("Clase"), Some("PREV"));
    }

    #[test]
    fn miss_is_null_and_other_fields_still_populate() {
        let out = extractor().extract("Número orden 4512\nKit de Tareas 77\n");
        assert_eq!(out.text("Numero orden"), Some("4512"));
        assert_eq!(out.text("Kit de Tareas"), Some("77"));
        assert_eq!(out.values.get("Clase"), Some(&None));
        assert!(out.missing.contains(&"Clase".to_string()));
    }

    #[test]
    fn optional_misses_are_not_reported() {
        let out = extractor().extract("Número orden 1\n");
        assert_eq!(out.values.get("Fecha Fin"), Some(&None));
        assert!(!out.missing.contains(&"Fecha Fin".to_string()));
        assert!(!out.missing.contains(&"Numero orden".to_string()));
    }

    #[test]
    fn values_follow_table_order() {
        let out = extractor().extract("");
        let names: Vec<_> = out.values.keys().cloned().collect();
        let expected: Vec<_> = default_field_rules().into_iter().map(|r| r.name).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn date_and_integer_fields_are_coerced() {
        let out = extractor().extract("Frec. Días 30 Nº Unidad U Parte P F inicial 05/03/24 x");
        assert_eq!(out.get("Frec. Dias"), Some(&FieldValue::Integer(30)));
        assert_eq!(
            out.get("F inicial").and_then(FieldValue::as_date),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
    }

    #[test]
    fn order_type_is_the_character_before_clase() {
        let out = extractor().extract("Tipo de Orden P\nClase PREV Asignado a X\n");
        assert_eq!(out.text("Tipo de Orden"), Some("P"));
    }

    #[test]
    fn invalid_pattern_names_the_field() {
        let err = FieldExtractor::new(&[FieldRule::text("Roto", "(")]).unwrap_err();
        assert!(matches!(err, PautaError::InvalidPattern { ref field, .. } if field == "Roto"));
    }

    #[test]
    fn pattern_without_group_is_rejected() {
        let err = FieldExtractor::new(&[FieldRule::text("Sin", "Clase")]).unwrap_err();
        assert!(matches!(err, PautaError::InvalidConfig(_)));
    }

    #[test]
    fn specialty_classification() {
        assert_eq!(specialty_id(Some("elp electrico de planta norte")), 1);
        assert_eq!(specialty_id(Some("MEP MECANICO DE PLANTA")), 2);
        assert_eq!(specialty_id(Some("OTRA")), 0);
        assert_eq!(specialty_id(None), 0);
    }

    #[test]
    fn priority_classification() {
        assert_eq!(priority(Some("SYS SISTEMATICO")), 1);
        assert_eq!(priority(Some("CCL CICLICO")), 2);
        assert_eq!(priority(Some("COR")), 3);
        assert_eq!(priority(None), 3);
    }

    #[test]
    fn field_values_serialise_bare() {
        let values = vec![
            FieldValue::Integer(30),
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()),
            FieldValue::Text("PREV".into()),
        ];
        assert_eq!(
            serde_json::to_string(&values).unwrap(),
            r#"[30,"2024-03-05","PREV"]"#
        );
    }
}
