//! Report types: retrieved context, generated sections, and the final report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::indicators::{Indicator, IndicatorPredictions};
use super::schema::Field;

const REPORT_TEMPLATE: &str = r#"SUSTAINABILITY & CIRCULARITY ANALYSIS REPORT
============================================
Report Generated: {generated_at}
Methodology: Chained imputation + gradient-boosted prediction + retrieval-augmented generation
Material: {material}
Process Stage: {stage}
Technology: {technology}
Circularity Score: {circularity}

PREDICTED INDICATORS
{indicators}

{sections}{references}This report was generated automatically from model estimates and retrieved literature. Results should be validated by domain experts before being used for critical decisions.
"#;

/// A chunk returned by the retriever
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Position of the chunk in the index (stable across rebuilds)
    pub chunk_id: usize,
    /// Source document id (relative path)
    pub source: String,
    /// Character offset of the chunk in its source document
    pub start_index: usize,
    pub text: String,
    /// Cosine similarity to the query
    pub score: f64,
}

/// Report sections, in rendering order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    ExecutiveSummary,
    CircularityAnalysis,
    EmissionInterpretation,
    EnergyEfficiency,
    BenchmarkAnalysis,
    ActionRecommendations,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::ExecutiveSummary,
        SectionKind::CircularityAnalysis,
        SectionKind::EmissionInterpretation,
        SectionKind::EnergyEfficiency,
        SectionKind::BenchmarkAnalysis,
        SectionKind::ActionRecommendations,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::ExecutiveSummary => "Executive Summary",
            SectionKind::CircularityAnalysis => "Circularity Analysis",
            SectionKind::EmissionInterpretation => "Emission Interpretation",
            SectionKind::EnergyEfficiency => "Energy Efficiency Analysis",
            SectionKind::BenchmarkAnalysis => "Benchmark Analysis",
            SectionKind::ActionRecommendations => "Action Recommendations",
        }
    }
}

/// Where a section's text came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionSource {
    /// Language model output
    Llm { model: String },
    /// Deterministic offline template
    Template,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub kind: SectionKind,
    pub body: String,
    pub source: SectionSource,
}

/// Final assessment report. Derived and ephemeral; never persisted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub material: String,
    pub process_stage: String,
    pub technology: String,
    pub circularity_score: f64,
    pub indicators: IndicatorPredictions,
    /// Fields filled by the imputer rather than supplied
    pub imputed_fields: Vec<Field>,
    pub sections: Vec<ReportSection>,
    pub context: Vec<RetrievedChunk>,
}

impl Report {
    pub fn section(&self, kind: SectionKind) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Plain-text rendering for terminals and log attachments
    pub fn render_text(&self) -> String {
        // sections are substituted last: their text is model output
        REPORT_TEMPLATE
            .replace("{generated_at}", &self.generated_at.format("%Y-%m-%d %H:%M:%S").to_string())
            .replace("{material}", &self.material)
            .replace("{stage}", &self.process_stage)
            .replace("{technology}", &self.technology)
            .replace("{circularity}", &format!("{:.1}", self.circularity_score))
            .replace("{indicators}", &self.indicator_lines())
            .replace("{references}", &self.reference_lines())
            .replace("{sections}", &self.section_blocks())
    }

    fn indicator_lines(&self) -> String {
        let mut lines: Vec<String> = Indicator::ALL
            .iter()
            .filter_map(|indicator| {
                let p = self.indicators.get(*indicator)?;
                let drivers = p.top_features.iter().map(|f| f.field.key()).collect::<Vec<_>>().join(", ");
                Some(format!(
                    "  {:<32} {:>7.2} {:<5}  drivers: {drivers}",
                    indicator.name(),
                    p.value,
                    indicator.unit()
                ))
            })
            .collect();
        if !self.imputed_fields.is_empty() {
            let imputed = self.imputed_fields.iter().map(|f| f.key()).collect::<Vec<_>>().join(", ");
            lines.push(format!("  Estimated inputs: {imputed}"));
        }
        lines.join("\n")
    }

    fn section_blocks(&self) -> String {
        self.sections
            .iter()
            .map(|section| {
                let marker = if section.source == SectionSource::Template {
                    "[offline template]\n"
                } else {
                    ""
                };
                format!("{}\n{marker}{}\n\n", section.kind.title().to_uppercase(), section.body.trim())
            })
            .collect()
    }

    fn reference_lines(&self) -> String {
        if self.context.is_empty() {
            return String::new();
        }
        let lines = self
            .context
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                format!(
                    "  [{}] {} (offset {}, similarity {:.3})",
                    i + 1,
                    chunk.source,
                    chunk.start_index,
                    chunk.score
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("REFERENCES\n{lines}\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndicatorPrediction;

    fn report(sections: Vec<ReportSection>, context: Vec<RetrievedChunk>) -> Report {
        let mut indicators = IndicatorPredictions::new();
        indicators.insert(
            Indicator::RecoveryRate,
            IndicatorPrediction { value: 46.5, top_features: Vec::new() },
        );
        Report {
            generated_at: Utc::now(),
            material: "Aluminium Scrap".to_string(),
            process_stage: "Use".to_string(),
            technology: "Advanced".to_string(),
            circularity_score: 71.3,
            indicators,
            imputed_fields: vec![Field::TransportDistance],
            sections,
            context,
        }
    }

    #[test]
    fn test_render_fills_header_and_indicators() {
        let text = report(Vec::new(), Vec::new()).render_text();
        assert!(text.contains("Material: Aluminium Scrap"));
        assert!(text.contains("Circularity Score: 71.3"));
        assert!(text.contains("46.50"));
        assert!(text.contains("Estimated inputs: transport_distance"));
        assert!(!text.contains("REFERENCES"));
        assert!(!text.contains('{'));
    }

    #[test]
    fn test_section_text_is_not_treated_as_placeholder() {
        let section = ReportSection {
            kind: SectionKind::BenchmarkAnalysis,
            body: "Model output mentioning {references} literally.".to_string(),
            source: SectionSource::Llm { model: "m".to_string() },
        };
        let chunk = RetrievedChunk {
            chunk_id: 0,
            source: "al.md".to_string(),
            start_index: 7,
            text: "Scrap remelting.".to_string(),
            score: 0.5,
        };
        let text = report(vec![section], vec![chunk]).render_text();
        assert!(text.contains("BENCHMARK ANALYSIS\nModel output mentioning {references} literally."));
        assert!(text.contains("[1] al.md (offset 7, similarity 0.500)"));
        assert!(!text.contains("[offline template]"));
    }
}
