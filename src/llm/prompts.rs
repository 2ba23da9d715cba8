//! Prompt assembly
//!
//! Prompts are pure functions of the report inputs and the retrieved
//! context: the same inputs always produce byte-identical prompts. Numbers
//! are printed with fixed precision and context chunks are numbered in
//! retrieval order.

use crate::error::{LcaError, Result};
use crate::types::{
    Field, Indicator, IndicatorPredictions, ProcessRecord, RetrievedChunk, SectionKind,
};

/// System prompt sent with every section request
pub const SYSTEM_PROMPT: &str = "You are a sustainability and circular-economy expert. \
Respond in clear, professional report language without markdown or emojis.";

/// Emission quantities quoted in the report
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionFigures {
    pub co2: f64,
    pub sox: f64,
    pub nox: f64,
    pub pm: f64,
    pub amd: f64,
    pub heavy_metals: f64,
    pub bod: f64,
    pub ghg: f64,
}

/// Everything a section prompt or template needs
#[derive(Debug, Clone, PartialEq)]
pub struct ReportInputs {
    /// Raw material type, e.g. "Copper Ore"
    pub material: String,
    pub process_stage: String,
    pub technology: String,
    pub circularity_score: f64,
    pub energy_input: f64,
    pub emissions: EmissionFigures,
    pub indicators: IndicatorPredictions,
    /// Fields the imputer estimated
    pub imputed: Vec<Field>,
}

fn required_text(record: &ProcessRecord, field: Field) -> Result<String> {
    record
        .text(field)
        .ok_or_else(|| LcaError::schema(field.key(), "missing from completed record"))
}

fn required_number(record: &ProcessRecord, field: Field) -> Result<f64> {
    record
        .number(field)
        .ok_or_else(|| LcaError::schema(field.key(), "missing from completed record"))
}

impl ReportInputs {
    /// Collect inputs from a decoded, completed record
    pub fn from_record(
        record: &ProcessRecord,
        indicators: IndicatorPredictions,
        imputed: Vec<Field>,
    ) -> Result<Self> {
        Ok(Self {
            material: required_text(record, Field::RawMaterialType)?,
            process_stage: required_text(record, Field::ProcessStage)?,
            technology: required_text(record, Field::Technology)?,
            circularity_score: required_number(record, Field::CircularityScore)?,
            energy_input: required_number(record, Field::EnergyInputQuantity)?,
            emissions: EmissionFigures {
                co2: required_number(record, Field::EmissionsAirCo2)?,
                sox: required_number(record, Field::EmissionsAirSox)?,
                nox: required_number(record, Field::EmissionsAirNox)?,
                pm: required_number(record, Field::EmissionsAirPm)?,
                amd: required_number(record, Field::EmissionsWaterAmd)?,
                heavy_metals: required_number(record, Field::EmissionsWaterHeavyMetals)?,
                bod: required_number(record, Field::EmissionsWaterBod)?,
                ghg: required_number(record, Field::GhgEmissions)?,
            },
            indicators,
            imputed,
        })
    }

    pub fn indicator(&self, indicator: Indicator) -> f64 {
        self.indicators.value(indicator)
    }

    /// Query used to retrieve reference context for this record
    pub fn retrieval_query(&self) -> String {
        format!(
            "{} {} stage {} technology circularity recycled content recovery rate reuse potential. {}",
            self.material,
            self.process_stage,
            self.technology,
            self.indicators.summary()
        )
    }
}

const CIRCULARITY_BLOCK: &str = "Material: {material}
Circularity Score: {circularity}
Recycled Content: {recycled}%
Reuse Potential: {reuse}%
Recovery Rate: {recovery}%
Resource Efficiency: {efficiency}%
Extended Product Life: {life} years";

const EXECUTIVE_SUMMARY_PROMPT: &str = r#"You are an expert sustainability analyst preparing the Executive Summary section of a Life Cycle Assessment (LCA) report.

Context:
{circularity_block}

Task:
1. Summarize the overall environmental and circularity performance of the material.
2. Include an introduction, key metrics, an assessment, and 3 to 4 actionable recommendations.
3. Write in a professional, concise, and factual style suitable for executive-level reports.
4. Keep it under 250 words.
5. Use plain English text only. Do not include emojis, arrows, bullets, or special symbols."#;

const CIRCULARITY_ANALYSIS_PROMPT: &str = r#"You are a circular economy expert preparing the Circularity Analysis section of an LCA report.

Context:
{circularity_block}

Task:
1. Write three structured parts: Material Flow, Circular Economy Indicators, Opportunities for Improvement.
2. Discuss how recycled inputs, reuse, and recovery affect resource efficiency.
3. Keep the writing clear, factual, and action-oriented (approximately 300 to 400 words).
4. Use plain text only."#;

const EMISSION_INTERPRETATION_PROMPT: &str = r#"You are an environmental analyst. Based on the following data, provide an insightful emission interpretation.

Material: {material}
Process Stage: {stage}
CO2: {co2} kg
SOx: {sox} kg
NOx: {nox} kg
Particulate Matter: {pm} kg
Water AMD: {amd} kg
Water Heavy Metals: {heavy_metals} kg
Water BOD: {bod} kg
Total GHG Emissions: {ghg_precise} kg CO2-eq

Task:
Write two concise paragraphs explaining the significance of these emissions and potential mitigation opportunities."#;

const ENERGY_EFFICIENCY_PROMPT: &str = r#"Analyze the energy efficiency of the following manufacturing configuration:

Material: {material}
Stage: {stage}
Technology: {technology}
Energy Input: {energy} MJ

Task:
Discuss efficiency, potential energy savings, and circular implications in a technical, professional tone."#;

const BENCHMARK_ANALYSIS_PROMPT: &str = r#"Compare the following circularity metrics to typical benchmarks for similar materials.

{circularity_block}

Task:
Summarize how this material performs relative to standard benchmarks and identify improvement areas.
Maintain a neutral, factual tone."#;

const ACTION_RECOMMENDATIONS_PROMPT: &str = r#"You are a circular economy consultant. Based on the data below, provide actionable recommendations.

Stage: {stage}
Technology: {technology}
{circularity_block}
GHG Emissions: {ghg} kg CO2-eq
Energy Input: {energy} MJ

Task:
List three to four prioritized strategies for improvement that are specific, measurable, and actionable."#;

const IMPUTED_NOTE: &str =
    "\n\nNote: the following inputs were estimated by the model rather than measured: {fields}.";

const CONTEXT_INSTRUCTION: &str =
    "\n\nGround your answer in the reference context where relevant and cite it by number.";

/// Layout shared by every section prompt; `{context}` is filled last
const PROMPT_LAYOUT: &str = "{body}{imputed_note}

Reference context:
{context}

Use plain ASCII text only, without emojis, arrows, or special symbols.";

fn section_template(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::ExecutiveSummary => EXECUTIVE_SUMMARY_PROMPT,
        SectionKind::CircularityAnalysis => CIRCULARITY_ANALYSIS_PROMPT,
        SectionKind::EmissionInterpretation => EMISSION_INTERPRETATION_PROMPT,
        SectionKind::EnergyEfficiency => ENERGY_EFFICIENCY_PROMPT,
        SectionKind::BenchmarkAnalysis => BENCHMARK_ANALYSIS_PROMPT,
        SectionKind::ActionRecommendations => ACTION_RECOMMENDATIONS_PROMPT,
    }
}

fn section_body(kind: SectionKind, inputs: &ReportInputs) -> String {
    let e = &inputs.emissions;
    section_template(kind)
        .replace("{circularity_block}", CIRCULARITY_BLOCK)
        .replace("{material}", &inputs.material)
        .replace("{stage}", &inputs.process_stage)
        .replace("{technology}", &inputs.technology)
        .replace("{circularity}", &format!("{:.1}", inputs.circularity_score))
        .replace("{recycled}", &format!("{:.1}", inputs.indicator(Indicator::RecycledContent)))
        .replace("{reuse}", &format!("{:.1}", inputs.indicator(Indicator::ReusePotential)))
        .replace("{recovery}", &format!("{:.1}", inputs.indicator(Indicator::RecoveryRate)))
        .replace("{efficiency}", &format!("{:.1}", inputs.indicator(Indicator::ResourceEfficiency)))
        .replace("{life}", &format!("{:.1}", inputs.indicator(Indicator::ExtendedProductLife)))
        .replace("{energy}", &format!("{:.1}", inputs.energy_input))
        .replace("{co2}", &format!("{:.2}", e.co2))
        .replace("{sox}", &format!("{:.2}", e.sox))
        .replace("{nox}", &format!("{:.2}", e.nox))
        .replace("{pm}", &format!("{:.2}", e.pm))
        .replace("{amd}", &format!("{:.2}", e.amd))
        .replace("{heavy_metals}", &format!("{:.2}", e.heavy_metals))
        .replace("{bod}", &format!("{:.2}", e.bod))
        .replace("{ghg_precise}", &format!("{:.2}", e.ghg))
        .replace("{ghg}", &format!("{:.1}", e.ghg))
}

fn imputed_note(imputed: &[Field]) -> String {
    if imputed.is_empty() {
        return String::new();
    }
    let fields = imputed.iter().map(|f| f.label()).collect::<Vec<_>>().join(", ");
    IMPUTED_NOTE.replace("{fields}", &fields)
}

fn context_block(context: &[RetrievedChunk]) -> String {
    if context.is_empty() {
        return "None available.".to_string();
    }
    let chunks = context
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[{}] {} (offset {})\n{}", i + 1, chunk.source, chunk.start_index, chunk.text.trim()))
        .collect::<Vec<_>>()
        .join("\n");
    chunks + CONTEXT_INSTRUCTION
}

/// Full user prompt for one section
pub fn build_prompt(kind: SectionKind, inputs: &ReportInputs, context: &[RetrievedChunk]) -> String {
    PROMPT_LAYOUT
        .replace("{body}", &section_body(kind, inputs))
        .replace("{imputed_note}", &imputed_note(&inputs.imputed))
        .replace("{context}", &context_block(context))
}
