//! Template-based section text (offline mode)
//!
//! Used only when no language model backend is configured. Templates quote
//! the actual metric values so the offline report is still specific to the
//! assessed record; sections are tagged `SectionSource::Template`.

use super::prompts::ReportInputs;
use crate::types::{metal_and_route, Indicator, Route, SectionKind};

/// "primary copper production from ore", or the material name when the
/// metal or route is not recognised
fn route_description(material: &str) -> String {
    match metal_and_route(material) {
        Some((metal, Route::Primary)) => format!("primary {} production from ore", metal.to_string().to_lowercase()),
        Some((metal, Route::Secondary)) => format!("secondary {} production from scrap", metal.to_string().to_lowercase()),
        None => material.to_lowercase(),
    }
}

/// Deterministic text for one section
pub fn template_section(kind: SectionKind, inputs: &ReportInputs) -> String {
    let material = &inputs.material;
    let stage = inputs.process_stage.to_lowercase();
    let technology = inputs.technology.to_lowercase();
    let circ = inputs.circularity_score;
    let recycled = inputs.indicator(Indicator::RecycledContent);
    let reuse = inputs.indicator(Indicator::ReusePotential);
    let recovery = inputs.indicator(Indicator::RecoveryRate);
    let efficiency = inputs.indicator(Indicator::ResourceEfficiency);
    let life = inputs.indicator(Indicator::ExtendedProductLife);

    match kind {
        SectionKind::ExecutiveSummary => format!(
            "This Life Cycle Assessment evaluates the environmental and circularity performance of {material}. \
             The analysis indicates a Circularity Score of {circ:.1}, supported by {recycled:.1}% recycled content, \
             a reuse potential of {reuse:.1}%, and a recovery rate of {recovery:.1}%.\n\n\
             Recommendations:\n\
             1. Increase post-use collection and recovery efficiency.\n\
             2. Integrate more secondary materials in production.\n\
             3. Implement design-for-reuse and modular strategies."
        ),
        SectionKind::CircularityAnalysis => format!(
            "Material Flow:\nApproximately {recycled:.1}% of {material} inputs come from recycled sources, \
             reducing reliance on virgin extraction. The reuse potential of {reuse:.1}% helps extend product \
             lifecycles, while {recovery:.1}% of material is recovered at end-of-life.\n\n\
             Circular Economy Indicators:\nThe Circularity Score of {circ:.1} and a resource efficiency of \
             {efficiency:.1}% indicate how much material is retained across recycling, reuse and recovery. \
             Expected product life is {life:.1} years.\n\n\
             Opportunities for Improvement:\n\
             - Increase use of recycled feedstock and expand take-back systems.\n\
             - Improve recovery through better sorting and reprocessing.\n\
             - Design products for disassembly and reuse."
        ),
        SectionKind::EmissionInterpretation => {
            let e = &inputs.emissions;
            format!(
                "The {stage} stage for {} emits {:.2} kg CO2 directly and {:.2} kg CO2-eq of greenhouse gases in total. \
                 Air pollutants amount to {:.2} kg SOx, {:.2} kg NOx and {:.2} kg particulate matter, typically from \
                 energy or fuel combustion. Water emissions of {:.2} kg acid mine drainage, {:.2} kg heavy metals \
                 and {:.2} kg BOD indicate the wastewater burden.",
                material.to_lowercase(),
                e.co2,
                e.ghg,
                e.sox,
                e.nox,
                e.pm,
                e.amd,
                e.heavy_metals,
                e.bod
            )
        }
        SectionKind::EnergyEfficiency => format!(
            "The {technology} technology used in the {stage} stage consumes approximately {:.1} MJ of energy. \
             Energy efficiency improvements, such as heat recovery or renewable electricity sourcing, could reduce the footprint.",
            inputs.energy_input
        ),
        SectionKind::BenchmarkAnalysis => format!(
            "With a circularity score of {circ:.1}, {} performs moderately compared to industry averages. \
             Recycled content ({recycled:.1}%) and recovery rate ({recovery:.1}%) suggest partial circular adoption.",
            route_description(material)
        ),
        SectionKind::ActionRecommendations => format!(
            "To enhance sustainability of {} in the {stage} stage, consider:\n\
             - Upgrading {technology} processes to lower GHG emissions ({:.1} kg CO2-eq)\n\
             - Boosting recycled content (currently {recycled:.1}%) to cut material intensity\n\
             - Improving reuse potential and recovery beyond {reuse:.1}% and {recovery:.1}%\n\
             - Targeting energy efficiency gains from the current {:.1} MJ per functional unit",
            material.to_lowercase(),
            inputs.emissions.ghg,
            inputs.energy_input
        ),
    }
}
