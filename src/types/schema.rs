//! LCA process record schema
//!
//! The field list, categorical domains and roles are fixed for a schema
//! version. Encoding tables and trained models record a fingerprint of this
//! schema and refuse to load against a different one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema version tag, part of every artifact fingerprint
pub const SCHEMA_VERSION: &str = "alloyance-lca-v1";

/// Number of fields in a process record
pub const FIELD_COUNT: usize = 45;

/// Value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Closed text domain, encoded to integer codes
    Categorical(&'static [&'static str]),
    Numeric,
}

/// How a field takes part in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    /// Must be supplied by the caller, never imputed
    Required,
    /// May be missing, filled by the chained imputer
    Imputable,
    /// Computed from completed inputs
    Derived,
    /// Predicted circularity indicator
    Indicator,
}

/// Static description of one field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    /// snake_case key used in JSON input
    pub key: &'static str,
    /// Column label of the historical dataset
    pub label: &'static str,
    pub kind: FieldKind,
    pub role: FieldRole,
}

/// Every field of a process record, in schema order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ProcessStage,
    Technology,
    TimePeriod,
    Location,
    FunctionalUnit,
    RawMaterialType,
    RawMaterialQuantity,
    EnergyInputType,
    EnergyInputQuantity,
    ProcessingMethod,
    TransportMode,
    TransportDistance,
    FuelType,
    MetalQualityGrade,
    MaterialScarcityLevel,
    MaterialCost,
    ProcessingCost,
    EmissionsAirCo2,
    EmissionsAirSox,
    EmissionsAirNox,
    EmissionsAirPm,
    EmissionsWaterAmd,
    EmissionsWaterHeavyMetals,
    EmissionsWaterBod,
    GhgEmissions,
    Scope1Emissions,
    Scope2Emissions,
    Scope3Emissions,
    EndOfLifeTreatment,
    EnvironmentalImpactScore,
    MetalRecyclabilityFactor,
    CircularityScore,
    EnergyPerMaterial,
    TotalAirEmissions,
    TotalWaterEmissions,
    TransportIntensity,
    GhgPerMaterial,
    TimePeriodNumeric,
    TotalCost,
    CircularEconomyIndex,
    RecycledContent,
    ResourceEfficiency,
    ExtendedProductLife,
    RecoveryRate,
    ReusePotential,
}

const STAGES: &[&str] = &[
    "Raw Material Extraction",
    "Manufacturing",
    "Use",
    "Transport",
    "End-of-Life",
];
const TECHNOLOGIES: &[&str] = &["Conventional", "Advanced", "Emerging"];
const TIME_PERIODS: &[&str] = &["2010-2014", "2015-2019", "2020-2025"];
const LOCATIONS: &[&str] = &["North America", "Europe", "South America", "Asia"];
const FUNCTIONAL_UNITS: &[&str] = &[
    "1 kg Aluminium Sheet",
    "1 kg Copper Wire",
    "1 m2 Aluminium Panel",
];
const RAW_MATERIALS: &[&str] = &["Copper Ore", "Copper Scrap", "Aluminium Scrap", "Aluminium Ore"];
const ENERGY_TYPES: &[&str] = &["Electricity", "Coal", "Natural Gas"];
const TRANSPORT_MODES: &[&str] = &["Rail", "Ship", "Truck"];
const FUEL_TYPES: &[&str] = &["Diesel", "Electric", "Heavy Fuel Oil"];
const LEVELS: &[&str] = &["Low", "Medium", "High"];
const END_OF_LIFE: &[&str] = &["Recycling", "Landfill", "Incineration", "Reuse"];

use FieldKind::{Categorical, Numeric};
use FieldRole::{Derived, Imputable, Indicator, Required};

const fn spec(
    field: Field,
    key: &'static str,
    label: &'static str,
    kind: FieldKind,
    role: FieldRole,
) -> FieldSpec {
    FieldSpec { field, key, label, kind, role }
}

static FIELD_SPECS: [FieldSpec; FIELD_COUNT] = [
    spec(Field::ProcessStage, "process_stage", "Process Stage", Categorical(STAGES), Required),
    spec(Field::Technology, "technology", "Technology", Categorical(TECHNOLOGIES), Imputable),
    spec(Field::TimePeriod, "time_period", "Time Period", Categorical(TIME_PERIODS), Imputable),
    spec(Field::Location, "location", "Location", Categorical(LOCATIONS), Imputable),
    spec(Field::FunctionalUnit, "functional_unit", "Functional Unit", Categorical(FUNCTIONAL_UNITS), Required),
    spec(Field::RawMaterialType, "raw_material_type", "Raw Material Type", Categorical(RAW_MATERIALS), Required),
    spec(Field::RawMaterialQuantity, "raw_material_quantity", "Raw Material Quantity (kg or unit)", Numeric, Imputable),
    spec(Field::EnergyInputType, "energy_input_type", "Energy Input Type", Categorical(ENERGY_TYPES), Imputable),
    spec(Field::EnergyInputQuantity, "energy_input_quantity", "Energy Input Quantity (MJ)", Numeric, Imputable),
    spec(Field::ProcessingMethod, "processing_method", "Processing Method", Categorical(TECHNOLOGIES), Imputable),
    spec(Field::TransportMode, "transport_mode", "Transport Mode", Categorical(TRANSPORT_MODES), Imputable),
    spec(Field::TransportDistance, "transport_distance", "Transport Distance (km)", Numeric, Imputable),
    spec(Field::FuelType, "fuel_type", "Fuel Type", Categorical(FUEL_TYPES), Imputable),
    spec(Field::MetalQualityGrade, "metal_quality_grade", "Metal Quality Grade", Categorical(LEVELS), Imputable),
    spec(Field::MaterialScarcityLevel, "material_scarcity_level", "Material Scarcity Level", Categorical(LEVELS), Imputable),
    spec(Field::MaterialCost, "material_cost", "Material Cost (USD)", Numeric, Imputable),
    spec(Field::ProcessingCost, "processing_cost", "Processing Cost (USD)", Numeric, Imputable),
    spec(Field::EmissionsAirCo2, "emissions_air_co2", "Emissions to Air CO2 (kg)", Numeric, Imputable),
    spec(Field::EmissionsAirSox, "emissions_air_sox", "Emissions to Air SOx (kg)", Numeric, Imputable),
    spec(Field::EmissionsAirNox, "emissions_air_nox", "Emissions to Air NOx (kg)", Numeric, Imputable),
    spec(Field::EmissionsAirPm, "emissions_air_pm", "Emissions to Air Particulate Matter (kg)", Numeric, Imputable),
    spec(Field::EmissionsWaterAmd, "emissions_water_amd", "Emissions to Water Acid Mine Drainage (kg)", Numeric, Imputable),
    spec(Field::EmissionsWaterHeavyMetals, "emissions_water_heavy_metals", "Emissions to Water Heavy Metals (kg)", Numeric, Imputable),
    spec(Field::EmissionsWaterBod, "emissions_water_bod", "Emissions to Water BOD (kg)", Numeric, Imputable),
    spec(Field::GhgEmissions, "ghg_emissions", "Greenhouse Gas Emissions (kg CO2-eq)", Numeric, Imputable),
    spec(Field::Scope1Emissions, "scope1_emissions", "Scope 1 Emissions (kg CO2-eq)", Numeric, Imputable),
    spec(Field::Scope2Emissions, "scope2_emissions", "Scope 2 Emissions (kg CO2-eq)", Numeric, Imputable),
    spec(Field::Scope3Emissions, "scope3_emissions", "Scope 3 Emissions (kg CO2-eq)", Numeric, Imputable),
    spec(Field::EndOfLifeTreatment, "end_of_life_treatment", "End-of-Life Treatment", Categorical(END_OF_LIFE), Imputable),
    spec(Field::EnvironmentalImpactScore, "environmental_impact_score", "Environmental Impact Score", Numeric, Imputable),
    spec(Field::MetalRecyclabilityFactor, "metal_recyclability_factor", "Metal Recyclability Factor", Numeric, Imputable),
    spec(Field::CircularityScore, "circularity_score", "Circularity_Score", Numeric, Imputable),
    spec(Field::EnergyPerMaterial, "energy_per_material", "Energy_per_Material", Numeric, Derived),
    spec(Field::TotalAirEmissions, "total_air_emissions", "Total_Air_Emissions", Numeric, Derived),
    spec(Field::TotalWaterEmissions, "total_water_emissions", "Total_Water_Emissions", Numeric, Derived),
    spec(Field::TransportIntensity, "transport_intensity", "Transport_Intensity", Numeric, Derived),
    spec(Field::GhgPerMaterial, "ghg_per_material", "GHG_per_Material", Numeric, Derived),
    spec(Field::TimePeriodNumeric, "time_period_numeric", "Time_Period_Numeric", Numeric, Derived),
    spec(Field::TotalCost, "total_cost", "Total_Cost", Numeric, Derived),
    spec(Field::CircularEconomyIndex, "circular_economy_index", "Circular_Economy_Index", Numeric, Derived),
    spec(Field::RecycledContent, "recycled_content", "Recycled Content (%)", Numeric, Indicator),
    spec(Field::ResourceEfficiency, "resource_efficiency", "Resource Efficiency (%)", Numeric, Indicator),
    spec(Field::ExtendedProductLife, "extended_product_life", "Extended Product Life (years)", Numeric, Indicator),
    spec(Field::RecoveryRate, "recovery_rate", "Recovery Rate (%)", Numeric, Indicator),
    spec(Field::ReusePotential, "reuse_potential", "Reuse Potential (%)", Numeric, Indicator),
];

impl Field {
    /// All fields in schema order
    pub fn all() -> impl Iterator<Item = Field> {
        FIELD_SPECS.iter().map(|s| s.field)
    }

    /// Fields with the given role, in schema order
    pub fn with_role(role: FieldRole) -> impl Iterator<Item = Field> {
        FIELD_SPECS
            .iter()
            .filter(move |s| s.role == role)
            .map(|s| s.field)
    }

    /// Model input fields: everything except indicators
    pub fn features() -> impl Iterator<Item = Field> {
        FIELD_SPECS
            .iter()
            .filter(|s| s.role != FieldRole::Indicator)
            .map(|s| s.field)
    }

    pub fn spec(self) -> &'static FieldSpec {
        &FIELD_SPECS[self.index()]
    }

    /// Position in schema order (slot in an encoded record)
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn kind(self) -> FieldKind {
        self.spec().kind
    }

    pub fn role(self) -> FieldRole {
        self.spec().role
    }

    pub fn is_categorical(self) -> bool {
        matches!(self.kind(), FieldKind::Categorical(_))
    }

    /// Categorical domain, empty for numeric fields
    pub fn domain(self) -> &'static [&'static str] {
        match self.kind() {
            FieldKind::Categorical(domain) => domain,
            FieldKind::Numeric => &[],
        }
    }

    /// Resolve a snake_case key or a dataset column label
    pub fn from_key(key: &str) -> Option<Field> {
        let key = key.trim();
        FIELD_SPECS
            .iter()
            .find(|s| s.key == key || s.label == key)
            .map(|s| s.field)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Schema fingerprint: version, fields, roles and categorical domains
pub fn schema_fingerprint() -> String {
    let mut text = String::from(SCHEMA_VERSION);
    for spec in &FIELD_SPECS {
        text.push('|');
        text.push_str(spec.key);
        text.push(':');
        text.push_str(match spec.role {
            FieldRole::Required => "req",
            FieldRole::Imputable => "imp",
            FieldRole::Derived => "der",
            FieldRole::Indicator => "ind",
        });
        for class in spec.field.domain() {
            text.push(',');
            text.push_str(class);
        }
    }
    format!("{:x}", md5::compute(text.as_bytes()))
}

// ============================================================================
// Metal / route
// ============================================================================

/// Base metal of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metal {
    Copper,
    Aluminium,
}

/// Production route: ore-based or scrap-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Primary,
    Secondary,
}

impl fmt::Display for Metal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metal::Copper => write!(f, "Copper"),
            Metal::Aluminium => write!(f, "Aluminium"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Primary => write!(f, "Primary"),
            Route::Secondary => write!(f, "Secondary"),
        }
    }
}

/// Read metal and route from a raw material type ("Copper Ore" -> Copper, Primary)
pub fn metal_and_route(raw_material_type: &str) -> Option<(Metal, Route)> {
    let lower = raw_material_type.to_lowercase();
    let metal = if lower.contains("copper") {
        Metal::Copper
    } else if lower.contains("aluminium") || lower.contains("aluminum") {
        Metal::Aluminium
    } else {
        return None;
    };
    let route = if lower.contains("ore") {
        Route::Primary
    } else if lower.contains("scrap") {
        Route::Secondary
    } else {
        return None;
    };
    Some((metal, route))
}
