//! Common code for integration tests.
use assert_cmd::cargo_bin_cmd;
use std::fs;
use std::path::Path;

/// Path to the bundled demo model, relative to the crate root
#[allow(dead_code)]
pub const DEMO_MODEL_DIR: &str = "demos/steel";

/// Run the program with the given arguments and check that it succeeds
#[allow(dead_code)]
pub fn assert_steel_decarb_runs(args: &[&str]) {
    cargo_bin_cmd!("steel-decarb")
        .env("STEEL_DECARB_USE_DEFAULT_SETTINGS", "1")
        .env("STEEL_DECARB_LOG_LEVEL", "off")
        .args(args)
        .assert()
        .success();
}

/// Run the program with the given arguments and check that it fails
#[allow(dead_code)]
pub fn assert_steel_decarb_fails(args: &[&str]) {
    cargo_bin_cmd!("steel-decarb")
        .env("STEEL_DECARB_USE_DEFAULT_SETTINGS", "1")
        .env("STEEL_DECARB_LOG_LEVEL", "off")
        .args(args)
        .assert()
        .failure();
}

/// Run the program and return its standard output
#[allow(dead_code)]
pub fn get_steel_decarb_stdout(args: &[&str]) -> String {
    let output = cargo_bin_cmd!("steel-decarb")
        .env("STEEL_DECARB_USE_DEFAULT_SETTINGS", "1")
        .env("STEEL_DECARB_LOG_LEVEL", "off")
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success());

    String::from_utf8(output.stdout).unwrap()
}

/// A small two-route model over three years.
///
/// `dirty` is a cheap integrated route emitting 2 tCO2/t and `clean` is a more expensive one
/// emitting 0.2 tCO2/t. Neither has any initial capacity. Individual files can be replaced before
/// the model is written.
#[allow(dead_code)]
pub struct TestModel {
    pub model_toml: String,
    pub routes: String,
    pub route_intensities: String,
    pub commodity_prices: String,
    pub carbon_prices: String,
    pub demand: String,
    pub free_allocation: String,
}

impl Default for TestModel {
    fn default() -> Self {
        Self {
            model_toml: model_toml(2025, 2027, 0.0),
            routes: "\
id,description,kind,capital_cost,module_size,fixed_opex,initial_capacity,min_utilisation,max_utilisation,available_from,capture
dirty,Cheap and dirty,integrated,100,1.0,10,0.0,0.0,1.0,,false
clean,Expensive and clean,integrated,400,1.0,20,0.0,0.0,1.0,,false
"
            .into(),
            route_intensities: "\
route_id,iron_ore,coking_coal,scrap,natural_gas,electricity,hydrogen,fluxes,alloys_cost,emission_factor
dirty,1.5,0.7,0.0,0.0,0.0,0.0,0.0,0,2.0
clean,1.5,0.0,0.0,0.0,2.0,0.0,0.0,0,0.2
"
            .into(),
            commodity_prices: "\
commodity,case,years,price
iron_ore,,all,100
coking_coal,,all,200
electricity,,all,80
"
            .into(),
            carbon_prices: "\
scenario_id,years,price
low,all,10
medium,all,100
high,all,400
"
            .into(),
            demand: "year,demand\n2025,10\n2026,10\n2027,10\n".into(),
            free_allocation: "year,industry_cap\n2025,100\n".into(),
        }
    }
}

impl TestModel {
    /// Write all model files into `dir`
    #[allow(dead_code)]
    pub fn write(&self, dir: &Path) {
        for (file_name, contents) in [
            ("model.toml", &self.model_toml),
            ("routes.csv", &self.routes),
            ("route_intensities.csv", &self.route_intensities),
            ("commodity_prices.csv", &self.commodity_prices),
            ("carbon_prices.csv", &self.carbon_prices),
            ("demand.csv", &self.demand),
            ("free_allocation.csv", &self.free_allocation),
        ] {
            fs::write(dir.join(file_name), contents).unwrap();
        }
    }
}

/// Contents of a `model.toml` file with the given horizon and free allocation baseline
#[allow(dead_code)]
pub fn model_toml(start_year: u32, end_year: u32, free_allocation_baseline: f64) -> String {
    format!(
        "\
start_year = {start_year}
end_year = {end_year}
free_allocation_baseline = {free_allocation_baseline}

[carbon_budget]
national_baseline = 727.6
sector_share = 0.12
firm_share = 0.6
baseline_year = 2018
target_year = 2050

[carbon_budget.schedule]
shape = \"two_phase\"
milestone_year = 2030
milestone_reduction = 0.4
"
    )
}
