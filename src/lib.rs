pub mod bom;

use log::info;

use crate::bom::columns::{load_columns,ColumnsConfig};
use crate::bom::export::export_rows;
use crate::bom::generate::{BomGenerator,BomRequest,HubBomGenerator};
use crate::bom::hub::{auth_token_from_env,HubClient,RepoName,Repository};
use crate::bom::options::Options;

/// The command-line entry point: run the whole pipeline and return the
/// process exit code.
///
/// The run is linear -- load config, authenticate, resolve repositories,
/// generate, write -- and any failure at any stage is terminal.  The column
/// configuration is validated before the credential check, and the
/// credential check happens before any network traffic.
pub fn run_bom(opt : Options) -> anyhow::Result<i32> {
    let columns = load_columns(&opt.columns)?;
    let token = auth_token_from_env()?;
    let client = HubClient::new(&token, opt.allspice_hub_url.as_deref())?;

    let repo_name = opt.repository.parse::<RepoName>()?;
    let repository = client.get_repository(&repo_name)?;

    // Design-reuse repositories are resolved in the order the columns file
    // lists them, before generation starts.
    let mut design_reuse = Vec::with_capacity(columns.design_reuse_repos.len());
    for repo in &columns.design_reuse_repos {
        design_reuse.push(client.get_repository(repo)?);
    }

    let generator = HubBomGenerator::new(&client);
    run_with_generator(&opt, &columns, &repository, &design_reuse, &generator)
}

/// The tail of the pipeline, from pre-resolved inputs to the written CSV.
///
/// Separated from `run_bom` so the CLI layer can be exercised against a
/// substitute `BomGenerator` with no hub behind it.
pub fn run_with_generator(
    opt : &Options,
    columns : &ColumnsConfig,
    repository : &Repository,
    design_reuse : &[Repository],
    generator : &dyn BomGenerator
) -> anyhow::Result<i32> {
    let group_by = opt.group_by_columns();
    let request = BomRequest {
        repository,
        source_file : &opt.source_file,
        columns : &columns.columns,
        group_by : group_by.as_deref(),
        source_ref : &opt.source_ref,
        variant : opt.variant.as_deref(),
        design_reuse_repos : design_reuse
    };

    info!("Generating BOM for {}", repository.full_name);
    let rows = generator.generate(&request)?;

    let fallback_header = columns.column_names();
    export_rows(&rows, &fallback_header, opt.output_file.as_deref())?;
    info!("Generated BOM ({} rows)", rows.len());
    Ok(0)
}
