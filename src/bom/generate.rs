use indexmap::IndexMap;
use serde::Serialize;

use crate::bom::columns::ColumnSpec;
use crate::bom::hub::{HubClient,Repository};

/// One generated BOM row: output column name to rendered value.
///
/// The map preserves the generator's key order; the CSV header is derived
/// from the first row's keys, so that order is load-bearing.  Beyond the
/// key set the rows are opaque to this tool.
pub type BomRow = IndexMap<String, String>;

/// Everything the generation capability needs for a single run.
#[derive(Debug)]
pub struct BomRequest<'a> {
    pub repository : &'a Repository,
    /// Path of the project descriptor inside the repository.
    pub source_file : &'a str,
    pub columns : &'a [ColumnSpec],
    /// Ordered column names to group rows by; `None` produces a flat BOM.
    pub group_by : Option<&'a [String]>,
    /// Branch name, tag name, or commit SHA to generate from.
    pub source_ref : &'a str,
    pub variant : Option<&'a str>,
    /// Already-resolved design-reuse repositories, in configuration order.
    pub design_reuse_repos : &'a [Repository]
}

/// The external BOM generation capability.
///
/// Everything genuinely hard about BOM generation (parsing the EDA project
/// formats, walking component hierarchies, resolving variants, grouping
/// and sorting rows) lives behind this boundary.  The rows come back fully
/// rendered and ordered; errors are propagated to the caller unrecovered.
pub trait BomGenerator {
    fn generate(&self, request : &BomRequest) -> anyhow::Result<Vec<BomRow>>;
}

/// Production generator: delegates to the BOM generation endpoint of the
/// hub instance behind the authenticated client.
pub struct HubBomGenerator<'a> {
    client : &'a HubClient
}

impl<'a> HubBomGenerator<'a> {
    pub fn new(client : &'a HubClient) -> HubBomGenerator<'a> {
        HubBomGenerator { client }
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    source_file : &'a str,
    #[serde(rename="ref")]
    source_ref : &'a str,
    #[serde(skip_serializing_if="Option::is_none")]
    variant : Option<&'a str>,
    #[serde(skip_serializing_if="Option::is_none")]
    group_by : Option<&'a [String]>,
    columns : &'a [ColumnSpec],
    #[serde(skip_serializing_if="Vec::is_empty")]
    design_reuse_repos : Vec<&'a str>
}

impl BomGenerator for HubBomGenerator<'_> {
    fn generate(&self, request : &BomRequest) -> anyhow::Result<Vec<BomRow>> {
        let path = format!("/api/v1/repos/{}/allspice_bom", request.repository.full_name);
        let body = GenerateBody {
            source_file : request.source_file,
            source_ref : request.source_ref,
            variant : request.variant,
            group_by : request.group_by,
            columns : request.columns,
            design_reuse_repos : request.design_reuse_repos.iter()
                .map(|r| r.full_name.as_str())
                .collect()
        };
        let rows = self.client.post_json::<_, Vec<BomRow>>(&path, &body)?;
        Ok(rows)
    }
}
