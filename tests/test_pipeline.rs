use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

use bom::bom::columns::{ColumnSpec,ColumnsConfig};
use bom::bom::generate::{BomGenerator,BomRequest,BomRow};
use bom::bom::hub::Repository;
use bom::bom::options::Options;
use bom::run_with_generator;

fn row(pairs : &[(&str, &str)]) -> BomRow {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn options(repository : &str) -> Options {
    Options {
        repository : repository.to_string(),
        source_file : "Archimajor.PrjPcb".to_string(),
        columns : PathBuf::from("columns.yml"),
        source_ref : "main".to_string(),
        allspice_hub_url : None,
        output_file : None,
        group_by : None,
        variant : None,
        log_level : log::LevelFilter::Info
    }
}

fn columns_config(names : &[&str]) -> ColumnsConfig {
    ColumnsConfig {
        columns : names.iter().map(|name| ColumnSpec {
            name : name.to_string(),
            part_attributes : vec![name.to_uppercase()],
            sort : None,
            remove_rows_matching : None,
            grouped_values_sort : None,
            grouped_values_separator : None,
            grouped_values_allow_duplicates : None
        }).collect(),
        design_reuse_repos : Vec::new()
    }
}

fn repository(full_name : &str) -> Repository {
    Repository {
        id : 42,
        full_name : full_name.to_string(),
        default_branch : "main".to_string()
    }
}

/// What a `RecordingGenerator` saw in its one `generate` call.
struct SeenRequest {
    repository : String,
    source_file : String,
    group_by : Option<Vec<String>>,
    source_ref : String,
    variant : Option<String>,
    design_reuse : Vec<String>
}

/// Substitute generation capability: records the request and returns a
/// canned row sequence.
struct RecordingGenerator {
    rows : Vec<BomRow>,
    seen : RefCell<Option<SeenRequest>>
}

impl RecordingGenerator {
    fn new(rows : Vec<BomRow>) -> RecordingGenerator {
        RecordingGenerator { rows, seen : RefCell::new(None) }
    }
}

impl BomGenerator for RecordingGenerator {
    fn generate(&self, request : &BomRequest) -> anyhow::Result<Vec<BomRow>> {
        *self.seen.borrow_mut() = Some(SeenRequest {
            repository : request.repository.full_name.clone(),
            source_file : request.source_file.to_string(),
            group_by : request.group_by.map(|g| g.to_vec()),
            source_ref : request.source_ref.to_string(),
            variant : request.variant.map(String::from),
            design_reuse : request.design_reuse_repos.iter()
                .map(|r| r.full_name.clone())
                .collect()
        });
        Ok(self.rows.clone())
    }
}

/// A generator that always fails, standing in for an unreadable source
/// file or an unsupported format.
struct FailingGenerator;

impl BomGenerator for FailingGenerator {
    fn generate(&self, _request : &BomRequest) -> anyhow::Result<Vec<BomRow>> {
        anyhow::bail!("unsupported source file format")
    }
}

#[test]
fn test_rows_are_written_in_generator_order() -> anyhow::Result<()> {
    // Rows shaped exactly as the generation endpoint returns them
    let rows : Vec<BomRow> = serde_json::from_str(
        r#"[{"Part":"R1","Value":"10k"},{"Part":"R2","Value":"1k"}]"#
    )?;
    let generator = RecordingGenerator::new(rows);
    let dir = tempdir()?;
    let out_path = dir.path().join("out.csv");
    let mut opt = options("acme/widget");
    opt.output_file = Some(out_path.clone());

    let ec = run_with_generator(
        &opt,
        &columns_config(&["Part", "Value"]),
        &repository("acme/widget"),
        &[],
        &generator
    )?;

    assert_eq!(ec, 0);
    assert_eq!(fs::read_to_string(&out_path)?, "Part,Value\nR1,10k\nR2,1k\n");
    Ok(())
}

#[test]
fn test_group_by_flag_is_split_in_order() -> anyhow::Result<()> {
    let generator = RecordingGenerator::new(vec![row(&[("Part", "R1")])]);
    let dir = tempdir()?;
    let mut opt = options("acme/widget");
    opt.output_file = Some(dir.path().join("out.csv"));
    opt.group_by = Some("Part,Value".to_string());

    run_with_generator(
        &opt,
        &columns_config(&["Part", "Value"]),
        &repository("acme/widget"),
        &[],
        &generator
    )?;

    let seen = generator.seen.borrow();
    let seen = seen.as_ref().unwrap();
    assert_eq!(seen.group_by.as_deref(), Some(&["Part".to_string(), "Value".to_string()][..]));
    Ok(())
}

#[test]
fn test_request_carries_ref_variant_and_reuse_repos() -> anyhow::Result<()> {
    let generator = RecordingGenerator::new(vec![row(&[("Part", "R1")])]);
    let dir = tempdir()?;
    let mut opt = options("acme/widget");
    opt.output_file = Some(dir.path().join("out.csv"));
    opt.source_ref = "v1.0".to_string();
    opt.variant = Some("no-fit".to_string());

    let reuse = vec![repository("acme/common-parts"), repository("acme/passives")];
    run_with_generator(
        &opt,
        &columns_config(&["Part"]),
        &repository("acme/widget"),
        &reuse,
        &generator
    )?;

    let seen = generator.seen.borrow();
    let seen = seen.as_ref().unwrap();
    assert_eq!(seen.repository, "acme/widget");
    assert_eq!(seen.source_file, "Archimajor.PrjPcb");
    assert_eq!(seen.source_ref, "v1.0");
    assert_eq!(seen.variant.as_deref(), Some("no-fit"));
    assert_eq!(seen.group_by, None);
    assert_eq!(seen.design_reuse, vec!["acme/common-parts", "acme/passives"]);
    Ok(())
}

#[test]
fn test_empty_row_sequence_writes_configured_header() -> anyhow::Result<()> {
    let generator = RecordingGenerator::new(Vec::new());
    let dir = tempdir()?;
    let out_path = dir.path().join("out.csv");
    let mut opt = options("acme/widget");
    opt.output_file = Some(out_path.clone());

    let ec = run_with_generator(
        &opt,
        &columns_config(&["Part", "Value", "Designator"]),
        &repository("acme/widget"),
        &[],
        &generator
    )?;

    assert_eq!(ec, 0);
    assert_eq!(fs::read_to_string(&out_path)?, "Part,Value,Designator\n");
    Ok(())
}

#[test]
fn test_generator_failure_propagates_and_writes_nothing() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let out_path = dir.path().join("out.csv");
    let mut opt = options("acme/widget");
    opt.output_file = Some(out_path.clone());

    let result = run_with_generator(
        &opt,
        &columns_config(&["Part"]),
        &repository("acme/widget"),
        &[],
        &FailingGenerator
    );

    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("unsupported source file format"));
    assert!(!out_path.exists());
    Ok(())
}
